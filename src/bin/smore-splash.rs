#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

//! Borderless splash window. Started and killed by the launcher; closes itself
//! after `--auto-close-ms` in case the launcher never comes back for it.
//! Prints `ready` on stdout once the window and webview exist.

use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use clap::Parser;
use tao::{
    dpi::{LogicalSize, PhysicalPosition},
    event::{Event, StartCause, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

#[cfg(target_os = "linux")]
use tao::platform::unix::WindowExtUnix;

use wry::WebViewBuilder;

#[cfg(target_os = "linux")]
use wry::WebViewBuilderExtUnix;

#[derive(Parser, Debug)]
#[command(name = "smore-splash", about = "Smore startup splash")]
struct Args {
    /// Page to display (usually a file:// URL).
    url: String,
    /// Close the window after this many milliseconds (0 keeps it open).
    #[arg(long, default_value_t = 0)]
    auto_close_ms: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("Smore")
        .with_decorations(false)
        .with_resizable(false)
        .with_always_on_top(true)
        .with_inner_size(LogicalSize::new(480.0, 280.0))
        .build(&event_loop)
        .map_err(|e| anyhow!("create splash window: {e}"))?;

    if let Some(monitor) = window.current_monitor() {
        let screen = monitor.size();
        let size = window.outer_size();
        let x = (screen.width.saturating_sub(size.width) / 2) as i32;
        let y = (screen.height.saturating_sub(size.height) / 2) as i32;
        let origin = monitor.position();
        window.set_outer_position(PhysicalPosition::new(origin.x + x, origin.y + y));
    }

    let builder = WebViewBuilder::new().with_url(&args.url);

    #[cfg(not(target_os = "linux"))]
    let webview = builder.build(&window);

    // On Linux, the GTK build supports Wayland too.
    #[cfg(target_os = "linux")]
    let webview = builder.build_gtk(window.gtk_window());

    let webview = webview.map_err(|e| anyhow!("create splash webview: {e}"))?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "ready")?;
    stdout.flush()?;
    drop(stdout);

    let deadline = (args.auto_close_ms > 0)
        .then(|| Instant::now() + Duration::from_millis(args.auto_close_ms));

    event_loop.run(move |event, _, control_flow| {
        let _keep_alive = (&window, &webview);
        *control_flow = match deadline {
            Some(at) => ControlFlow::WaitUntil(at),
            None => ControlFlow::Wait,
        };

        match event {
            Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                *control_flow = ControlFlow::Exit
            }
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => *control_flow = ControlFlow::Exit,
            _ => {}
        }
    });
}
