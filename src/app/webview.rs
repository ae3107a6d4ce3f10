use std::panic;

use anyhow::{anyhow, Result};
use tao::{
    dpi::LogicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    platform::run_return::EventLoopExtRunReturn,
    window::{Window, WindowBuilder},
};
use wry::{WebView, WebViewBuilder};

#[cfg(target_os = "linux")]
use tao::platform::unix::WindowExtUnix;

#[cfg(target_os = "linux")]
use wry::WebViewBuilderExtUnix;

use crate::logsink::LogRecord;
use crate::models::Backend;

use super::{page, AppContext, LiveApplication, RunError, TITLE};

/// tao window hosting the system webview. Window and webview are created up
/// front, so a missing webview engine is a build error.
pub(crate) struct WebviewShell {
    event_loop: EventLoop<()>,
    window: Window,
    webview: WebView,
    context: AppContext,
}

impl WebviewShell {
    pub(crate) fn new(context: AppContext) -> Result<Self> {
        // tao panics instead of returning an error when the platform toolkit
        // (GTK on Linux) cannot be initialised.
        let event_loop = panic::catch_unwind(EventLoop::new)
            .map_err(|_| anyhow!("could not initialise the windowing system"))?;

        let window = WindowBuilder::new()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(1100.0, 720.0))
            .with_min_inner_size(LogicalSize::new(720.0, 420.0))
            .build(&event_loop)
            .map_err(|e| anyhow!("create window: {e}"))?;

        let builder = WebViewBuilder::new().with_html(page::loading());

        #[cfg(not(target_os = "linux"))]
        let webview = builder.build(&window);

        // On Linux, the GTK build supports Wayland too.
        #[cfg(target_os = "linux")]
        let webview = builder.build_gtk(window.gtk_window());

        let webview = webview.map_err(|e| anyhow!("create webview: {e}"))?;

        Ok(Self {
            event_loop,
            window,
            webview,
            context,
        })
    }
}

impl LiveApplication for WebviewShell {
    fn backend(&self) -> Backend {
        Backend::Webview
    }

    fn replay(&mut self, records: Vec<LogRecord>) {
        let html = page::render(&self.context, &records);
        if let Err(e) = self.webview.load_html(&html) {
            tracing::warn!("webview could not show the startup log: {e}");
        }
    }

    fn run_loop(self: Box<Self>) -> Result<(), RunError> {
        let WebviewShell {
            mut event_loop,
            window,
            webview,
            ..
        } = *self;

        let code = event_loop.run_return(move |event, _, control_flow| {
            let _keep_alive = (&window, &webview);
            *control_flow = ControlFlow::Wait;

            if let Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } = event
            {
                *control_flow = ControlFlow::Exit;
            }
        });

        if code == 0 {
            Ok(())
        } else {
            Err(RunError::Crashed {
                backend: Backend::Webview,
                error: anyhow!("event loop exited with code {code}"),
            })
        }
    }
}
