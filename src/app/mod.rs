//! The live application: one window on one GUI backend.

mod egui_shell;
mod page;
mod state;
mod webview;

use anyhow::Result;

use crate::logsink::LogRecord;
use crate::models::Backend;
use crate::preload::HardwareInfo;

pub(crate) use egui_shell::EguiShell;
pub(crate) use webview::WebviewShell;

pub(crate) const TITLE: &str = "Smore - Bitcoin Wallet Recovery";

/// Everything the launcher learned before the window exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppContext {
    pub(crate) backend: Backend,
    pub(crate) worker_threads: usize,
    pub(crate) hardware: Option<HardwareInfo>,
    pub(crate) preload_error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum RunError {
    /// The window never came up. The replayed records are handed back so the
    /// next backend can show them.
    #[error("{backend} interface failed to start: {error:#}")]
    Startup {
        backend: Backend,
        error: anyhow::Error,
        records: Vec<LogRecord>,
    },
    #[error("{backend} interface stopped with an error: {error:#}")]
    Crashed { backend: Backend, error: anyhow::Error },
}

pub(crate) trait LiveApplication {
    fn backend(&self) -> Backend;
    /// Takes ownership of the records buffered before the UI existed.
    fn replay(&mut self, records: Vec<LogRecord>);
    /// Blocks until the window is closed.
    fn run_loop(self: Box<Self>) -> Result<(), RunError>;
}

pub(crate) trait AppFactory {
    fn build(&self, backend: Backend, context: AppContext) -> Result<Box<dyn LiveApplication>>;
}

/// Builds the real windows.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NativeFactory;

impl AppFactory for NativeFactory {
    fn build(&self, backend: Backend, context: AppContext) -> Result<Box<dyn LiveApplication>> {
        match backend {
            Backend::Webview => Ok(Box::new(WebviewShell::new(context)?)),
            Backend::Egui => Ok(Box::new(EguiShell::new(context))),
        }
    }
}

fn apply_theme(ctx: &egui::Context) {
    let accent = egui::Color32::from_rgb(0xF7, 0x93, 0x1A); // bitcoin orange
    let accent2 = egui::Color32::from_rgb(0x7C, 0x5C, 0xFF);
    let bg = egui::Color32::from_rgb(0x07, 0x0A, 0x18);
    let panel = egui::Color32::from_rgb(0x0E, 0x12, 0x26);

    let mut style = (*ctx.style()).clone();
    style.visuals = egui::Visuals::dark();
    style.visuals.panel_fill = bg;
    style.visuals.window_fill = panel;
    style.visuals.faint_bg_color = egui::Color32::from_rgb(0x0B, 0x0F, 0x22);
    style.visuals.extreme_bg_color = egui::Color32::from_rgb(0x04, 0x06, 0x10);

    style.visuals.widgets.noninteractive.bg_fill = panel;
    style.visuals.widgets.noninteractive.fg_stroke.color =
        egui::Color32::from_rgb(0xC9, 0xD2, 0xFF);
    style.visuals.window_rounding = egui::Rounding::same(10.0);

    style.visuals.selection.bg_fill = accent.linear_multiply(0.45);
    style.visuals.selection.stroke.color = accent;
    style.visuals.hyperlink_color = accent2;
    style.visuals.error_fg_color = egui::Color32::from_rgb(0xFF, 0x4D, 0x6D);
    style.visuals.warn_fg_color = egui::Color32::from_rgb(0xFF, 0xC1, 0x4D);

    let border = egui::Stroke::new(
        1.0,
        egui::Color32::from_rgba_premultiplied(0x7C, 0x5C, 0xFF, 60),
    );
    style.visuals.window_stroke = border;
    style.visuals.widgets.noninteractive.bg_stroke = border;

    ctx.set_style(style);
}
