use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;
use eframe::egui;

use crate::logsink::LogRecord;
use crate::models::Backend;

use super::state::{ShellState, SmoreApp};
use super::{apply_theme, AppContext, LiveApplication, RunError, TITLE};

/// eframe only creates its window inside `run_native`, so window creation errors
/// surface from [`LiveApplication::run_loop`] as [`RunError::Startup`].
pub(crate) struct EguiShell {
    options: eframe::NativeOptions,
    state: ShellState,
}

impl EguiShell {
    pub(crate) fn new(context: AppContext) -> Self {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title(TITLE)
                .with_inner_size([1100.0, 720.0])
                .with_min_inner_size([720.0, 420.0]),
            ..Default::default()
        };
        Self {
            options,
            state: ShellState {
                context,
                records: Vec::new(),
            },
        }
    }
}

impl LiveApplication for EguiShell {
    fn backend(&self) -> Backend {
        Backend::Egui
    }

    fn replay(&mut self, records: Vec<LogRecord>) {
        self.state.records.extend(records);
    }

    fn run_loop(self: Box<Self>) -> Result<(), RunError> {
        let EguiShell { options, state } = *self;

        // Still `Some` afterwards means the creator never ran: no window was shown.
        let pending = Rc::new(RefCell::new(Some(state)));
        let slot = Rc::clone(&pending);
        let creator: eframe::AppCreator<'static> = Box::new(move |cc| {
            apply_theme(&cc.egui_ctx);
            match slot.borrow_mut().take() {
                Some(state) => Ok(Box::new(SmoreApp::new(state))),
                None => Err("application state already consumed".into()),
            }
        });

        let result = eframe::run_native(TITLE, options, creator);
        let unstarted = pending.borrow_mut().take();
        match (result, unstarted) {
            (Ok(()), _) => Ok(()),
            (Err(e), Some(state)) => Err(RunError::Startup {
                backend: Backend::Egui,
                error: anyhow!("{e}"),
                records: state.records,
            }),
            (Err(e), None) => Err(RunError::Crashed {
                backend: Backend::Egui,
                error: anyhow!("{e}"),
            }),
        }
    }
}
