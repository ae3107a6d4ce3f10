//! Optional transient screen shown while the preload runs.

mod helper;

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::logsink::LogSink;
use crate::models::Timings;
use crate::preload::PreloadHandle;

pub(crate) use helper::HelperSplash;

const SOURCE: &str = "splash";

pub(crate) trait SplashScreen {
    fn show(&mut self) -> Result<()>;
    fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SplashOutcome {
    Shown { displayed: Duration },
    Skipped,
}

pub(crate) struct SplashCoordinator {
    timings: Timings,
    sink: LogSink,
}

impl SplashCoordinator {
    pub(crate) fn new(timings: Timings, sink: LogSink) -> Self {
        Self { timings, sink }
    }

    /// Shows the splash and returns once both the minimum display time has passed
    /// and the preload has reported (or hit its deadline). A splash that cannot be
    /// shown is skipped; the preload is left untouched in that case.
    pub(crate) fn run(
        &self,
        screen: &mut dyn SplashScreen,
        preload: &mut PreloadHandle,
    ) -> SplashOutcome {
        let shown_at = Instant::now();
        if let Err(e) = screen.show() {
            self.sink.warn(
                SOURCE,
                format!("Error during splash screen: {e:#}; starting without splash"),
            );
            return SplashOutcome::Skipped;
        }

        let min_until = tokio::time::Instant::from_std(shown_at + self.timings.splash_min);
        let timeout = self.timings.preload_timeout;
        let rt = preload.runtime().clone();
        let success = rt.block_on(async {
            let (_, result) =
                tokio::join!(tokio::time::sleep_until(min_until), preload.wait(timeout));
            result.success
        });

        screen.close();
        let displayed = shown_at.elapsed();
        self.sink.debug(
            SOURCE,
            format!("splash closed after {} ms (preload ok: {success})", displayed.as_millis()),
        );
        SplashOutcome::Shown { displayed }
    }
}
