use crate::models::{Backend, LaunchConfig};
use crate::probe::CapabilityProbe;

/// Picks the backend for this run.
///
/// An explicit choice is returned without probing. For `auto` the first backend in
/// [`Backend::PRIORITY`] whose runtime is present wins, and [`Backend::GUARANTEED`]
/// is used when none is.
pub(crate) fn select(config: &LaunchConfig, probe: &dyn CapabilityProbe) -> Backend {
    if let Some(backend) = config.backend.explicit() {
        return backend;
    }
    Backend::PRIORITY
        .into_iter()
        .find(|b| probe.is_available(*b))
        .unwrap_or(Backend::GUARANTEED)
}
