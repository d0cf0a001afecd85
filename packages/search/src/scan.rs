//! Scanning indicator driven by the nearby search.
//!
//! Defines a [`ScanIndicator`] trait that decouples the "scanning" visual
//! (a pulsing ring over the map, a terminal spinner) from the search
//! controller. The controller calls [`ScanIndicator::start`] on entry to
//! the searching state and [`ScanIndicator::finish`] on every exit path.

use std::sync::Arc;

/// Trait for the visual shown while a nearby search is running.
///
/// Implementations must be `Send + Sync` to support `Arc`-based sharing.
pub trait ScanIndicator: Send + Sync {
    /// Show the indicator with a message.
    fn start(&self, message: String);

    /// Hide the indicator.
    fn finish(&self);
}

/// A no-op implementation of [`ScanIndicator`].
///
/// Useful for tests and hosts that render scanning state from
/// [`crate::nearby::NearbySearchController::is_scanning`] instead.
pub struct NullScan;

impl ScanIndicator for NullScan {
    fn start(&self, _message: String) {}
    fn finish(&self) {}
}

/// Returns a shared [`NullScan`] instance for convenient use.
#[must_use]
pub fn null_scan() -> Arc<dyn ScanIndicator> {
    Arc::new(NullScan)
}
