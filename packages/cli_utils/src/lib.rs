#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared terminal utilities for the alertx tools.
//!
//! Provides an `indicatif` spinner behind the [`ScanIndicator`] trait, a
//! [`Notifier`] that prints notices above any running spinner, plus
//! [`init_logger`] which sets up `indicatif-log-bridge` so that
//! `log::info!` and friends are suspended while spinners redraw.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use alertx_search::notice::NoticeLevel;
use alertx_search::{Notice, Notifier, ScanIndicator};
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// An `indicatif` spinner that implements [`ScanIndicator`].
///
/// A fresh spinner is added to the [`MultiProgress`] on every
/// [`ScanIndicator::start`] and cleared on [`ScanIndicator::finish`].
pub struct IndicatifScan {
    multi: MultiProgress,
    style: ProgressStyle,
    bar: Mutex<Option<ProgressBar>>,
}

impl IndicatifScan {
    #[must_use]
    pub fn new(multi: &MultiProgress) -> Arc<dyn ScanIndicator> {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        Arc::new(Self {
            multi: multi.clone(),
            style,
            bar: Mutex::new(None),
        })
    }
}

impl ScanIndicator for IndicatifScan {
    fn start(&self, message: String) {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(self.style.clone());
        bar.set_message(message);

        let previous = self
            .bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(bar);
        if let Some(previous) = previous {
            previous.finish_and_clear();
        }
    }

    fn finish(&self) {
        let bar = self.bar.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    }
}

/// Prints notices to stderr, suspending spinners while writing.
pub struct TerminalNotifier {
    multi: MultiProgress,
}

impl TerminalNotifier {
    #[must_use]
    pub fn new(multi: &MultiProgress) -> Arc<dyn Notifier> {
        Arc::new(Self {
            multi: multi.clone(),
        })
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        let prefix = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        self.multi
            .suspend(|| eprintln!("{prefix}: {}", notice.message));
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while spinners redraw.
///
/// Returns the [`MultiProgress`] that all spinners must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_without_start_is_harmless() {
        let multi = MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden());
        let scan = IndicatifScan::new(&multi);
        scan.finish();
        scan.start("Scanning Police Stations within 10km".to_string());
        scan.start("Scanning again".to_string());
        scan.finish();
        scan.finish();
    }
}
