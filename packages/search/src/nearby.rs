//! Nearby point-of-interest search.
//!
//! [`NearbySearchController`] is a state machine over [`SearchState`]:
//!
//! ```text
//! Idle ──start──▶ Searching ──ok──▶ Completed
//!                     │
//!                     └──err──▶ Failed
//! ```
//!
//! `Completed` and `Failed` accept a new search. A search started while
//! another one is `Searching` is rejected with
//! [`SearchError::AlreadySearching`]; the running one is left alone.

use std::collections::BTreeMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use alertx_category_models::CategoryKey;
use alertx_poi::{NearbyPoiProvider, PoiError};
use alertx_search_models::{SearchParameters, SearchResult};
use thiserror::Error;
use tokio::sync::watch;

use crate::scan::{ScanIndicator, null_scan};

/// Message stored when a search future is dropped before it finishes.
pub const CANCELLED_MESSAGE: &str = "Search cancelled";

/// Lifecycle of the most recent search.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    /// A request is in flight. Results of the previous search are gone.
    Searching { params: SearchParameters },
    /// The provider answered. Zero results is still a completed search.
    Completed { results: Vec<SearchResult> },
    /// The provider failed; `message` is shown to the user.
    Failed { message: String },
}

impl SearchState {
    #[must_use]
    pub const fn is_searching(&self) -> bool {
        matches!(self, Self::Searching { .. })
    }

    #[must_use]
    pub fn results(&self) -> &[SearchResult] {
        match self {
            Self::Completed { results } => results,
            _ => &[],
        }
    }
}

/// Errors from [`NearbySearchController::start_search`].
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Please select at least one category")]
    NoCategories,

    #[error("A search is already running")]
    AlreadySearching,

    #[error("Search failed: {0}")]
    Provider(#[from] PoiError),
}

pub struct NearbySearchController {
    provider: Arc<dyn NearbyPoiProvider>,
    scan: Arc<dyn ScanIndicator>,
    scanning: AtomicBool,
    state: watch::Sender<SearchState>,
}

impl NearbySearchController {
    #[must_use]
    pub fn new(provider: Arc<dyn NearbyPoiProvider>) -> Self {
        Self {
            provider,
            scan: null_scan(),
            scanning: AtomicBool::new(false),
            state: watch::Sender::new(SearchState::Idle),
        }
    }

    /// Replaces the scanning visual.
    pub fn set_scan_indicator(&mut self, scan: Arc<dyn ScanIndicator>) {
        self.scan = scan;
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Whether a search is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_searching()
    }

    /// Whether the scanning indicator is showing.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::Acquire)
    }

    /// Results of the last completed search, or empty.
    #[must_use]
    pub fn results(&self) -> Vec<SearchResult> {
        self.state.borrow().results().to_vec()
    }

    /// Runs one search and returns the number of results.
    ///
    /// The category check and the transition into `Searching` happen on the
    /// first poll, before any request is sent.
    ///
    /// # Errors
    ///
    /// * [`SearchError::NoCategories`] if `params` names no category; state
    ///   is not touched
    /// * [`SearchError::AlreadySearching`] if a search is in flight; state
    ///   is not touched
    /// * [`SearchError::Provider`] if the provider fails; state becomes
    ///   [`SearchState::Failed`]
    pub async fn start_search(&self, params: SearchParameters) -> Result<usize, SearchError> {
        if params.categories().is_empty() {
            return Err(SearchError::NoCategories);
        }

        let entered = self.state.send_if_modified(|state| {
            if state.is_searching() {
                return false;
            }
            *state = SearchState::Searching {
                params: params.clone(),
            };
            true
        });
        if !entered {
            log::debug!("Rejecting search while another is running");
            return Err(SearchError::AlreadySearching);
        }

        let run = ActiveSearch::begin(self, &params);

        match self.provider.nearby(&params).await {
            Ok(results) => {
                let results = cap_per_category(results, &params);
                let count = results.len();
                log::info!(
                    "Found {count} places within {} of {}",
                    params.radius(),
                    params.coordinate()
                );
                run.finish(SearchState::Completed { results });
                Ok(count)
            }
            Err(e) => {
                let err = SearchError::from(e);
                log::warn!("{err}");
                run.finish(SearchState::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }
}

/// Scanning and terminal-state bookkeeping for one search.
///
/// Dropping it without [`Self::finish`] (the search future was dropped)
/// still hides the indicator and moves the state to `Failed`.
struct ActiveSearch<'a> {
    controller: &'a NearbySearchController,
    finished: bool,
}

impl<'a> ActiveSearch<'a> {
    fn begin(controller: &'a NearbySearchController, params: &SearchParameters) -> Self {
        controller.scanning.store(true, Ordering::Release);
        controller.scan.start(format!(
            "Scanning {} within {}",
            params
                .categories()
                .iter()
                .map(|k| k.display_name())
                .collect::<Vec<_>>()
                .join(", "),
            params.radius()
        ));
        Self {
            controller,
            finished: false,
        }
    }

    fn finish(mut self, state: SearchState) {
        self.hide();
        self.controller.state.send_replace(state);
        self.finished = true;
    }

    fn hide(&self) {
        self.controller.scanning.store(false, Ordering::Release);
        self.controller.scan.finish();
    }
}

impl Drop for ActiveSearch<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.hide();
        self.controller.state.send_if_modified(|state| {
            if !state.is_searching() {
                return false;
            }
            *state = SearchState::Failed {
                message: CANCELLED_MESSAGE.to_string(),
            };
            true
        });
    }
}

/// Keeps at most `max_per_category` results per category, in provider
/// order, dropping results for categories that were not requested.
fn cap_per_category(results: Vec<SearchResult>, params: &SearchParameters) -> Vec<SearchResult> {
    let max = usize::from(params.max_per_category());
    let mut seen: BTreeMap<CategoryKey, usize> = BTreeMap::new();

    results
        .into_iter()
        .filter(|r| {
            if !params.categories().contains(&r.category_key) {
                return false;
            }
            let n = seen.entry(r.category_key).or_default();
            *n += 1;
            *n <= max
        })
        .collect()
}
