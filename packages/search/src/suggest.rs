//! Debounced place autocomplete.
//!
//! Each edit of the place text re-arms a single pending lookup. The lookup
//! only fires once the text has been quiet for the debounce delay, so a
//! burst of keystrokes produces one geocoder request. Every edit also bumps
//! a generation counter; a response that comes back after a newer edit is
//! dropped instead of overwriting fresher suggestions.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::time::Duration;

use alertx_geocoder::ForwardGeocoder;
use alertx_search_models::SuggestionItem;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SuggestSettings;

/// The one lookup that may be waiting on the debounce timer.
///
/// Re-arming or cancelling aborts the previous timer. Once the timer has
/// fired the request is left to finish; its result is filtered by
/// generation instead.
#[derive(Default)]
struct PendingLookup {
    armed: Option<Armed>,
}

struct Armed {
    handle: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

impl PendingLookup {
    fn replace(&mut self, handle: JoinHandle<()>, fired: Arc<AtomicBool>) {
        self.cancel();
        self.armed = Some(Armed { handle, fired });
    }

    fn cancel(&mut self) {
        if let Some(armed) = self.armed.take() {
            if !armed.fired.load(Ordering::Acquire) {
                armed.handle.abort();
            }
        }
    }

    fn is_waiting(&self) -> bool {
        self.armed
            .as_ref()
            .is_some_and(|a| !a.fired.load(Ordering::Acquire) && !a.handle.is_finished())
    }
}

impl Drop for PendingLookup {
    fn drop(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.handle.abort();
        }
    }
}

/// Debounced autocomplete over a [`ForwardGeocoder`].
pub struct GeoSuggest {
    geocoder: Arc<dyn ForwardGeocoder>,
    delay: Duration,
    limit: usize,
    pending: PendingLookup,
    generation: Arc<AtomicU64>,
    suggestions: Arc<watch::Sender<Vec<SuggestionItem>>>,
}

impl GeoSuggest {
    #[must_use]
    pub fn new(geocoder: Arc<dyn ForwardGeocoder>, settings: &SuggestSettings) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            geocoder,
            delay: settings.debounce(),
            limit: settings.limit,
            pending: PendingLookup::default(),
            generation: Arc::new(AtomicU64::new(0)),
            suggestions: Arc::new(tx),
        }
    }

    /// Handles an edit of the place text.
    ///
    /// Blank text clears the suggestions and cancels any pending lookup
    /// without contacting the geocoder. Otherwise a lookup is scheduled
    /// after the debounce delay, replacing any earlier one.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn on_query_changed(&mut self, text: &str) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let query = text.trim();
        if query.is_empty() {
            self.pending.cancel();
            self.suggestions.send_replace(Vec::new());
            return;
        }

        let query = query.to_string();
        let fired = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(lookup(
            Arc::clone(&self.geocoder),
            query,
            self.delay,
            self.limit,
            Lookup {
                generation,
                current: Arc::clone(&self.generation),
                fired: Arc::clone(&fired),
                out: Arc::clone(&self.suggestions),
            },
        ));
        self.pending.replace(handle, fired);
    }

    /// Picks the suggestion at `index`, clearing the list.
    ///
    /// Returns `None` if `index` is out of range; the list is left alone in
    /// that case.
    pub fn select(&mut self, index: usize) -> Option<SuggestionItem> {
        let picked = self.suggestions.borrow().get(index).cloned()?;
        self.dismiss();
        Some(picked)
    }

    /// Clears the suggestions and drops any lookup in flight.
    pub fn dismiss(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.pending.cancel();
        self.suggestions.send_replace(Vec::new());
    }

    #[must_use]
    pub fn suggestions(&self) -> Vec<SuggestionItem> {
        self.suggestions.borrow().clone()
    }

    /// Subscribes to suggestion list updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<SuggestionItem>> {
        self.suggestions.subscribe()
    }

    /// Whether a lookup is still waiting for the debounce delay.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_waiting()
    }
}

struct Lookup {
    generation: u64,
    current: Arc<AtomicU64>,
    fired: Arc<AtomicBool>,
    out: Arc<watch::Sender<Vec<SuggestionItem>>>,
}

async fn lookup(
    geocoder: Arc<dyn ForwardGeocoder>,
    query: String,
    delay: Duration,
    limit: usize,
    ctx: Lookup,
) {
    tokio::time::sleep(delay).await;
    ctx.fired.store(true, Ordering::Release);

    log::debug!("Looking up suggestions for {query:?}");
    let mut items = match geocoder.search(&query, limit).await {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Suggestion lookup for {query:?} failed: {e}");
            Vec::new()
        }
    };
    items.truncate(limit);

    ctx.out.send_if_modified(|current| {
        if ctx.current.load(Ordering::Acquire) != ctx.generation {
            log::debug!("Discarding stale suggestions for {query:?}");
            return false;
        }
        *current = items;
        true
    });
}
