//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use alertx_geo_models::Coordinate;
use alertx_geocoder::{ForwardGeocoder, GeocodeError, ReverseGeocoder};
use alertx_poi::{NearbyPoiProvider, PoiError};
use alertx_search::geolocate::{PositionError, PositionSource};
use alertx_search::viewport::InMemoryMap;
use alertx_search::{
    LiveMapConfig, LiveMapSession, Notice, Notifier, ScanIndicator, SessionProviders,
};
use alertx_search_models::{SearchParameters, SearchResult, SuggestionItem};

pub fn at(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

/// Answers forward lookups from a script, with an optional per-query delay.
#[derive(Default)]
pub struct ScriptedGeocoder {
    answers: BTreeMap<String, Vec<SuggestionItem>>,
    delays: BTreeMap<String, Duration>,
    reverse_label: Option<String>,
    pub queries: Mutex<Vec<String>>,
}

impl ScriptedGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, query: &str, items: &[(&str, f64, f64)]) -> Self {
        self.answers.insert(
            query.to_string(),
            items
                .iter()
                .map(|(label, lat, lon)| SuggestionItem {
                    display_label: (*label).to_string(),
                    coordinate: at(*lat, *lon),
                })
                .collect(),
        );
        self
    }

    pub fn delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn reverse_label(mut self, label: &str) -> Self {
        self.reverse_label = Some(label.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ForwardGeocoder for ScriptedGeocoder {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SuggestionItem>, GeocodeError> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        let mut items = self.answers.get(query).cloned().unwrap_or_default();
        items.truncate(limit);
        Ok(items)
    }
}

#[async_trait::async_trait]
impl ReverseGeocoder for ScriptedGeocoder {
    async fn reverse(&self, _at: Coordinate) -> Result<Option<String>, GeocodeError> {
        Ok(self.reverse_label.clone())
    }
}

/// Returns `per_category` places for every requested category, ignoring
/// the requested cap.
pub struct StubNearby {
    per_category: usize,
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
}

impl StubNearby {
    pub fn new(per_category: usize) -> Self {
        Self {
            per_category,
            delay: Duration::from_millis(100),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NearbyPoiProvider for StubNearby {
    async fn nearby(&self, params: &SearchParameters) -> Result<Vec<SearchResult>, PoiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(PoiError::Status { status: 504 });
        }

        let origin = params.coordinate();
        let mut out = Vec::new();
        for key in params.categories() {
            for i in 0..self.per_category {
                #[allow(clippy::cast_precision_loss)]
                let offset = (i as f64 + 1.0) * 0.001;
                let spot = at(origin.latitude() + offset, origin.longitude());
                out.push(SearchResult::new(
                    format!("{} {i}", key.display_name()),
                    *key,
                    spot,
                    origin.distance_km(&spot),
                ));
            }
        }
        Ok(out)
    }
}

pub struct DeniedPosition;

#[async_trait::async_trait]
impl PositionSource for DeniedPosition {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        Err(PositionError::PermissionDenied)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[derive(Default)]
pub struct CountingScan {
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
}

impl ScanIndicator for CountingScan {
    fn start(&self, _message: String) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub session: LiveMapSession<InMemoryMap>,
    pub map: InMemoryMap,
    pub geocoder: Arc<ScriptedGeocoder>,
    pub nearby: Arc<StubNearby>,
    pub notices: Arc<RecordingNotifier>,
    pub scan: Arc<CountingScan>,
}

pub fn harness(
    geocoder: ScriptedGeocoder,
    nearby: StubNearby,
    position: Option<Arc<dyn PositionSource>>,
) -> Harness {
    let map = InMemoryMap::new();
    let geocoder = Arc::new(geocoder);
    let nearby = Arc::new(nearby);
    let notices = Arc::new(RecordingNotifier::default());
    let scan = Arc::new(CountingScan::default());

    let session = LiveMapSession::mount(
        map.clone(),
        SessionProviders {
            forward: geocoder.clone(),
            reverse: geocoder.clone(),
            nearby: nearby.clone(),
            position,
        },
        &LiveMapConfig::embedded(),
    )
    .unwrap()
    .with_notifier(notices.clone())
    .with_scan_indicator(scan.clone());

    Harness {
        session,
        map,
        geocoder,
        nearby,
        notices,
        scan,
    }
}
