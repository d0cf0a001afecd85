//! One live map session.
//!
//! [`LiveMapSession`] wires the place query, autocomplete, geolocation,
//! category selection, viewport, nearby search and export together. It is
//! the only owner of the map viewport, so every marker change goes through
//! [`MapViewport::center_on`].

use std::sync::Arc;

use alertx_category_models::CategoryKey;
use alertx_geo_models::{Coordinate, CoordinateError};
use alertx_geocoder::{ForwardGeocoder, ReverseGeocoder};
use alertx_poi::NearbyPoiProvider;
use alertx_search_models::{
    MAX_PER_CATEGORY, MIN_PER_CATEGORY, ParameterError, SearchParameters, SearchRadius,
    SearchResult, SuggestionItem,
};
use thiserror::Error;
use tokio::sync::watch;

use crate::categories::CategorySelection;
use crate::config::LiveMapConfig;
use crate::export::{self, ExportError, ExportFile};
use crate::geolocate::{CURRENT_LOCATION_POPUP, GeolocateError, Geolocator, PositionSource};
use crate::nearby::{NearbySearchController, SearchError, SearchState};
use crate::notice::{Notice, Notifier, log_notifier};
use crate::place_query::PlaceQuery;
use crate::scan::ScanIndicator;
use crate::suggest::GeoSuggest;
use crate::viewport::{MapBackend, MapViewport};

/// Errors surfaced by [`LiveMapSession`]. Every one of them is also sent
/// to the session's [`Notifier`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please choose a location first")]
    NoLocation,

    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    #[error(transparent)]
    Parameters(#[from] ParameterError),

    #[error(transparent)]
    Geolocate(#[from] GeolocateError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// External collaborators a session talks to.
#[derive(Clone)]
pub struct SessionProviders {
    pub forward: Arc<dyn ForwardGeocoder>,
    pub reverse: Arc<dyn ReverseGeocoder>,
    pub nearby: Arc<dyn NearbyPoiProvider>,
    /// `None` when the host cannot read a device position.
    pub position: Option<Arc<dyn PositionSource>>,
}

pub struct LiveMapSession<B: MapBackend> {
    place: PlaceQuery,
    suggest: GeoSuggest,
    geolocator: Geolocator,
    categories: CategorySelection,
    radius: SearchRadius,
    max_per_category: u32,
    controller: NearbySearchController,
    viewport: MapViewport<B>,
    notifier: Arc<dyn Notifier>,
}

impl<B: MapBackend> LiveMapSession<B> {
    /// Mounts the map on `backend` and starts an empty session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Parameters`] if the configured default
    /// max-per-category is out of range.
    pub fn mount(
        backend: B,
        providers: SessionProviders,
        config: &LiveMapConfig,
    ) -> Result<Self, SessionError> {
        let max_per_category = config.search.default_max_per_category;
        validate_max_per_category(max_per_category)?;

        Ok(Self {
            place: PlaceQuery::default(),
            suggest: GeoSuggest::new(providers.forward, &config.suggest),
            geolocator: Geolocator::new(providers.position, providers.reverse),
            categories: CategorySelection::new(),
            radius: config.search.default_radius,
            max_per_category,
            controller: NearbySearchController::new(providers.nearby),
            viewport: MapViewport::mount(backend, &config.map),
            notifier: log_notifier(),
        })
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_scan_indicator(mut self, scan: Arc<dyn ScanIndicator>) -> Self {
        self.controller.set_scan_indicator(scan);
        self
    }

    fn report<E: Into<SessionError>>(&self, e: E) -> SessionError {
        let e = e.into();
        self.notifier.notify(Notice::error(e.to_string()));
        e
    }

    // Place

    #[must_use]
    pub const fn place(&self) -> &PlaceQuery {
        &self.place
    }

    /// Handles an edit of the place text.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn on_place_input(&mut self, text: &str) {
        self.place.edit_label(text);
        self.suggest.on_query_changed(text);
    }

    #[must_use]
    pub fn suggestions(&self) -> Vec<SuggestionItem> {
        self.suggest.suggestions()
    }

    #[must_use]
    pub fn subscribe_suggestions(&self) -> watch::Receiver<Vec<SuggestionItem>> {
        self.suggest.subscribe()
    }

    /// Resolves the place to the suggestion at `index` and centers the map
    /// on it.
    pub fn select_suggestion(&mut self, index: usize) -> Option<SuggestionItem> {
        let item = self.suggest.select(index)?;
        self.place.resolve(item.display_label.clone(), item.coordinate);
        self.viewport.center_on(item.coordinate, &item.display_label);
        Some(item)
    }

    /// Pins the place to typed coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Coordinate`] if either value is out of range;
    /// the place is left unchanged.
    pub fn set_coordinate(&mut self, latitude: f64, longitude: f64) -> Result<Coordinate, SessionError> {
        let coordinate = Coordinate::new(latitude, longitude).map_err(|e| self.report(e))?;

        self.suggest.dismiss();
        if self.place.label().trim().is_empty() {
            self.place.resolve(coordinate.to_string(), coordinate);
        } else {
            self.place.pin(coordinate);
        }
        let label = self.place.label().to_string();
        self.viewport.center_on(coordinate, &label);
        Ok(coordinate)
    }

    /// Resolves the place to the device position.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Geolocate`] if geolocation is unsupported,
    /// already running or refused. The place and the map are not touched.
    pub async fn use_current_location(&mut self) -> Result<Coordinate, SessionError> {
        let located = self
            .geolocator
            .request_current_location()
            .map_err(|e| self.report(e))?
            .await
            .map_err(|e| self.report(e))?;

        self.suggest.dismiss();
        self.place.resolve(located.label, located.coordinate);
        self.viewport
            .center_on(located.coordinate, CURRENT_LOCATION_POPUP);
        Ok(located.coordinate)
    }

    #[must_use]
    pub fn is_locating(&self) -> bool {
        self.geolocator.is_loading()
    }

    // Categories and parameters

    #[must_use]
    pub const fn categories(&self) -> &CategorySelection {
        &self.categories
    }

    pub fn toggle_category(&mut self, key: CategoryKey) -> bool {
        self.categories.toggle(key)
    }

    pub fn remove_category(&mut self, key: CategoryKey) -> bool {
        self.categories.remove(key)
    }

    #[must_use]
    pub const fn radius(&self) -> SearchRadius {
        self.radius
    }

    pub const fn set_radius(&mut self, radius: SearchRadius) {
        self.radius = radius;
    }

    #[must_use]
    pub const fn max_per_category(&self) -> u32 {
        self.max_per_category
    }

    /// # Errors
    ///
    /// Returns [`SessionError::Parameters`] if `max` is outside `[1, 50]`;
    /// the previous value is kept.
    pub fn set_max_per_category(&mut self, max: u32) -> Result<(), SessionError> {
        validate_max_per_category(max).map_err(|e| self.report(e))?;
        self.max_per_category = max;
        Ok(())
    }

    // Search

    /// Searches around the resolved place with the current categories,
    /// radius and max-per-category. Returns the number of results.
    ///
    /// # Errors
    ///
    /// * [`SessionError::Search`] with [`SearchError::NoCategories`] if no
    ///   category is selected
    /// * [`SessionError::NoLocation`] if the place has no coordinate
    /// * [`SessionError::Search`] if a search is already running or the
    ///   provider fails
    pub async fn search(&self) -> Result<usize, SessionError> {
        if self.categories.is_empty() {
            return Err(self.report(SearchError::NoCategories));
        }
        let coordinate = self
            .place
            .coordinate()
            .ok_or_else(|| self.report(SessionError::NoLocation))?;

        let params = SearchParameters::new(
            coordinate,
            self.radius,
            self.categories.keys().to_vec(),
            self.max_per_category,
        )
        .map_err(|e| self.report(e))?;

        let count = self
            .controller
            .start_search(params)
            .await
            .map_err(|e| self.report(e))?;
        if count == 0 {
            self.notifier
                .notify(Notice::info(format!("No places found within {}", self.radius)));
        }
        Ok(count)
    }

    #[must_use]
    pub fn search_state(&self) -> SearchState {
        self.controller.state()
    }

    #[must_use]
    pub fn subscribe_search(&self) -> watch::Receiver<SearchState> {
        self.controller.subscribe()
    }

    #[must_use]
    pub fn results(&self) -> Vec<SearchResult> {
        self.controller.results()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.controller.is_scanning()
    }

    /// Renders the current results for download.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Export`] with
    /// [`ExportError::NothingToExport`] if there are no results.
    pub fn export(&self) -> Result<ExportFile, SessionError> {
        export::export(
            &self.results(),
            self.place.label(),
            self.categories.keys(),
            self.radius,
        )
        .map_err(|e| self.report(e))
    }

    #[must_use]
    pub const fn viewport(&self) -> &MapViewport<B> {
        &self.viewport
    }
}

fn validate_max_per_category(max: u32) -> Result<(), ParameterError> {
    if (u32::from(MIN_PER_CATEGORY)..=u32::from(MAX_PER_CATEGORY)).contains(&max) {
        Ok(())
    } else {
        Err(ParameterError::MaxPerCategory(max))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alertx_geocoder::GeocodeError;
    use alertx_poi::PoiError;

    use super::*;
    use crate::geolocate::FixedPosition;
    use crate::viewport::InMemoryMap;

    struct NoGeocoder;

    #[async_trait::async_trait]
    impl ForwardGeocoder for NoGeocoder {
        async fn search(&self, _q: &str, _limit: usize) -> Result<Vec<SuggestionItem>, GeocodeError> {
            Ok(vec![])
        }
    }

    #[async_trait::async_trait]
    impl ReverseGeocoder for NoGeocoder {
        async fn reverse(&self, _at: Coordinate) -> Result<Option<String>, GeocodeError> {
            Err(GeocodeError::RateLimited)
        }
    }

    struct OnePerCategory;

    #[async_trait::async_trait]
    impl NearbyPoiProvider for OnePerCategory {
        async fn nearby(&self, params: &SearchParameters) -> Result<Vec<SearchResult>, PoiError> {
            Ok(params
                .categories()
                .iter()
                .map(|k| SearchResult::new(k.display_name(), *k, params.coordinate(), 1.0))
                .collect())
        }
    }

    #[derive(Default)]
    struct Notices(Mutex<Vec<Notice>>);

    impl Notifier for Notices {
        fn notify(&self, notice: Notice) {
            self.0.lock().unwrap().push(notice);
        }
    }

    fn session(position: Option<Arc<dyn PositionSource>>) -> (LiveMapSession<InMemoryMap>, Arc<Notices>) {
        let notices = Arc::new(Notices::default());
        let s = LiveMapSession::mount(
            InMemoryMap::new(),
            SessionProviders {
                forward: Arc::new(NoGeocoder),
                reverse: Arc::new(NoGeocoder),
                nearby: Arc::new(OnePerCategory),
                position,
            },
            &LiveMapConfig::embedded(),
        )
        .unwrap()
        .with_notifier(notices.clone());
        (s, notices)
    }

    #[tokio::test]
    async fn search_without_categories_is_reported() {
        let (s, notices) = session(None);
        let err = s.search().await.unwrap_err();

        assert!(matches!(err, SessionError::Search(SearchError::NoCategories)));
        assert_eq!(
            notices.0.lock().unwrap()[0],
            Notice::error("Please select at least one category")
        );
        assert_eq!(s.search_state(), SearchState::Idle);
    }

    #[tokio::test]
    async fn search_without_location_is_reported() {
        let (mut s, _) = session(None);
        s.toggle_category(CategoryKey::Police);

        let err = s.search().await.unwrap_err();
        assert!(matches!(err, SessionError::NoLocation));
        assert_eq!(s.search_state(), SearchState::Idle);
    }

    #[tokio::test]
    async fn typed_coordinates_then_search_and_export() {
        let (mut s, _) = session(None);
        s.on_place_input("Egmore");
        s.set_coordinate(13.0732, 80.2609).unwrap();
        s.toggle_category(CategoryKey::Police);
        s.toggle_category(CategoryKey::GeneralHospital);

        assert_eq!(s.search().await.unwrap(), 2);
        let file = s.export().unwrap();
        assert_eq!(file.filename, "egmore_police_general_hospital_10km_2.json");
    }

    #[tokio::test]
    async fn out_of_range_coordinate_leaves_place_alone() {
        let (mut s, notices) = session(None);
        s.on_place_input("Nowhere");

        assert!(s.set_coordinate(95.0, 0.0).is_err());
        assert!(!s.place().is_resolved());
        assert!(s.viewport().marker().is_none());
        assert_eq!(notices.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn current_location_uses_fallback_label_and_popup() {
        let here = Coordinate::new(13.0, 80.2).unwrap();
        let (mut s, _) = session(Some(Arc::new(FixedPosition(here))));

        assert_eq!(s.use_current_location().await.unwrap(), here);
        assert_eq!(s.place().label(), "Current Location");
        assert_eq!(s.place().coordinate(), Some(here));
        s.viewport().backend().inspect(|l| {
            assert_eq!(l.markers.len(), 1);
            assert_eq!(l.markers[0].2, CURRENT_LOCATION_POPUP);
        });
        assert!(!s.is_locating());
    }

    #[tokio::test]
    async fn max_per_category_is_validated() {
        let (mut s, _) = session(None);
        assert!(s.set_max_per_category(0).is_err());
        assert!(s.set_max_per_category(51).is_err());
        assert_eq!(s.max_per_category(), 5);
        s.set_max_per_category(50).unwrap();
        assert_eq!(s.max_per_category(), 50);
    }
}
