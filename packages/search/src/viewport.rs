//! Map viewport lifecycle.
//!
//! Rendering is left to a [`MapBackend`]. [`MapViewport`] owns exactly one
//! map instance for its lifetime and at most one "current place" marker:
//! centering on a new place removes the previous marker before adding the
//! next one, and dropping the viewport destroys the map.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use alertx_geo_models::Coordinate;

use crate::config::{MapSettings, TileSettings};

/// Opaque handle to a map created by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapHandle(pub u64);

/// Opaque handle to a marker created by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// Initial camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
}

/// Animated camera move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    pub target: Coordinate,
    pub zoom: u8,
    pub duration: Duration,
}

/// Rendering surface the viewport drives.
pub trait MapBackend {
    fn create_map(&mut self, view: MapView) -> MapHandle;

    fn add_tile_layer(&mut self, map: MapHandle, tiles: &TileSettings);

    fn add_marker(&mut self, map: MapHandle, at: Coordinate, popup: &str) -> MarkerHandle;

    fn open_popup(&mut self, marker: MarkerHandle);

    fn remove_marker(&mut self, map: MapHandle, marker: MarkerHandle);

    fn fly_to(&mut self, map: MapHandle, fly: FlyTo);

    fn destroy_map(&mut self, map: MapHandle);
}

pub struct MapViewport<B: MapBackend> {
    backend: B,
    map: MapHandle,
    marker: Option<(MarkerHandle, Coordinate)>,
    fly_to_zoom: u8,
    fly_to_duration: Duration,
}

impl<B: MapBackend> MapViewport<B> {
    /// Creates the map at the configured default view and adds the base
    /// tile layer.
    pub fn mount(mut backend: B, settings: &MapSettings) -> Self {
        let map = backend.create_map(MapView {
            center: settings.default_center,
            zoom: settings.default_zoom,
        });
        backend.add_tile_layer(map, &settings.tiles);
        log::debug!("Mounted map {map:?} at {}", settings.default_center);

        Self {
            backend,
            map,
            marker: None,
            fly_to_zoom: settings.fly_to_zoom,
            fly_to_duration: settings.fly_to_duration(),
        }
    }

    /// Moves the place marker to `at`, opens its popup and flies there.
    pub fn center_on(&mut self, at: Coordinate, popup: &str) {
        if let Some((old, _)) = self.marker.take() {
            self.backend.remove_marker(self.map, old);
        }

        let marker = self.backend.add_marker(self.map, at, popup);
        self.backend.open_popup(marker);
        self.marker = Some((marker, at));

        self.backend.fly_to(
            self.map,
            FlyTo {
                target: at,
                zoom: self.fly_to_zoom,
                duration: self.fly_to_duration,
            },
        );
    }

    /// Position of the current place marker.
    #[must_use]
    pub fn marker(&self) -> Option<Coordinate> {
        self.marker.map(|(_, at)| at)
    }

    #[must_use]
    pub const fn map(&self) -> MapHandle {
        self.map
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: MapBackend> Drop for MapViewport<B> {
    fn drop(&mut self) {
        if let Some((marker, _)) = self.marker.take() {
            self.backend.remove_marker(self.map, marker);
        }
        self.backend.destroy_map(self.map);
        log::debug!("Destroyed map {:?}", self.map);
    }
}

/// What an [`InMemoryMap`] has been asked to draw.
#[derive(Debug, Default)]
pub struct MapLedger {
    next_id: u64,
    pub live_maps: Vec<MapHandle>,
    pub tile_layers: Vec<(MapHandle, TileSettings)>,
    pub markers: Vec<(MarkerHandle, Coordinate, String)>,
    pub open_popups: Vec<MarkerHandle>,
    pub last_fly_to: Option<FlyTo>,
    pub maps_created: usize,
    pub maps_destroyed: usize,
}

impl MapLedger {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A [`MapBackend`] that only records calls. Clones share one ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMap {
    ledger: Arc<Mutex<MapLedger>>,
}

impl InMemoryMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the recorded state.
    pub fn inspect<T>(&self, f: impl FnOnce(&MapLedger) -> T) -> T {
        f(&self.ledger.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn with<T>(&self, f: impl FnOnce(&mut MapLedger) -> T) -> T {
        f(&mut self.ledger.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl MapBackend for InMemoryMap {
    fn create_map(&mut self, _view: MapView) -> MapHandle {
        self.with(|l| {
            let map = MapHandle(l.next());
            l.live_maps.push(map);
            l.maps_created += 1;
            map
        })
    }

    fn add_tile_layer(&mut self, map: MapHandle, tiles: &TileSettings) {
        self.with(|l| l.tile_layers.push((map, tiles.clone())));
    }

    fn add_marker(&mut self, _map: MapHandle, at: Coordinate, popup: &str) -> MarkerHandle {
        self.with(|l| {
            let marker = MarkerHandle(l.next());
            l.markers.push((marker, at, popup.to_string()));
            marker
        })
    }

    fn open_popup(&mut self, marker: MarkerHandle) {
        self.with(|l| l.open_popups.push(marker));
    }

    fn remove_marker(&mut self, _map: MapHandle, marker: MarkerHandle) {
        self.with(|l| {
            l.markers.retain(|(m, _, _)| *m != marker);
            l.open_popups.retain(|m| *m != marker);
        });
    }

    fn fly_to(&mut self, _map: MapHandle, fly: FlyTo) {
        self.with(|l| l.last_fly_to = Some(fly));
    }

    fn destroy_map(&mut self, map: MapHandle) {
        self.with(|l| {
            l.live_maps.retain(|m| *m != map);
            l.tile_layers.retain(|(m, _)| *m != map);
            l.maps_destroyed += 1;
        });
    }
}
