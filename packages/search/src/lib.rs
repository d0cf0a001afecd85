#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location search and map state for the live map.
//!
//! A [`session::LiveMapSession`] owns everything one user interacts with:
//! the place being searched around, debounced autocomplete, "use my
//! location", the selected categories, the map viewport, the nearby search
//! state machine and result export. Network collaborators are injected as
//! trait objects so hosts and tests choose the implementations.

pub mod categories;
pub mod config;
pub mod export;
pub mod geolocate;
pub mod nearby;
pub mod notice;
pub mod place_query;
pub mod scan;
pub mod session;
pub mod suggest;
pub mod viewport;

pub use categories::CategorySelection;
pub use config::LiveMapConfig;
pub use export::{ExportError, ExportFile};
pub use geolocate::{GeolocateError, Geolocator, LocatedPlace, PositionError, PositionSource};
pub use nearby::{NearbySearchController, SearchError, SearchState};
pub use notice::{Notice, NoticeLevel, Notifier};
pub use place_query::PlaceQuery;
pub use scan::ScanIndicator;
pub use session::{LiveMapSession, SessionError, SessionProviders};
pub use suggest::GeoSuggest;
pub use viewport::{InMemoryMap, MapBackend, MapViewport};
