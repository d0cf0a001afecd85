//! Live map tunables.
//!
//! Defaults are embedded at compile time from `config/live_map.toml`.
//! Callers may build a [`LiveMapConfig`] from another TOML document with
//! [`LiveMapConfig::from_toml`].

use std::time::Duration;

use alertx_geo_models::Coordinate;
use alertx_search_models::SearchRadius;
use serde::Deserialize;

const EMBEDDED: &str = include_str!("../config/live_map.toml");

/// All live map settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LiveMapConfig {
    pub suggest: SuggestSettings,
    pub map: MapSettings,
    pub search: SearchSettings,
}

/// Place autocomplete settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SuggestSettings {
    /// Quiet period after the last keystroke before a lookup fires.
    pub debounce_ms: u64,
    /// Maximum suggestions shown.
    pub limit: usize,
}

/// Map construction and navigation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapSettings {
    /// Center used when the map is first constructed.
    pub default_center: Coordinate,
    /// Zoom used when the map is first constructed.
    pub default_zoom: u8,
    /// Zoom the viewport flies to when centering on a place.
    pub fly_to_zoom: u8,
    /// Duration of the fly-to animation.
    pub fly_to_duration_ms: u64,
    /// Base tile layer.
    pub tiles: TileSettings,
}

/// Raster tile layer settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TileSettings {
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
}

/// Nearby search defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchSettings {
    pub default_radius: SearchRadius,
    pub default_max_per_category: u32,
}

impl SuggestSettings {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl MapSettings {
    #[must_use]
    pub const fn fly_to_duration(&self) -> Duration {
        Duration::from_millis(self.fly_to_duration_ms)
    }
}

impl LiveMapConfig {
    /// Parses a config from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML or does not match
    /// the expected shape.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(s)
    }

    /// The compiled-in defaults.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a compile-time guarantee
    /// since it is checked by the tests below).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml(EMBEDDED)
            .unwrap_or_else(|e| panic!("Failed to parse embedded live_map.toml: {e}"))
    }
}

impl Default for LiveMapConfig {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults() {
        let cfg = LiveMapConfig::embedded();
        assert_eq!(cfg.suggest.debounce(), Duration::from_millis(220));
        assert_eq!(cfg.suggest.limit, 6);
        assert_eq!(cfg.map.default_zoom, 12);
        assert_eq!(cfg.map.fly_to_zoom, 13);
        assert_eq!(cfg.map.fly_to_duration(), Duration::from_secs(1));
        assert_eq!(cfg.map.tiles.max_zoom, 19);
        assert_eq!(cfg.search.default_radius, SearchRadius::Km10);
        assert_eq!(cfg.search.default_max_per_category, 5);
    }

    #[test]
    fn rejects_unsupported_radius() {
        let doc = EMBEDDED.replace("default_radius = 10000", "default_radius = 12000");
        assert!(LiveMapConfig::from_toml(&doc).is_err());
    }
}
