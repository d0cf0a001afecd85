#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data types for the location search and nearby point-of-interest flow.
//!
//! These types cross crate boundaries: providers produce [`SuggestionItem`]s
//! and [`SearchResult`]s, the search controller snapshots
//! [`SearchParameters`], and the exporter projects results to
//! [`ExportRow`]s.

use alertx_category_models::CategoryKey;
use alertx_geo_models::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Smallest accepted per-category result cap.
pub const MIN_PER_CATEGORY: u8 = 1;

/// Largest accepted per-category result cap.
pub const MAX_PER_CATEGORY: u8 = 50;

/// Search radius, restricted to the values offered in the radius picker.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(try_from = "u32", into = "u32")]
pub enum SearchRadius {
    #[strum(serialize = "5km")]
    Km5,
    #[default]
    #[strum(serialize = "10km")]
    Km10,
    #[strum(serialize = "25km")]
    Km25,
    #[strum(serialize = "50km")]
    Km50,
    #[strum(serialize = "100km")]
    Km100,
}

impl SearchRadius {
    /// Radius in meters.
    #[must_use]
    pub const fn meters(self) -> u32 {
        match self {
            Self::Km5 => 5_000,
            Self::Km10 => 10_000,
            Self::Km25 => 25_000,
            Self::Km50 => 50_000,
            Self::Km100 => 100_000,
        }
    }

    /// Radius in whole kilometers.
    #[must_use]
    pub const fn kilometers(self) -> u32 {
        self.meters() / 1000
    }

    /// Returns all variants in ascending order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Km5, Self::Km10, Self::Km25, Self::Km50, Self::Km100]
    }
}

impl TryFrom<u32> for SearchRadius {
    type Error = ParameterError;

    fn try_from(meters: u32) -> Result<Self, Self::Error> {
        Self::all()
            .iter()
            .copied()
            .find(|r| r.meters() == meters)
            .ok_or(ParameterError::Radius(meters))
    }
}

impl From<SearchRadius> for u32 {
    fn from(r: SearchRadius) -> Self {
        r.meters()
    }
}

/// Errors from constructing search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// Radius is not one of the offered values.
    #[error("radius {0} m is not one of 5, 10, 25, 50 or 100 km")]
    Radius(u32),

    /// Per-category cap is outside `[1, 50]`.
    #[error("max per category {0} is outside [1, 50]")]
    MaxPerCategory(u32),
}

/// Snapshot of one nearby search request.
///
/// Built at submission time and never mutated afterwards. The category
/// list may be empty here; the search controller is what refuses to run
/// an empty search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParameters {
    coordinate: Coordinate,
    radius: SearchRadius,
    categories: Vec<CategoryKey>,
    max_per_category: u8,
}

impl SearchParameters {
    /// Creates a parameter snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::MaxPerCategory`] if `max_per_category` is
    /// outside `[1, 50]`.
    pub fn new(
        coordinate: Coordinate,
        radius: SearchRadius,
        categories: Vec<CategoryKey>,
        max_per_category: u32,
    ) -> Result<Self, ParameterError> {
        let max = u8::try_from(max_per_category)
            .ok()
            .filter(|m| (MIN_PER_CATEGORY..=MAX_PER_CATEGORY).contains(m))
            .ok_or(ParameterError::MaxPerCategory(max_per_category))?;

        Ok(Self {
            coordinate,
            radius,
            categories,
            max_per_category: max,
        })
    }

    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    #[must_use]
    pub const fn radius(&self) -> SearchRadius {
        self.radius
    }

    #[must_use]
    pub fn categories(&self) -> &[CategoryKey] {
        &self.categories
    }

    #[must_use]
    pub const fn max_per_category(&self) -> u8 {
        self.max_per_category
    }

    /// Upper bound on the number of results a provider may return.
    #[must_use]
    pub fn max_results(&self) -> usize {
        self.categories.len() * usize::from(self.max_per_category)
    }
}

/// A forward-geocoding suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionItem {
    /// Label shown in the suggestion list and copied into the place field
    /// on selection.
    pub display_label: String,
    /// Where the suggestion points.
    pub coordinate: Coordinate,
}

/// One nearby point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// POI name (`"Unnamed"` when the source has none).
    pub name: String,
    /// Category this POI was classified into.
    pub category_key: CategoryKey,
    /// Category display name, e.g. `"Police Stations"`.
    pub category_display_name: String,
    /// Category emoji.
    pub category_emoji: String,
    /// Category group tag, e.g. `"government"`.
    pub category_group: String,
    /// POI location.
    pub coordinate: Coordinate,
    /// Great-circle distance from the query coordinate, in kilometers.
    pub distance_km: f64,
}

impl SearchResult {
    /// Builds a result, filling the category presentation fields from the
    /// catalog.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: CategoryKey,
        coordinate: Coordinate,
        distance_km: f64,
    ) -> Self {
        Self {
            name: name.into(),
            category_key: category,
            category_display_name: category.display_name().to_string(),
            category_emoji: category.emoji().to_string(),
            category_group: category.group_tag().to_string(),
            coordinate,
            distance_km: distance_km.max(0.0),
        }
    }
}

/// A result row as written to an export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub name: String,
    /// Category display name.
    pub category: String,
    pub lat: f64,
    pub lon: f64,
    pub distance_km: f64,
}

impl From<&SearchResult> for ExportRow {
    fn from(r: &SearchResult) -> Self {
        Self {
            name: r.name.clone(),
            category: r.category_display_name.clone(),
            lat: r.coordinate.latitude(),
            lon: r.coordinate.longitude(),
            distance_km: r.distance_km,
        }
    }
}
