#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for the live map.
//!
//! Two capabilities, each behind a trait so the search session can be
//! driven by test doubles:
//!
//! 1. [`ForwardGeocoder`]: free text to a ranked list of
//!    [`SuggestionItem`]s, in the provider's relevance order.
//! 2. [`ReverseGeocoder`]: a coordinate to a human-readable label.
//!
//! [`nominatim::NominatimClient`] implements both against a Nominatim
//! instance configured in the [`service_registry`].

pub mod nominatim;
pub mod service_registry;

use alertx_geo_models::Coordinate;
use alertx_search_models::SuggestionItem;
use thiserror::Error;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("Geocoder returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The service is missing from the registry or misconfigured.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

/// Resolves free text to candidate places.
#[async_trait::async_trait]
pub trait ForwardGeocoder: Send + Sync {
    /// Looks up `query`, returning at most `limit` suggestions in the
    /// provider's own relevance order.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SuggestionItem>, GeocodeError>;
}

/// Resolves a coordinate to a place label.
#[async_trait::async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Returns the label for `at`, or `None` if the provider has nothing
    /// there.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn reverse(&self, at: Coordinate) -> Result<Option<String>, GeocodeError>;
}
