#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Nearby point-of-interest search.
//!
//! A [`NearbyPoiProvider`] answers one logical request per search: for each
//! requested category, up to `max_per_category` POIs within the radius of
//! the query coordinate, each annotated with its great-circle distance from
//! that coordinate. Results for a category are nearest first, and
//! categories appear in the order they were requested.
//!
//! [`overpass::OverpassClient`] implements the contract against the
//! `OpenStreetMap` Overpass API.

pub mod overpass;
pub mod retry;

use alertx_search_models::{SearchParameters, SearchResult};
use thiserror::Error;

/// Errors from nearby POI providers.
#[derive(Debug, Error)]
pub enum PoiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Provider returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The provider is missing from the registry or misconfigured.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

/// Finds points of interest around a coordinate.
#[async_trait::async_trait]
pub trait NearbyPoiProvider: Send + Sync {
    /// Runs one nearby search.
    ///
    /// An empty result is a valid answer, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PoiError`] if the request fails or the response cannot be
    /// interpreted.
    async fn nearby(&self, params: &SearchParameters) -> Result<Vec<SearchResult>, PoiError>;
}
