//! Nominatim / OpenStreetMap geocoder client.
//!
//! Forward lookups use the free-form `/search` endpoint and reverse lookups
//! use `/reverse`, both with `format=jsonv2`. Nominatim encodes latitude and
//! longitude as JSON strings.
//!
//! The public instance allows roughly one request per second; the debounce
//! in front of forward lookups keeps interactive use well under that.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use alertx_geo_models::Coordinate;
use alertx_search_models::SuggestionItem;

use crate::service_registry::{self, GeoService, ProviderConfig};
use crate::{ForwardGeocoder, GeocodeError, ReverseGeocoder};

/// HTTP client for a Nominatim instance.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    suggestion_limit: usize,
}

impl NominatimClient {
    /// Creates a client for `base_url` (without the endpoint path).
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, suggestion_limit: usize) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            suggestion_limit,
        }
    }

    /// Creates a client from the `nominatim` entry of the service registry.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the service is missing or
    /// disabled, or [`GeocodeError::Http`] if the HTTP client cannot be
    /// built.
    pub fn from_registry() -> Result<Self, GeocodeError> {
        let svc = service_registry::service("nominatim").ok_or_else(|| GeocodeError::Config {
            message: "nominatim service is not configured or disabled".to_string(),
        })?;
        Self::from_service(&svc)
    }

    /// Creates a client from a service definition.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if `svc` is not a Nominatim service,
    /// or [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn from_service(svc: &GeoService) -> Result<Self, GeocodeError> {
        let ProviderConfig::Nominatim {
            suggestion_limit, ..
        } = &svc.provider
        else {
            return Err(GeocodeError::Config {
                message: format!("service '{}' is not a nominatim provider", svc.id),
            });
        };

        let client = reqwest::Client::builder()
            .user_agent(service_registry::user_agent())
            .timeout(svc.timeout())
            .build()?;

        Ok(Self::new(client, svc.base_url(), *suggestion_limit))
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<serde_json::Value, GeocodeError> {
        let url = format!("{}/{path}", self.base_url);
        let resp = self.client.get(&url).query(query).send().await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(GeocodeError::Status {
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait::async_trait]
impl ForwardGeocoder for NominatimClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SuggestionItem>, GeocodeError> {
        let limit = limit.min(self.suggestion_limit);
        let limit_param = limit.to_string();
        log::debug!("Nominatim search q={query:?} limit={limit}");

        let body = self
            .get_json(
                "search",
                &[("format", "jsonv2"), ("q", query), ("limit", limit_param.as_str())],
            )
            .await?;

        let mut items = parse_search_response(&body)?;
        items.truncate(limit);
        Ok(items)
    }
}

#[async_trait::async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, at: Coordinate) -> Result<Option<String>, GeocodeError> {
        let lat = at.latitude().to_string();
        let lon = at.longitude().to_string();

        let body = self
            .get_json(
                "reverse",
                &[("format", "jsonv2"), ("lat", lat.as_str()), ("lon", lon.as_str())],
            )
            .await?;

        parse_reverse_response(&body)
    }
}

/// Parses a Nominatim `/search` response.
///
/// Entries with missing or out-of-range coordinates are skipped; the rest
/// keep their original order.
fn parse_search_response(body: &serde_json::Value) -> Result<Vec<SuggestionItem>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    Ok(results
        .iter()
        .filter_map(|item| {
            let label = item["display_name"].as_str()?;
            let Some(coordinate) = Coordinate::parse(item["lat"].as_str()?, item["lon"].as_str()?)
            else {
                log::debug!("Skipping Nominatim result with bad coordinates: {label}");
                return None;
            };
            Some(SuggestionItem {
                display_label: label.to_string(),
                coordinate,
            })
        })
        .collect())
}

/// Parses a Nominatim `/reverse` response.
///
/// Nominatim reports "nothing here" as `{"error": "..."}` with status 200.
fn parse_reverse_response(body: &serde_json::Value) -> Result<Option<String>, GeocodeError> {
    if !body.is_object() {
        return Err(GeocodeError::Parse {
            message: "Nominatim reverse response is not an object".to_string(),
        });
    }
    if let Some(err) = body["error"].as_str() {
        log::debug!("Nominatim reverse returned no match: {err}");
        return Ok(None);
    }
    Ok(body["display_name"]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(String::from))
}
