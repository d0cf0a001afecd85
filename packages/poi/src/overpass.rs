//! Overpass API nearby-POI provider.
//!
//! Builds a single Overpass QL query covering every requested category,
//! then classifies the returned elements back into categories on the
//! client. Ways and relations are placed at their center (`out center`).
//!
//! Overpass `around:` filters on the element geometry, which for large
//! ways can reach further than the radius while the center is outside it,
//! so distances are recomputed from the center and anything beyond the
//! radius is dropped.
//!
//! See <https://wiki.openstreetmap.org/wiki/Overpass_API/Overpass_QL>

use std::collections::{BTreeMap, BTreeSet};

use alertx_category_models::CategoryKey;
use alertx_geo_models::Coordinate;
use alertx_geocoder::service_registry::{self, GeoService, ProviderConfig};
use alertx_search_models::{SearchParameters, SearchResult};
use serde::Deserialize;

use crate::retry::{self, RetryPolicy};
use crate::{NearbyPoiProvider, PoiError};

/// Name given to elements without a `name` tag.
pub const UNNAMED: &str = "Unnamed";

/// HTTP client for an Overpass interpreter.
#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: reqwest::Client,
    url: String,
    query_timeout_secs: u64,
    retry: RetryPolicy,
}

impl OverpassClient {
    /// Creates a client for the interpreter at `url`.
    #[must_use]
    pub fn new(client: reqwest::Client, url: impl Into<String>, query_timeout_secs: u64) -> Self {
        Self {
            client,
            url: url.into(),
            query_timeout_secs,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Creates a client from the `overpass` entry of the service registry.
    ///
    /// # Errors
    ///
    /// Returns [`PoiError::Config`] if the service is missing, disabled or
    /// not an Overpass provider, or [`PoiError::Http`] if the HTTP client
    /// cannot be built.
    pub fn from_registry() -> Result<Self, PoiError> {
        let svc = service_registry::service("overpass").ok_or_else(|| PoiError::Config {
            message: "overpass service is not configured or disabled".to_string(),
        })?;
        Self::from_service(&svc)
    }

    /// Creates a client from a service definition.
    ///
    /// # Errors
    ///
    /// See [`Self::from_registry`].
    pub fn from_service(svc: &GeoService) -> Result<Self, PoiError> {
        let ProviderConfig::Overpass {
            query_timeout_secs, ..
        } = &svc.provider
        else {
            return Err(PoiError::Config {
                message: format!("service '{}' is not an overpass provider", svc.id),
            });
        };

        let client = reqwest::Client::builder()
            .user_agent(service_registry::user_agent())
            .timeout(svc.timeout())
            .build()?;

        Ok(Self::new(client, svc.base_url(), *query_timeout_secs))
    }
}

#[async_trait::async_trait]
impl NearbyPoiProvider for OverpassClient {
    async fn nearby(&self, params: &SearchParameters) -> Result<Vec<SearchResult>, PoiError> {
        if params.categories().is_empty() {
            return Ok(Vec::new());
        }

        let query = build_query(params, self.query_timeout_secs);
        log::debug!("Overpass query:\n{query}");

        let body = retry::send_json(
            || self.client.post(&self.url).form(&[("data", query.as_str())]),
            self.retry,
        )
        .await?;

        let response: OverpassResponse =
            serde_json::from_value(body).map_err(|e| PoiError::Parse {
                message: format!("unexpected Overpass response shape: {e}"),
            })?;

        if let Some(remark) = &response.remark {
            log::warn!("Overpass remark: {remark}");
        }

        let results = collect_results(params, &response.elements);
        log::info!(
            "Overpass returned {} elements, {} results kept",
            response.elements.len(),
            results.len()
        );
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
    remark: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<LatLon>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    fn coordinate(&self) -> Option<Coordinate> {
        let (lat, lon) = match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => (lat, lon),
            (_, _, Some(c)) => (c.lat, c.lon),
            _ => return None,
        };
        Coordinate::new(lat, lon).ok()
    }

    fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Builds the Overpass QL query for `params`.
fn build_query(params: &SearchParameters, timeout_secs: u64) -> String {
    let c = params.coordinate();
    let around = format!(
        "(around:{},{},{})",
        params.radius().meters(),
        c.latitude(),
        c.longitude()
    );

    let mut clauses = BTreeSet::new();
    for category in params.categories() {
        for f in category.osm_filters() {
            let mut clause = format!("  nwr[\"{}\"=\"{}\"]", f.key, f.value);
            if let Some((k, v)) = f.refine {
                clause.push_str(&format!("[\"{k}\"=\"{v}\"]"));
            }
            clause.push_str(&around);
            clause.push(';');
            clauses.insert(clause);
        }
    }

    let mut query = format!("[out:json][timeout:{timeout_secs}];\n(\n");
    for clause in clauses {
        query.push_str(&clause);
        query.push('\n');
    }
    query.push_str(");\nout center tags;\n");
    query
}

/// Classifies, measures, filters and caps the returned elements.
///
/// An element belongs to at most one category. Categories with a refined
/// filter (e.g. government hospitals, metro stations) are tried before
/// broader ones so they are not swallowed by them.
fn collect_results(params: &SearchParameters, elements: &[OverpassElement]) -> Vec<SearchResult> {
    let origin = params.coordinate();
    let radius_km = f64::from(params.radius().meters()) / 1000.0;

    let mut match_order: Vec<CategoryKey> = params.categories().to_vec();
    match_order.sort_by_key(|c| !c.osm_filters().iter().any(|f| f.refine.is_some()));

    let mut seen = BTreeSet::new();
    let mut by_category: BTreeMap<CategoryKey, Vec<SearchResult>> = BTreeMap::new();

    for el in elements {
        if !seen.insert((el.kind.as_str(), el.id)) {
            continue;
        }
        let Some(category) = match_order
            .iter()
            .copied()
            .find(|c| c.matches_tags(|k| el.tag(k)))
        else {
            continue;
        };
        let Some(coordinate) = el.coordinate() else {
            log::debug!("Skipping {} {} without coordinates", el.kind, el.id);
            continue;
        };

        let distance_km = origin.distance_km(&coordinate);
        if distance_km > radius_km {
            continue;
        }

        let name = el.tag("name").unwrap_or(UNNAMED);
        by_category
            .entry(category)
            .or_default()
            .push(SearchResult::new(name, category, coordinate, distance_km));
    }

    let cap = usize::from(params.max_per_category());
    params
        .categories()
        .iter()
        .filter_map(|c| by_category.remove(c))
        .flat_map(|mut results| {
            results.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
            results.truncate(cap);
            results
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertx_search_models::SearchRadius;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params(categories: Vec<CategoryKey>, max: u32) -> SearchParameters {
        SearchParameters::new(
            Coordinate::new(13.0827, 80.2707).unwrap(),
            SearchRadius::Km10,
            categories,
            max,
        )
        .unwrap()
    }

    fn elements(json: serde_json::Value) -> Vec<OverpassElement> {
        serde_json::from_value::<OverpassResponse>(json)
            .unwrap()
            .elements
    }

    #[test]
    fn query_contains_one_clause_per_filter() {
        let q = build_query(
            &params(vec![CategoryKey::Police, CategoryKey::GovtHospital], 5),
            25,
        );
        assert!(q.starts_with("[out:json][timeout:25];"));
        assert!(q.contains("nwr[\"amenity\"=\"police\"](around:10000,13.0827,80.2707);"));
        assert!(q.contains("nwr[\"amenity\"=\"hospital\"][\"operator:type\"=\"government\"]"));
        assert!(q.trim_end().ends_with("out center tags;"));
    }

    #[test]
    fn caps_each_category_and_sorts_by_distance() {
        let els = elements(serde_json::json!({"elements": [
            {"type": "node", "id": 1, "lat": 13.10, "lon": 80.27, "tags": {"amenity": "police", "name": "Far"}},
            {"type": "node", "id": 2, "lat": 13.083, "lon": 80.271, "tags": {"amenity": "police", "name": "Near"}},
            {"type": "node", "id": 3, "lat": 13.09, "lon": 80.27, "tags": {"amenity": "police", "name": "Mid"}},
            {"type": "way", "id": 4, "center": {"lat": 13.085, "lon": 80.275}, "tags": {"amenity": "fire_station"}}
        ]}));

        let p = params(vec![CategoryKey::FireStation, CategoryKey::Police], 2);
        let results = collect_results(&p, &els);

        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![UNNAMED, "Near", "Mid"]);
        assert_eq!(results[0].category_key, CategoryKey::FireStation);
        assert!(results.iter().all(|r| r.distance_km >= 0.0));
    }

    #[test]
    fn drops_elements_beyond_radius_and_unmatched() {
        let els = elements(serde_json::json!({"elements": [
            {"type": "node", "id": 1, "lat": 13.5, "lon": 80.27, "tags": {"amenity": "police"}},
            {"type": "node", "id": 2, "lat": 13.083, "lon": 80.271, "tags": {"amenity": "cafe"}},
            {"type": "relation", "id": 3, "tags": {"amenity": "police"}}
        ]}));
        let results = collect_results(&params(vec![CategoryKey::Police], 5), &els);
        assert!(results.is_empty());
    }

    #[test]
    fn refined_category_wins_over_broad_one() {
        let els = elements(serde_json::json!({"elements": [
            {"type": "node", "id": 1, "lat": 13.083, "lon": 80.271,
             "tags": {"amenity": "hospital", "operator:type": "government", "name": "GH"}},
            {"type": "node", "id": 2, "lat": 13.084, "lon": 80.271,
             "tags": {"amenity": "hospital", "name": "Apollo"}}
        ]}));
        let p = params(vec![CategoryKey::GeneralHospital, CategoryKey::GovtHospital], 5);
        let results = collect_results(&p, &els);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Apollo");
        assert_eq!(results[0].category_key, CategoryKey::GeneralHospital);
        assert_eq!(results[1].name, "GH");
        assert_eq!(results[1].category_key, CategoryKey::GovtHospital);
    }

    #[tokio::test]
    async fn nearby_posts_query_and_parses_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("data="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "elements": [
                    {"type": "node", "id": 7, "lat": 13.0830, "lon": 80.2710,
                     "tags": {"amenity": "police", "name": "Egmore Police Station"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OverpassClient::new(reqwest::Client::new(), server.uri(), 25);
        let results = client
            .nearby(&params(vec![CategoryKey::Police], 5))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Egmore Police Station");
        assert_eq!(results[0].category_display_name, "Police Stations");
    }
}
