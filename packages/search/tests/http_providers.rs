//! A live map session driven by the real Nominatim and Overpass clients.
//!
//! Uses `wiremock` to stand up local HTTP servers so no real network
//! traffic is made.

use std::sync::Arc;
use std::time::Duration;

use alertx_category_models::CategoryKey;
use alertx_geocoder::nominatim::NominatimClient;
use alertx_poi::overpass::OverpassClient;
use alertx_poi::retry::RetryPolicy;
use alertx_search::{InMemoryMap, LiveMapConfig, LiveMapSession, SearchState, SessionProviders};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config() -> LiveMapConfig {
    let mut cfg = LiveMapConfig::embedded();
    cfg.suggest.debounce_ms = 20;
    cfg
}

fn session(nominatim: &MockServer, overpass: &MockServer) -> LiveMapSession<InMemoryMap> {
    let geocoder = Arc::new(NominatimClient::new(reqwest::Client::new(), nominatim.uri(), 6));
    let pois = OverpassClient::new(reqwest::Client::new(), format!("{}/api/interpreter", overpass.uri()), 25)
        .with_retry(RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(5),
        });

    LiveMapSession::mount(
        InMemoryMap::new(),
        SessionProviders {
            forward: geocoder.clone(),
            reverse: geocoder,
            nearby: Arc::new(pois),
            position: None,
        },
        &config(),
    )
    .expect("session mounts")
}

async fn wait_for_suggestions(s: &LiveMapSession<InMemoryMap>) {
    let mut rx = s.subscribe_suggestions();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|items| !items.is_empty()))
        .await
        .expect("suggestions within 5s")
        .expect("suggest channel open");
}

#[tokio::test]
async fn search_place_then_nearby_police() {
    let nominatim = MockServer::start().await;
    let overpass = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Chennai"))
        .and(query_param("format", "jsonv2"))
        .and(query_param("limit", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"display_name": "Chennai, Tamil Nadu, India", "lat": "13.0836939", "lon": "80.270186"},
            {"display_name": "Chennai Central", "lat": "13.0825", "lon": "80.2753"}
        ])))
        .expect(1)
        .mount(&nominatim)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .and(body_string_contains("amenity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [
                {"type": "node", "id": 1, "lat": 13.0790, "lon": 80.2620,
                 "tags": {"amenity": "police", "name": "Egmore Police Station"}},
                {"type": "way", "id": 2, "center": {"lat": 13.0600, "lon": 80.2500},
                 "tags": {"amenity": "police"}},
                {"type": "node", "id": 3, "lat": 13.0837, "lon": 80.2702,
                 "tags": {"amenity": "fire_station", "name": "Central Fire Station"}}
            ]
        })))
        .expect(1)
        .mount(&overpass)
        .await;

    let mut s = session(&nominatim, &overpass);
    s.on_place_input("Chennai");
    wait_for_suggestions(&s).await;

    assert_eq!(s.suggestions().len(), 2);
    s.select_suggestion(0).expect("first suggestion");
    s.toggle_category(CategoryKey::Police);

    let count = s.search().await.expect("search succeeds");

    assert_eq!(count, 2);
    let results = s.results();
    assert_eq!(results[0].name, "Egmore Police Station");
    assert_eq!(results[1].name, "Unnamed");
    assert!(results[0].distance_km <= results[1].distance_km);
    assert!(matches!(s.search_state(), SearchState::Completed { .. }));
}

#[tokio::test]
async fn geocoder_outage_leaves_suggestions_empty() {
    let nominatim = MockServer::start().await;
    let overpass = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&nominatim)
        .await;

    let mut s = session(&nominatim, &overpass);
    s.on_place_input("Chennai");
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(s.suggestions().is_empty());
}

#[tokio::test]
async fn overpass_rejection_fails_the_search() {
    let nominatim = MockServer::start().await;
    let overpass = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(400).set_body_string("parse error"))
        .expect(1)
        .mount(&overpass)
        .await;

    let mut s = session(&nominatim, &overpass);
    s.set_coordinate(13.08, 80.27).expect("valid coordinate");
    s.toggle_category(CategoryKey::FireStation);

    assert!(s.search().await.is_err());
    assert!(matches!(s.search_state(), SearchState::Failed { .. }));
    assert!(s.results().is_empty());
    assert!(!s.is_loading());
}
