//! Compile-time registry of external map service configurations.
//!
//! Each service is defined in a TOML file under `services/`. The registry
//! embeds these at compile time and exposes them via [`all_services`],
//! [`enabled_services`] and [`service`]. Base URLs can be overridden at
//! runtime through environment variables (see [`GeoService::base_url`]).

use serde::Deserialize;

/// Environment variable overriding the Nominatim base URL.
pub const NOMINATIM_URL_ENV: &str = "ALERTX_NOMINATIM_URL";

/// Environment variable overriding the Overpass interpreter URL.
pub const OVERPASS_URL_ENV: &str = "ALERTX_OVERPASS_URL";

/// Environment variable overriding the HTTP `User-Agent`.
pub const USER_AGENT_ENV: &str = "ALERTX_USER_AGENT";

/// Default `User-Agent`. Public OSM services reject anonymous clients.
pub const DEFAULT_USER_AGENT: &str = concat!("alertx/", env!("CARGO_PKG_VERSION"));

/// An external service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoService {
    /// Unique identifier (e.g., `"nominatim"`, `"overpass"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be used.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ordering hint; lower values are listed first.
    pub priority: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Nominatim forward/reverse geocoder.
    Nominatim {
        /// API base URL without the endpoint path.
        base_url: String,
        /// Maximum suggestions requested per forward lookup.
        suggestion_limit: usize,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    /// Overpass API interpreter for nearby POI queries.
    Overpass {
        /// Interpreter endpoint URL.
        base_url: String,
        /// Server-side query timeout placed in the Overpass QL header.
        query_timeout_secs: u64,
        /// Client-side request timeout in seconds.
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_timeout() -> u64 {
    10
}

impl GeoService {
    /// Returns the provider's base URL, preferring the environment override
    /// for this provider type when it is set and non-empty.
    #[must_use]
    pub fn base_url(&self) -> String {
        let (configured, env_key) = match &self.provider {
            ProviderConfig::Nominatim { base_url, .. } => (base_url, NOMINATIM_URL_ENV),
            ProviderConfig::Overpass { base_url, .. } => (base_url, OVERPASS_URL_ENV),
        };
        std::env::var(env_key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| configured.clone())
    }

    /// Client-side request timeout.
    #[must_use]
    pub const fn timeout(&self) -> std::time::Duration {
        let secs = match &self.provider {
            ProviderConfig::Nominatim { timeout_secs, .. }
            | ProviderConfig::Overpass { timeout_secs, .. } => *timeout_secs,
        };
        std::time::Duration::from_secs(secs)
    }
}

/// Returns the `User-Agent` to send to external services.
#[must_use]
pub fn user_agent() -> String {
    std::env::var(USER_AGENT_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] = &[
    ("nominatim", include_str!("../services/nominatim.toml")),
    ("overpass", include_str!("../services/overpass.toml")),
];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 2;

/// Returns all service configurations (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_services() -> Vec<GeoService> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse service config '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled services, sorted by priority (ascending).
#[must_use]
pub fn enabled_services() -> Vec<GeoService> {
    let mut services: Vec<GeoService> = all_services().into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    services
}

/// Looks up an enabled service by id.
#[must_use]
pub fn service(id: &str) -> Option<GeoService> {
    enabled_services().into_iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        let services = all_services();
        assert_eq!(services.len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn service_ids_are_unique() {
        let services = all_services();
        let mut seen = BTreeSet::new();
        for svc in &services {
            assert!(seen.insert(&svc.id), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn all_services_have_required_fields() {
        for svc in &all_services() {
            assert!(!svc.id.is_empty(), "Service has empty id");
            assert!(!svc.name.is_empty(), "Service {} has empty name", svc.id);
            assert!(
                !svc.base_url().is_empty(),
                "Service {} has empty base_url",
                svc.id
            );
        }
    }

    #[test]
    fn nominatim_suggestion_limit_is_six() {
        let svc = service("nominatim").unwrap();
        match svc.provider {
            ProviderConfig::Nominatim {
                suggestion_limit, ..
            } => assert_eq!(suggestion_limit, 6),
            ProviderConfig::Overpass { .. } => panic!("nominatim parsed as overpass"),
        }
    }
}
