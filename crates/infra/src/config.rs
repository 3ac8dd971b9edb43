//! Configuration loading and representation.
//!
//! Everything is read from `TRACKERS_*` environment variables with working
//! defaults, so the trackers run offline (simulated tracking) out of the box.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(700);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value `{value}` for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("could not determine a data directory; set TRACKERS_DATA_DIR")]
    NoDataDir,
}

/// Source of shipment tracking data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    /// Deterministic offline simulation.
    Simulated,
    /// Carrier tracking API.
    Live,
}

/// Base URL and optional key of one remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ApiEndpoint {
    fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackersConfig {
    pub data_dir: PathBuf,
    pub tracking_mode: TrackingMode,
    pub tracking: ApiEndpoint,
    pub geocode: ApiEndpoint,
    pub products: ApiEndpoint,
    pub exchange: ApiEndpoint,
    pub omdb: ApiEndpoint,
    pub tmdb: ApiEndpoint,
    /// Currency shopping prices are entered in.
    pub base_currency: String,
    pub search_debounce: Duration,
    pub http_timeout: Duration,
}

impl TrackersConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to resolve variables (empty values count as unset).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let url = |var: &str, default: &str| get(var).unwrap_or_else(|| default.to_string());

        let data_dir = match get("TRACKERS_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let tracking = ApiEndpoint::new(
            url("TRACKERS_TRACKING_URL", "https://api.aftership.com/tracking/2024-04"),
            get("TRACKERS_TRACKING_API_KEY"),
        );

        let tracking_mode = match get("TRACKERS_TRACKING_MODE").as_deref() {
            None | Some("simulated") | Some("simulate") => TrackingMode::Simulated,
            Some("live") if tracking.api_key.is_none() => {
                tracing::warn!("TRACKERS_TRACKING_MODE=live but TRACKERS_TRACKING_API_KEY not set; using simulated tracking");
                TrackingMode::Simulated
            }
            Some("live") => TrackingMode::Live,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "TRACKERS_TRACKING_MODE",
                    value: other.to_string(),
                    reason: "expected `simulated` or `live`".to_string(),
                });
            }
        };

        let omdb = ApiEndpoint::new(
            url("TRACKERS_OMDB_URL", "https://www.omdbapi.com"),
            get("TRACKERS_OMDB_API_KEY"),
        );
        if omdb.api_key.is_none() {
            tracing::warn!("TRACKERS_OMDB_API_KEY not set; movie search will be rejected by the API");
        }

        let tmdb = ApiEndpoint::new(
            url("TRACKERS_TMDB_URL", "https://api.themoviedb.org/3"),
            get("TRACKERS_TMDB_API_KEY"),
        );
        if tmdb.api_key.is_none() {
            tracing::warn!("TRACKERS_TMDB_API_KEY not set; trending movies are unavailable");
        }

        let base_currency = get("TRACKERS_BASE_CURRENCY")
            .unwrap_or_else(|| "USD".to_string())
            .to_ascii_uppercase();
        if base_currency.len() != 3 || !base_currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid {
                var: "TRACKERS_BASE_CURRENCY",
                value: base_currency,
                reason: "expected a three-letter currency code".to_string(),
            });
        }

        Ok(Self {
            data_dir,
            tracking_mode,
            tracking,
            geocode: ApiEndpoint::new(
                url("TRACKERS_GEOCODE_URL", "https://nominatim.openstreetmap.org"),
                None,
            ),
            products: ApiEndpoint::new(
                url("TRACKERS_PRODUCTS_URL", "https://world.openfoodfacts.org"),
                None,
            ),
            exchange: ApiEndpoint::new(url("TRACKERS_EXCHANGE_URL", "https://open.er-api.com/v6"), None),
            omdb,
            tmdb,
            base_currency,
            search_debounce: number(&get, "TRACKERS_SEARCH_DEBOUNCE_MS")?
                .map_or(DEFAULT_SEARCH_DEBOUNCE, Duration::from_millis),
            http_timeout: number(&get, "TRACKERS_HTTP_TIMEOUT_SECS")?
                .map_or(DEFAULT_HTTP_TIMEOUT, Duration::from_secs),
        })
    }
}

fn number<F>(get: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    get(var)
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|e| ConfigError::Invalid {
                    var,
                    value: raw.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}

/// `{app_data_dir}/trackers`.
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let mut dir = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .ok_or(ConfigError::NoDataDir)?;
    dir.push("trackers");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<TrackersConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TrackersConfig::from_lookup(move |k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_are_usable_offline() {
        let cfg = config(&[("TRACKERS_DATA_DIR", "/tmp/trackers-test")]).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/trackers-test"));
        assert_eq!(cfg.tracking_mode, TrackingMode::Simulated);
        assert_eq!(cfg.search_debounce, Duration::from_millis(700));
        assert_eq!(cfg.http_timeout, Duration::from_secs(10));
        assert_eq!(cfg.base_currency, "USD");
    }

    #[test]
    fn live_mode_requires_a_key() {
        let cfg = config(&[
            ("TRACKERS_DATA_DIR", "/tmp/t"),
            ("TRACKERS_TRACKING_MODE", "live"),
        ])
        .unwrap();
        assert_eq!(cfg.tracking_mode, TrackingMode::Simulated);

        let cfg = config(&[
            ("TRACKERS_DATA_DIR", "/tmp/t"),
            ("TRACKERS_TRACKING_MODE", "live"),
            ("TRACKERS_TRACKING_API_KEY", "secret"),
        ])
        .unwrap();
        assert_eq!(cfg.tracking_mode, TrackingMode::Live);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("TRACKERS_DATA_DIR", "/t"), ("TRACKERS_TRACKING_MODE", "psychic")]),
            Err(ConfigError::Invalid { var: "TRACKERS_TRACKING_MODE", .. })
        ));
        assert!(matches!(
            config(&[("TRACKERS_DATA_DIR", "/t"), ("TRACKERS_SEARCH_DEBOUNCE_MS", "soon")]),
            Err(ConfigError::Invalid { var: "TRACKERS_SEARCH_DEBOUNCE_MS", .. })
        ));
    }

    #[test]
    fn trims_trailing_slashes_and_overrides() {
        let cfg = config(&[
            ("TRACKERS_DATA_DIR", "/t"),
            ("TRACKERS_OMDB_URL", "http://localhost:9000/"),
            ("TRACKERS_SEARCH_DEBOUNCE_MS", "250"),
            ("TRACKERS_HTTP_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(cfg.omdb.base_url, "http://localhost:9000");
        assert_eq!(cfg.search_debounce, Duration::from_millis(250));
        assert_eq!(cfg.http_timeout, Duration::from_secs(3));
    }
}
