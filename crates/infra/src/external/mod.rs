//! Outbound HTTP clients for the third-party APIs the trackers enrich from.
//!
//! Each remote concern sits behind an `async_trait` so enrichers can be
//! tested against in-process fakes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use trackers_core::{FetchError, TrackerResult};
use trackers_movies::{MovieDetail, MovieSummary};
use trackers_shipping::{Carrier, GeoPoint, ShipmentEnrichment};
use trackers_shopping::{ExchangeRates, ProductInfo};

pub mod exchange;
pub mod geocode;
pub mod movies;
pub mod products;
pub mod tracking;

pub use exchange::ExchangeRateClient;
pub use geocode::NominatimGeocoder;
pub use movies::{OmdbClient, TmdbClient};
pub use products::OpenFoodFactsClient;
pub use tracking::{LiveTracking, SimulatedTracking};

/// Shipment status lookup.
#[async_trait]
pub trait TrackingSource: Send + Sync {
    async fn track(
        &self,
        tracking_number: &str,
        carrier: Carrier,
        now: DateTime<Utc>,
    ) -> TrackerResult<ShipmentEnrichment>;
}

/// Free-text location to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the place is unknown.
    async fn geocode(&self, place: &str) -> TrackerResult<Option<GeoPoint>>;
}

/// Product metadata catalogue.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn by_barcode(&self, barcode: &str) -> TrackerResult<Option<ProductInfo>>;

    async fn search(&self, text: &str) -> TrackerResult<Vec<ProductInfo>>;
}

/// Currency exchange rates.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn latest(&self, base: &str) -> TrackerResult<ExchangeRates>;
}

/// Title search and detail catalogue.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn search(&self, title: &str) -> TrackerResult<Vec<MovieSummary>>;

    async fn detail(&self, id: &str, now: DateTime<Utc>) -> TrackerResult<MovieDetail>;
}

/// Trending listings and their details.
#[async_trait]
pub trait TrendingCatalog: Send + Sync {
    async fn trending(&self) -> TrackerResult<Vec<MovieSummary>>;

    async fn detail(&self, id: u64, now: DateTime<Utc>) -> TrackerResult<MovieDetail>;
}

/// Shared JSON-over-HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("trackers/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::network("build http client", e.to_string()))?;
        Ok(Self { inner })
    }

    /// Build `base` + `path` with query parameters.
    pub fn url(
        operation: &str,
        base: &str,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Url, FetchError> {
        let raw = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
        Url::parse_with_params(&raw, params)
            .map_err(|e| FetchError::network(operation, format!("bad url {raw}: {e}")))
    }

    /// GET and decode a JSON body; any non-success status is an error.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: Url,
        headers: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        match self.get_json_or_not_found(operation, url, headers).await? {
            Some(body) => Ok(body),
            None => Err(FetchError::status(
                operation,
                StatusCode::NOT_FOUND.as_u16(),
                "not found",
            )),
        }
    }

    /// GET and decode a JSON body; `404` yields `Ok(None)`.
    pub async fn get_json_or_not_found<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: Url,
        headers: &[(&str, &str)],
    ) -> Result<Option<T>, FetchError> {
        tracing::debug!(operation, url = %redact(&url), "GET");

        let mut req = self.inner.get(url);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| FetchError::network(operation, e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::status(operation, status.as_u16(), truncate(&body)));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::network(operation, e.to_string()))?;
        decode(operation, &bytes).map(Some)
    }
}

/// Decode a JSON body, reporting failures against `operation`.
pub fn decode<T: DeserializeOwned>(operation: &str, body: &[u8]) -> Result<T, FetchError> {
    serde_json::from_slice(body).map_err(|e| FetchError::parse(operation, e.to_string()))
}

/// Some APIs spell "absent" as `"N/A"` or an empty string.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "N/A")
}

fn truncate(body: &str) -> String {
    const LIMIT: usize = 200;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k.contains("key") { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    if !pairs.is_empty() {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_and_encodes() {
        let url = HttpClient::url(
            "search",
            "https://example.test/api/",
            "/search",
            &[("q", "Rue de Rivoli, Paris"), ("limit", "1")],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/api/search?q=Rue+de+Rivoli%2C+Paris&limit=1"
        );
    }

    #[test]
    fn api_keys_are_redacted_in_logs() {
        let url = Url::parse("https://x.test/?s=matrix&apikey=secret").unwrap();
        let shown = redact(&url);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("s=matrix"));
    }

    #[test]
    fn decode_failure_is_a_parse_error() {
        let err = decode::<serde_json::Value>("lookup", b"<html>").unwrap_err();
        assert_eq!(err.operation, "lookup");
        assert!(err.message.starts_with("invalid response"));
    }

    #[test]
    fn placeholder_values_are_absent() {
        assert_eq!(present(Some("N/A".into())), None);
        assert_eq!(present(Some(" ".into())), None);
        assert_eq!(present(Some("1999".into())), Some("1999".into()));
        assert_eq!(present(None), None);
    }
}
