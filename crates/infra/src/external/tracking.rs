//! Shipment tracking sources: the carrier API and the offline simulation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use trackers_core::{TrackerError, TrackerResult};
use trackers_shipping::{Carrier, ShipmentEnrichment, ShipmentStatus, TrackingEvent, simulate};

use super::{HttpClient, TrackingSource};
use crate::config::ApiEndpoint;

const OPERATION: &str = "tracking lookup";

/// Deterministic tracking with no network access.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedTracking;

#[async_trait]
impl TrackingSource for SimulatedTracking {
    async fn track(
        &self,
        tracking_number: &str,
        _carrier: Carrier,
        now: DateTime<Utc>,
    ) -> TrackerResult<ShipmentEnrichment> {
        Ok(simulate(tracking_number, now))
    }
}

/// AfterShip-style tracking API.
#[derive(Debug, Clone)]
pub struct LiveTracking {
    http: HttpClient,
    endpoint: ApiEndpoint,
}

impl LiveTracking {
    pub fn new(http: HttpClient, endpoint: ApiEndpoint) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl TrackingSource for LiveTracking {
    async fn track(
        &self,
        tracking_number: &str,
        carrier: Carrier,
        now: DateTime<Utc>,
    ) -> TrackerResult<ShipmentEnrichment> {
        let params: Vec<(&str, &str)> = carrier.slug().map(|s| ("slug", s)).into_iter().collect();
        let url = HttpClient::url(
            OPERATION,
            &self.endpoint.base_url,
            &format!("trackings/{tracking_number}"),
            &params,
        )?;
        let key = self.endpoint.api_key.as_deref().unwrap_or_default();

        let body: Option<Envelope> = self
            .http
            .get_json_or_not_found(OPERATION, url, &[("as-api-key", key)])
            .await?;
        let body = body.ok_or_else(|| {
            TrackerError::not_found(format!("no tracking information for {tracking_number}"))
        })?;

        Ok(body.data.tracking.into_enrichment(now))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Data,
}

#[derive(Debug, Deserialize)]
struct Data {
    tracking: RemoteTracking,
}

#[derive(Debug, Deserialize)]
struct RemoteTracking {
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    expected_delivery: Option<String>,
    #[serde(default)]
    checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Deserialize)]
struct Checkpoint {
    checkpoint_time: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl Checkpoint {
    fn place(&self) -> Option<String> {
        let present = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        present(&self.location).or_else(|| {
            let parts: Vec<String> = [present(&self.city), present(&self.country_name)]
                .into_iter()
                .flatten()
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        })
    }
}

impl RemoteTracking {
    fn into_enrichment(self, now: DateTime<Utc>) -> ShipmentEnrichment {
        let status = self
            .tag
            .as_deref()
            .map_or(ShipmentStatus::Pending, ShipmentStatus::from_carrier_tag);

        // Provider order is kept as is.
        let events = self
            .checkpoints
            .iter()
            .filter_map(|cp| {
                let Some(timestamp) = parse_time(&cp.checkpoint_time) else {
                    tracing::warn!(
                        checkpoint_time = %cp.checkpoint_time,
                        "skipping checkpoint with unparsable time"
                    );
                    return None;
                };
                Some(TrackingEvent {
                    timestamp,
                    location: cp.place(),
                    description: cp.message.clone().unwrap_or_default(),
                })
            })
            .collect();

        ShipmentEnrichment {
            status,
            events,
            estimated_delivery: self.expected_delivery.as_deref().and_then(parse_time),
            coordinates: None,
            fetched_at: now,
        }
    }
}

/// RFC 3339 timestamp, or a bare date taken as midnight UTC.
fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
