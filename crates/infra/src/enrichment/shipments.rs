use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use trackers_core::TrackerResult;
use trackers_shipping::{Shipment, ShipmentEnrichment, latest_location};

use super::Enricher;
use crate::external::{Geocoder, TrackingSource};

/// Tracking lookup plus a best-effort geocode of the latest location.
#[derive(Clone)]
pub struct ShipmentEnricher {
    tracking: Arc<dyn TrackingSource>,
    geocoder: Option<Arc<dyn Geocoder>>,
}

impl ShipmentEnricher {
    pub fn new(tracking: Arc<dyn TrackingSource>) -> Self {
        Self {
            tracking,
            geocoder: None,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }
}

#[async_trait]
impl Enricher<Shipment> for ShipmentEnricher {
    async fn enrich(&self, shipment: &Shipment, now: DateTime<Utc>) -> TrackerResult<ShipmentEnrichment> {
        let mut enrichment = self
            .tracking
            .track(&shipment.tracking_number, shipment.carrier, now)
            .await?;

        let place = latest_location(&enrichment.events).map(str::to_string);
        if let (Some(geocoder), Some(place)) = (&self.geocoder, place) {
            enrichment.coordinates = match geocoder.geocode(&place).await {
                Ok(point) => point,
                Err(err) => {
                    tracing::warn!(place = %place, error = %err, "geocode failed; keeping shipment without coordinates");
                    None
                }
            };
        }

        Ok(enrichment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use trackers_core::{FetchError, TrackerError};
    use trackers_shipping::{Carrier, GeoPoint, ShipmentStatus};

    use crate::external::SimulatedTracking;

    struct FixedGeocoder(TrackerResult<Option<GeoPoint>>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, _place: &str) -> TrackerResult<Option<GeoPoint>> {
            self.0.clone()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn geocodes_latest_location() {
        let enricher = ShipmentEnricher::new(Arc::new(SimulatedTracking)).with_geocoder(Arc::new(
            FixedGeocoder(Ok(Some(GeoPoint { lat: 1.0, lon: 2.0 }))),
        ));
        let draft = Shipment::draft("abc123d", Carrier::Ups, None, now());

        let enrichment = enricher.enrich(&draft, now()).await.unwrap();
        assert_eq!(enrichment.status, ShipmentStatus::Delivered);
        assert_eq!(enrichment.coordinates, Some(GeoPoint { lat: 1.0, lon: 2.0 }));
    }

    #[tokio::test]
    async fn geocode_failure_is_not_fatal() {
        let enricher = ShipmentEnricher::new(Arc::new(SimulatedTracking)).with_geocoder(Arc::new(
            FixedGeocoder(Err(TrackerError::Fetch(FetchError::network("geocode", "down")))),
        ));
        let draft = Shipment::draft("ZZ1", Carrier::Auto, None, now());

        let enrichment = enricher.enrich(&draft, now()).await.unwrap();
        assert_eq!(enrichment.coordinates, None);
        assert!(!enrichment.events.is_empty());
    }

    /// Carrier that reports checkpoints oldest first.
    struct OldestFirst;

    #[async_trait]
    impl TrackingSource for OldestFirst {
        async fn track(&self, _: &str, _: Carrier, now: DateTime<Utc>) -> TrackerResult<ShipmentEnrichment> {
            let event = |hours: i64, place: &str| trackers_shipping::TrackingEvent {
                timestamp: now - chrono::Duration::hours(hours),
                location: Some(place.to_string()),
                description: String::new(),
            };
            Ok(ShipmentEnrichment {
                status: ShipmentStatus::InTransit,
                events: vec![event(48, "Leipzig"), event(2, "Berlin")],
                estimated_delivery: None,
                coordinates: None,
                fetched_at: now,
            })
        }
    }

    #[derive(Default)]
    struct RecordingGeocoder(std::sync::Mutex<Vec<String>>);

    #[async_trait]
    impl Geocoder for RecordingGeocoder {
        async fn geocode(&self, place: &str) -> TrackerResult<Option<GeoPoint>> {
            self.0.lock().unwrap().push(place.to_string());
            Ok(None)
        }
    }

    #[tokio::test]
    async fn newest_event_is_geocoded_whatever_the_order() {
        let geocoder = Arc::new(RecordingGeocoder::default());
        let enricher = ShipmentEnricher::new(Arc::new(OldestFirst)).with_geocoder(geocoder.clone());
        let draft = Shipment::draft("1Z1", Carrier::Dhl, None, now());

        let enrichment = enricher.enrich(&draft, now()).await.unwrap();
        assert_eq!(enrichment.events[0].location.as_deref(), Some("Leipzig"));
        assert_eq!(*geocoder.0.lock().unwrap(), ["Berlin"]);
    }
}
