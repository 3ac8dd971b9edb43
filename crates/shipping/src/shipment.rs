use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trackers_core::{Enrichable, Entity, EntityId, Projectable, TrackerError, TrackerResult};

/// Shipment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    InTransit,
    OutForDelivery,
    Delivered,
    FailedAttempt,
    Exception,
}

impl ShipmentStatus {
    pub const ALL: [ShipmentStatus; 6] = [
        ShipmentStatus::Pending,
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
        ShipmentStatus::FailedAttempt,
        ShipmentStatus::Exception,
    ];

    /// Map a carrier API status tag onto the internal taxonomy.
    ///
    /// Matching ignores case and separators (`InTransit`, `in_transit`,
    /// `IN-TRANSIT`); unrecognized tags map to `Pending`.
    pub fn from_carrier_tag(tag: &str) -> ShipmentStatus {
        let normalized: String = tag
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "intransit" | "transit" | "availableforpickup" => ShipmentStatus::InTransit,
            "outfordelivery" => ShipmentStatus::OutForDelivery,
            "delivered" => ShipmentStatus::Delivered,
            "attemptfail" | "failedattempt" | "deliveryfailed" => ShipmentStatus::FailedAttempt,
            "exception" | "returned" | "returntosender" => ShipmentStatus::Exception,
            _ => ShipmentStatus::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::OutForDelivery => "out_for_delivery",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::FailedAttempt => "failed_attempt",
            ShipmentStatus::Exception => "exception",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "Pending",
            ShipmentStatus::InTransit => "In Transit",
            ShipmentStatus::OutForDelivery => "Out for Delivery",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::FailedAttempt => "Failed Attempt",
            ShipmentStatus::Exception => "Exception",
        }
    }

    pub fn is_delivered(self) -> bool {
        self == ShipmentStatus::Delivered
    }
}

impl core::str::FromStr for ShipmentStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShipmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| TrackerError::validation(format!("unknown shipment status `{s}`")))
    }
}

/// Carrier handling a shipment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Ups,
    Fedex,
    Usps,
    Dhl,
    /// Let the tracking service detect the carrier.
    #[default]
    Auto,
}

impl Carrier {
    /// Carrier code sent to the tracking API; `None` requests auto-detection.
    pub fn slug(self) -> Option<&'static str> {
        match self {
            Carrier::Ups => Some("ups"),
            Carrier::Fedex => Some("fedex"),
            Carrier::Usps => Some("usps"),
            Carrier::Dhl => Some("dhl"),
            Carrier::Auto => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Carrier::Ups => "UPS",
            Carrier::Fedex => "FedEx",
            Carrier::Usps => "USPS",
            Carrier::Dhl => "DHL",
            Carrier::Auto => "Auto-detect",
        }
    }
}

impl core::str::FromStr for Carrier {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ups" => Ok(Carrier::Ups),
            "fedex" => Ok(Carrier::Fedex),
            "usps" => Ok(Carrier::Usps),
            "dhl" => Ok(Carrier::Dhl),
            "" | "auto" => Ok(Carrier::Auto),
            other => Err(TrackerError::validation(format!("unknown carrier `{other}`"))),
        }
    }
}

/// A timestamped checkpoint reported by the carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub timestamp: DateTime<Utc>,
    pub location: Option<String>,
    pub description: String,
}

/// Coordinates resolved from a location string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// A tracked parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: EntityId,
    pub tracking_number: String,
    pub carrier: Carrier,
    #[serde(default)]
    pub label: Option<String>,
    pub status: ShipmentStatus,
    #[serde(default)]
    pub events: Vec<TrackingEvent>,
    #[serde(default)]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
    pub added_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Shipment {
    /// A not-yet-enriched shipment for the given tracking number.
    pub fn draft(
        tracking_number: &str,
        carrier: Carrier,
        label: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::generate(),
            tracking_number: normalize_tracking_number(tracking_number),
            carrier,
            label: label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
            status: ShipmentStatus::Pending,
            events: Vec::new(),
            estimated_delivery: None,
            coordinates: None,
            added_at: now,
            last_updated: now,
        }
    }

    /// Most recent location reported, if any.
    pub fn latest_location(&self) -> Option<&str> {
        latest_location(&self.events)
    }
}

/// Location of the newest event that has one. Events keep the order the
/// carrier reported them in, which is not necessarily chronological.
pub fn latest_location(events: &[TrackingEvent]) -> Option<&str> {
    events
        .iter()
        .filter(|e| e.location.is_some())
        .max_by_key(|e| e.timestamp)
        .and_then(|e| e.location.as_deref())
}

/// Canonical form used as the shipment's natural key.
pub fn normalize_tracking_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// User edits to a shipment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipmentPatch {
    pub label: Option<String>,
    pub status: Option<ShipmentStatus>,
}

/// Data fetched from the tracking and geocoding services.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentEnrichment {
    pub status: ShipmentStatus,
    pub events: Vec<TrackingEvent>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub coordinates: Option<GeoPoint>,
    pub fetched_at: DateTime<Utc>,
}

impl Entity for Shipment {
    type Status = ShipmentStatus;
    type Patch = ShipmentPatch;

    const STORAGE_KEY: &'static str = "shipments";
    const KIND: &'static str = "shipment";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn natural_key(&self) -> String {
        self.tracking_number.clone()
    }

    fn status(&self) -> ShipmentStatus {
        self.status
    }

    fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    fn validate(&self) -> TrackerResult<()> {
        if self.tracking_number.is_empty() {
            return Err(TrackerError::validation("tracking number is required"));
        }
        Ok(())
    }

    fn apply_patch(&mut self, patch: ShipmentPatch) {
        if let Some(label) = patch.label {
            let label = label.trim().to_string();
            self.label = (!label.is_empty()).then_some(label);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

impl Enrichable for Shipment {
    type Enrichment = ShipmentEnrichment;

    fn merge_enrichment(&mut self, enrichment: ShipmentEnrichment) {
        self.status = enrichment.status;
        self.events = enrichment.events;
        self.estimated_delivery = enrichment.estimated_delivery;
        if enrichment.coordinates.is_some() {
            self.coordinates = enrichment.coordinates;
        }
        self.last_updated = enrichment.fetched_at;
    }
}

/// Status tab filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentFilter {
    /// Everything not yet delivered.
    Active,
    Status(ShipmentStatus),
}

impl Projectable for Shipment {
    type Filter = ShipmentFilter;

    fn matches(&self, filter: &ShipmentFilter) -> bool {
        match filter {
            ShipmentFilter::Active => !self.status.is_delivered(),
            ShipmentFilter::Status(status) => self.status == *status,
        }
    }

    fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.tracking_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn carrier_tags_map_case_insensitively() {
        assert_eq!(ShipmentStatus::from_carrier_tag("InTransit"), ShipmentStatus::InTransit);
        assert_eq!(ShipmentStatus::from_carrier_tag("in_transit"), ShipmentStatus::InTransit);
        assert_eq!(ShipmentStatus::from_carrier_tag("OUT-FOR-DELIVERY"), ShipmentStatus::OutForDelivery);
        assert_eq!(ShipmentStatus::from_carrier_tag("Delivered"), ShipmentStatus::Delivered);
        assert_eq!(ShipmentStatus::from_carrier_tag("AttemptFail"), ShipmentStatus::FailedAttempt);
        assert_eq!(ShipmentStatus::from_carrier_tag("exception"), ShipmentStatus::Exception);
    }

    #[test]
    fn unknown_carrier_tag_defaults_to_pending() {
        assert_eq!(ShipmentStatus::from_carrier_tag("InfoReceived"), ShipmentStatus::Pending);
        assert_eq!(ShipmentStatus::from_carrier_tag("¯\\_(ツ)_/¯"), ShipmentStatus::Pending);
        assert_eq!(ShipmentStatus::from_carrier_tag(""), ShipmentStatus::Pending);
    }

    #[test]
    fn draft_normalizes_tracking_number_and_label() {
        let s = Shipment::draft(" 1z 999 aa1 ", Carrier::Ups, Some("   ".into()), now());
        assert_eq!(s.tracking_number, "1Z999AA1");
        assert_eq!(s.label, None);
        assert_eq!(s.natural_key(), "1Z999AA1");
    }

    #[test]
    fn empty_tracking_number_fails_validation() {
        let s = Shipment::draft("   ", Carrier::Auto, None, now());
        assert!(matches!(s.validate(), Err(TrackerError::Validation(_))));
    }

    #[test]
    fn merge_keeps_previous_coordinates_when_geocode_missing() {
        let mut s = Shipment::draft("ABC", Carrier::Dhl, None, now());
        s.coordinates = Some(GeoPoint { lat: 1.0, lon: 2.0 });

        s.merge_enrichment(ShipmentEnrichment {
            status: ShipmentStatus::InTransit,
            events: vec![TrackingEvent {
                timestamp: now(),
                location: Some("Leipzig, DE".into()),
                description: "Arrived at hub".into(),
            }],
            estimated_delivery: None,
            coordinates: None,
            fetched_at: now(),
        });

        assert_eq!(s.status, ShipmentStatus::InTransit);
        assert_eq!(s.coordinates, Some(GeoPoint { lat: 1.0, lon: 2.0 }));
        assert_eq!(s.latest_location(), Some("Leipzig, DE"));
    }

    #[test]
    fn stored_record_without_optional_fields_loads() {
        let json = r#"{
            "id": "s1",
            "tracking_number": "ABC",
            "carrier": "usps",
            "status": "in_transit",
            "added_at": "2024-03-10T09:00:00Z",
            "last_updated": "2024-03-10T09:00:00Z"
        }"#;
        let s: Shipment = serde_json::from_str(json).unwrap();
        assert!(s.events.is_empty());
        assert_eq!(s.coordinates, None);
        assert_eq!(s.carrier, Carrier::Usps);
    }

    #[test]
    fn filters_by_tab() {
        let mut s = Shipment::draft("A1", Carrier::Auto, None, now());
        s.status = ShipmentStatus::Delivered;
        assert!(!s.matches(&ShipmentFilter::Active));
        assert!(s.matches(&ShipmentFilter::Status(ShipmentStatus::Delivered)));
    }
}
