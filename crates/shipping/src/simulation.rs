//! Deterministic offline tracking used when no carrier API is configured.
//!
//! The status is a pure function of the tracking number's last character, so
//! repeated lookups of one tracking number always agree.

use chrono::{DateTime, Duration, Utc};

use crate::shipment::{ShipmentEnrichment, ShipmentStatus, TrackingEvent};

/// Stages a simulated shipment moves through, indexed by the hash below.
const PROGRESSION: [ShipmentStatus; 4] = [
    ShipmentStatus::Pending,
    ShipmentStatus::InTransit,
    ShipmentStatus::OutForDelivery,
    ShipmentStatus::Delivered,
];

const HUBS: [&str; 5] = [
    "Louisville, KY",
    "Memphis, TN",
    "Leipzig, DE",
    "Cincinnati, OH",
    "Hong Kong, HK",
];

const CHECKPOINT_SPACING_HOURS: i64 = 18;

/// Index of the last character: letters by alphabet position (A=0),
/// digits by value, anything else by code point.
fn char_index(c: char) -> u32 {
    if c.is_ascii_alphabetic() {
        u32::from(c.to_ascii_uppercase() as u8 - b'A')
    } else if let Some(digit) = c.to_digit(10) {
        digit
    } else {
        u32::from(c)
    }
}

fn stage(tracking_number: &str) -> usize {
    tracking_number
        .trim()
        .chars()
        .last()
        .map_or(0, |c| (char_index(c) % PROGRESSION.len() as u32) as usize)
}

/// Status a simulated lookup reports for `tracking_number`.
pub fn simulated_status(tracking_number: &str) -> ShipmentStatus {
    PROGRESSION[stage(tracking_number)]
}

/// Full simulated lookup: status, checkpoints (newest first) and ETA.
pub fn simulate(tracking_number: &str, now: DateTime<Utc>) -> ShipmentEnrichment {
    let stage = stage(tracking_number);
    let seed: usize = tracking_number.bytes().map(usize::from).sum();
    let origin = HUBS[seed % HUBS.len()];
    let hub = HUBS[(seed + 1) % HUBS.len()];
    let destination = HUBS[(seed + 2) % HUBS.len()];

    let checkpoints = [
        ("Shipment information received", origin),
        ("In transit", hub),
        ("Out for delivery", destination),
        ("Delivered", destination),
    ];

    let events = checkpoints[..=stage]
        .iter()
        .enumerate()
        .rev()
        .map(|(i, (description, location))| TrackingEvent {
            timestamp: now - Duration::hours(CHECKPOINT_SPACING_HOURS * (stage - i) as i64),
            location: Some((*location).to_string()),
            description: (*description).to_string(),
        })
        .collect();

    let status = PROGRESSION[stage];
    let estimated_delivery =
        (!status.is_delivered()).then(|| now + Duration::days((PROGRESSION.len() - 1 - stage) as i64));

    ShipmentEnrichment {
        status,
        events,
        estimated_delivery,
        coordinates: None,
        fetched_at: now,
    }
}
