//! Shipping tracker domain.
//!
//! Pure domain logic for tracked parcels (no IO, no HTTP, no storage).

pub mod shipment;
pub mod simulation;
pub mod stats;

pub use shipment::{
    Carrier, GeoPoint, Shipment, ShipmentEnrichment, ShipmentFilter, ShipmentPatch,
    ShipmentStatus, TrackingEvent, latest_location, normalize_tracking_number,
};
pub use simulation::{simulate, simulated_status};
pub use stats::{PROGRESS_STEPS, ShipmentStats, progress_step};
