//! Infrastructure layer: config, external services, enrichment and the
//! tracker orchestrator.

pub mod config;
pub mod debounce;
pub mod enrichment;
pub mod external;
pub mod notify;
pub mod search;
pub mod tracker;

pub use config::{ApiEndpoint, ConfigError, TrackersConfig, TrackingMode};
pub use debounce::Debouncer;
pub use enrichment::{Enricher, MovieEnricher, ProductEnricher, ShipmentEnricher};
pub use notify::{LogNotifier, Notification, Notifier, RecordingNotifier, Severity};
pub use search::{ProductSearch, SearchState};
pub use tracker::{RefreshOutcome, ShipmentTracker, ShoppingTracker, Tracker, WatchlistTracker};
