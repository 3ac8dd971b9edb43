//! Remote enrichment: fetch supplementary data for an entity before it is
//! committed or refreshed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use trackers_core::{Enrichable, TrackerResult};

pub mod movies;
pub mod products;
pub mod shipments;

pub use movies::{MovieEnricher, resolve_movie};
pub use products::ProductEnricher;
pub use shipments::ShipmentEnricher;

/// Fetches the enrichment for one entity.
///
/// Each call is independent; implementations hold no per-entity state.
#[async_trait]
pub trait Enricher<E: Enrichable>: Send + Sync {
    async fn enrich(&self, entity: &E, now: DateTime<Utc>) -> TrackerResult<E::Enrichment>;
}
