//! Entity traits: identity, natural key, lifecycle status, patching.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::TrackerResult;
use crate::id::EntityId;

/// A tracked record owned by a persisted collection.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Kind-specific lifecycle status.
    type Status: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Shallow partial update; unset fields are retained.
    type Patch: Send + core::fmt::Debug;

    /// Key under which the whole collection is stored.
    const STORAGE_KEY: &'static str;

    /// Human readable kind used in messages and logs.
    const KIND: &'static str;

    fn id(&self) -> &EntityId;

    /// User-meaningful secondary key used for duplicate detection.
    fn natural_key(&self) -> String;

    /// Whether `key` names this entity. Kinds with secondary identifiers
    /// (a barcode, say) also answer to those.
    fn matches_key(&self, key: &str) -> bool {
        self.natural_key() == key
    }

    fn status(&self) -> Self::Status;

    fn added_at(&self) -> DateTime<Utc>;

    /// Check required user input before anything is fetched or stored.
    fn validate(&self) -> TrackerResult<()> {
        Ok(())
    }

    fn apply_patch(&mut self, patch: Self::Patch);
}

/// An entity that can absorb remotely fetched supplementary data.
pub trait Enrichable: Entity {
    type Enrichment: Send + core::fmt::Debug;

    fn merge_enrichment(&mut self, enrichment: Self::Enrichment);
}
