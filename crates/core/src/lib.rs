//! `trackers-core` — building blocks shared by every tracker.
//!
//! This crate is **pure**: identifiers, the entity traits, the error taxonomy
//! and the view projection engine. Storage and network concerns live in
//! `trackers-store` and `trackers-infra`.

pub mod entity;
pub mod error;
pub mod id;
pub mod projection;

pub use entity::{Enrichable, Entity};
pub use error::{FetchError, PersistenceError, TrackerError, TrackerResult};
pub use id::EntityId;
pub use projection::{Priority, Projectable, SortKey, collate, project};
