//! `trackers-store` — persistence for tracker collections.
//!
//! A [`KeyValueStore`] holds one JSON document per tracker; a
//! [`PersistedCollection`] keeps the in-memory mapping and that document in
//! step.

pub mod collection;
pub mod kv;

pub use collection::{CollectionError, Outcome, PersistedCollection};
pub use kv::{FileStore, InMemoryStore, KeyValueStore, StoreError};
