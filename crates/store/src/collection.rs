//! Persisted keyed collection: the in-memory mapping and its stored copy.

use indexmap::IndexMap;
use thiserror::Error;

use trackers_core::{Entity, EntityId, PersistenceError, TrackerError};

use crate::kv::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// Caller logic error: the internal ID is already present.
    #[error("entity {0} already exists")]
    DuplicateId(EntityId),

    #[error("entity {0} not found")]
    NotFound(EntityId),

    /// Encoding failed; memory is unchanged.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<CollectionError> for TrackerError {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::DuplicateId(id) => TrackerError::duplicate(id.into_inner()),
            CollectionError::NotFound(id) => TrackerError::not_found(id.into_inner()),
            CollectionError::Persistence(e) => TrackerError::Persistence(e),
        }
    }
}

/// Result of a mutation that was applied in memory.
///
/// `warning` is set when the write to storage failed: the new state is kept
/// for the running session but is not durable.
#[derive(Debug)]
#[must_use = "a persistence warning must be surfaced to the caller"]
pub struct Outcome<T> {
    value: T,
    warning: Option<PersistenceError>,
}

impl<T> Outcome<T> {
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn warning(&self) -> Option<&PersistenceError> {
        self.warning.as_ref()
    }

    pub fn is_durable(&self) -> bool {
        self.warning.is_none()
    }

    pub fn into_parts(self) -> (T, Option<PersistenceError>) {
        (self.value, self.warning)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warning: self.warning,
        }
    }
}

/// Mapping from entity ID to entity, mirrored to one key of a [`KeyValueStore`].
///
/// Every mutation writes the whole collection before returning. Iteration
/// follows insertion order.
#[derive(Debug)]
pub struct PersistedCollection<E: Entity, S: KeyValueStore> {
    store: S,
    items: IndexMap<EntityId, E>,
    dirty: bool,
}

impl<E: Entity, S: KeyValueStore> PersistedCollection<E, S> {
    /// Read the collection stored under `E::STORAGE_KEY`.
    ///
    /// Missing or unreadable data yields an empty collection; this never fails.
    pub fn load(store: S) -> Self {
        let items = match store.get(E::STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<IndexMap<EntityId, E>>(&raw) {
                Ok(items) => items,
                Err(err) => {
                    tracing::warn!(
                        key = E::STORAGE_KEY,
                        error = %err,
                        "stored collection is unreadable; starting empty"
                    );
                    IndexMap::new()
                }
            },
            Ok(None) => IndexMap::new(),
            Err(err) => {
                tracing::warn!(key = E::STORAGE_KEY, error = %err, "failed to read stored collection");
                IndexMap::new()
            }
        };

        tracing::debug!(key = E::STORAGE_KEY, count = items.len(), "collection loaded");

        Self {
            store,
            items,
            dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &EntityId) -> Option<&E> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.items.contains_key(id)
    }

    /// Entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.items.values()
    }

    /// First entity that answers to `key`.
    pub fn find_by_natural_key(&self, key: &str) -> Option<&E> {
        self.items.values().find(|e| e.matches_key(key))
    }

    /// True if the last write failed and memory is ahead of storage.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn add(&mut self, entity: E) -> Result<Outcome<()>, CollectionError> {
        let id = entity.id().clone();
        if self.items.contains_key(&id) {
            return Err(CollectionError::DuplicateId(id));
        }

        self.items.insert(id.clone(), entity);
        let payload = match self.encode() {
            Ok(payload) => payload,
            Err(err) => {
                self.items.shift_remove(&id);
                return Err(err.into());
            }
        };

        Ok(self.write(payload, ()))
    }

    /// Shallow-merge `patch` into the entity and persist.
    pub fn update(&mut self, id: &EntityId, patch: E::Patch) -> Result<Outcome<()>, CollectionError> {
        self.modify(id, |entity| entity.apply_patch(patch))
    }

    /// Apply an arbitrary in-place mutation to one entity and persist.
    pub fn modify<F>(&mut self, id: &EntityId, f: F) -> Result<Outcome<()>, CollectionError>
    where
        F: FnOnce(&mut E),
    {
        let Some(entity) = self.items.get_mut(id) else {
            return Err(CollectionError::NotFound(id.clone()));
        };
        let previous = entity.clone();
        f(entity);

        let payload = match self.encode() {
            Ok(payload) => payload,
            Err(err) => {
                if let Some(slot) = self.items.get_mut(id) {
                    *slot = previous;
                }
                return Err(err.into());
            }
        };

        Ok(self.write(payload, ()))
    }

    /// Delete and return the entity; `None` if it was not present.
    pub fn remove(&mut self, id: &EntityId) -> Result<Outcome<Option<E>>, CollectionError> {
        let Some((index, key, entity)) = self.items.shift_remove_full(id) else {
            return Ok(Outcome {
                value: None,
                warning: None,
            });
        };

        let payload = match self.encode() {
            Ok(payload) => payload,
            Err(err) => {
                self.items.shift_insert(index, key, entity);
                return Err(err.into());
            }
        };

        Ok(self.write(payload, Some(entity)))
    }

    /// Remove everything; returns how many entities were dropped.
    pub fn clear(&mut self) -> Result<Outcome<usize>, CollectionError> {
        let previous = std::mem::take(&mut self.items);
        let payload = match self.encode() {
            Ok(payload) => payload,
            Err(err) => {
                self.items = previous;
                return Err(err.into());
            }
        };

        Ok(self.write(payload, previous.len()))
    }

    /// Retry writing the current state after an earlier write failure.
    pub fn flush(&mut self) -> Result<(), PersistenceError> {
        let payload = self.encode()?;
        match self.write(payload, ()).warning {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn encode(&self) -> Result<String, PersistenceError> {
        serde_json::to_string(&self.items).map_err(|e| PersistenceError::Serialize {
            key: E::STORAGE_KEY.to_string(),
            message: e.to_string(),
        })
    }

    fn write<T>(&mut self, payload: String, value: T) -> Outcome<T> {
        match self.store.set(E::STORAGE_KEY, &payload) {
            Ok(()) => {
                self.dirty = false;
                Outcome {
                    value,
                    warning: None,
                }
            }
            Err(err) => {
                self.dirty = true;
                tracing::warn!(key = E::STORAGE_KEY, error = %err, "collection write failed; keeping in-memory state");
                Outcome {
                    value,
                    warning: Some(PersistenceError::Write {
                        key: E::STORAGE_KEY.to_string(),
                        message: err.to_string(),
                    }),
                }
            }
        }
    }
}
