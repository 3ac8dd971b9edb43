//! The per-tracker orchestrator: validation, duplicate detection, remote
//! enrichment and persisted mutation, with every failure routed to the
//! notifier.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use trackers_core::{
    Enrichable, Entity, EntityId, Projectable, SortKey, TrackerError, TrackerResult, project,
};
use trackers_movies::WatchlistEntry;
use trackers_shipping::Shipment;
use trackers_shopping::ShoppingItem;
use trackers_store::{KeyValueStore, Outcome, PersistedCollection};

use crate::enrichment::Enricher;
use crate::notify::{Notification, Notifier};

pub type ShipmentTracker<S> = Tracker<Shipment, S>;
pub type ShoppingTracker<S> = Tracker<ShoppingItem, S>;
pub type WatchlistTracker<S> = Tracker<WatchlistEntry, S>;

/// What happened to a refresh once its response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response was merged into the entity.
    Applied,
    /// A later refresh of the same entity was issued; this response was dropped.
    Superseded,
    /// The entity was removed while the request was in flight.
    Removed,
}

struct TrackerState<E: Entity, S: KeyValueStore> {
    collection: PersistedCollection<E, S>,
    /// Token of the newest in-flight refresh per entity.
    in_flight: HashMap<EntityId, u64>,
    next_token: u64,
}

impl<E: Entity, S: KeyValueStore> TrackerState<E, S> {
    fn issue_token(&mut self, id: &EntityId) -> u64 {
        self.next_token += 1;
        self.in_flight.insert(id.clone(), self.next_token);
        self.next_token
    }

    fn is_current(&self, id: &EntityId, token: u64) -> bool {
        self.in_flight.get(id) == Some(&token)
    }

    fn retire(&mut self, id: &EntityId, token: u64) {
        if self.is_current(id, token) {
            self.in_flight.remove(id);
        }
    }

    fn ensure_unique(&self, entity: &E) -> TrackerResult<()> {
        let key = entity.natural_key();
        if self.collection.contains(entity.id()) || self.collection.find_by_natural_key(&key).is_some() {
            return Err(TrackerError::duplicate(key));
        }
        Ok(())
    }
}

/// One tracker: a persisted collection plus the enrichment that feeds it.
///
/// The collection lock is never held across a network call, so independent
/// adds and refreshes interleave freely.
pub struct Tracker<E: Enrichable, S: KeyValueStore> {
    state: Arc<Mutex<TrackerState<E, S>>>,
    enricher: Arc<dyn Enricher<E>>,
    notifier: Arc<dyn Notifier>,
}

impl<E: Enrichable, S: KeyValueStore> Clone for Tracker<E, S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            enricher: Arc::clone(&self.enricher),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<E: Enrichable, S: KeyValueStore> Tracker<E, S> {
    /// Load the stored collection from `store`.
    pub fn new(store: S, enricher: Arc<dyn Enricher<E>>, notifier: Arc<dyn Notifier>) -> Self {
        Self::from_collection(PersistedCollection::load(store), enricher, notifier)
    }

    pub fn from_collection(
        collection: PersistedCollection<E, S>,
        enricher: Arc<dyn Enricher<E>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState {
                collection,
                in_flight: HashMap::new(),
                next_token: 0,
            })),
            enricher,
            notifier,
        }
    }

    /// Validate, reject duplicates, enrich, then commit.
    ///
    /// Nothing is stored unless enrichment succeeds. A duplicate natural key
    /// is rejected before any network call.
    pub async fn add(&self, draft: E) -> TrackerResult<E> {
        self.precheck(&draft).await?;

        let enrichment = match self.enricher.enrich(&draft, Utc::now()).await {
            Ok(enrichment) => enrichment,
            Err(err) => return Err(self.fail("add", err)),
        };
        let mut entity = draft;
        entity.merge_enrichment(enrichment);

        self.commit(entity).await
    }

    /// Commit an entity as entered, without a remote lookup.
    pub async fn add_manual(&self, entity: E) -> TrackerResult<E> {
        self.precheck(&entity).await?;
        self.commit(entity).await
    }

    /// Re-fetch the enrichment for `id` and merge it.
    ///
    /// On failure the stored entity is left untouched. A response that lost
    /// the race to a newer refresh, or whose entity has gone, is discarded.
    pub async fn refresh(&self, id: &EntityId) -> TrackerResult<RefreshOutcome> {
        let (snapshot, token) = {
            let mut state = self.state.lock().await;
            let Some(entity) = state.collection.get(id).cloned() else {
                return Err(self.fail("refresh", TrackerError::not_found(id.to_string())));
            };
            (entity, state.issue_token(id))
        };

        let result = self.enricher.enrich(&snapshot, Utc::now()).await;

        let mut state = self.state.lock().await;
        let enrichment = match result {
            Ok(enrichment) => enrichment,
            Err(err) => {
                state.retire(id, token);
                return Err(self.fail("refresh", err));
            }
        };

        if !state.collection.contains(id) {
            state.retire(id, token);
            tracing::info!(kind = E::KIND, id = %id, "discarding refresh for removed entity");
            return Ok(RefreshOutcome::Removed);
        }
        if !state.is_current(id, token) {
            tracing::debug!(kind = E::KIND, id = %id, token, "discarding superseded refresh");
            return Ok(RefreshOutcome::Superseded);
        }
        state.retire(id, token);

        let outcome = state
            .collection
            .modify(id, |entity| entity.merge_enrichment(enrichment))
            .map_err(|e| self.fail("refresh", e.into()))?;
        drop(state);

        self.surface(outcome);
        tracing::info!(kind = E::KIND, id = %id, "refreshed");
        Ok(RefreshOutcome::Applied)
    }

    /// Refresh every entity, one after another; returns how many were applied.
    pub async fn refresh_all(&self) -> usize {
        let ids: Vec<EntityId> = {
            let state = self.state.lock().await;
            state.collection.iter().map(|e| e.id().clone()).collect()
        };
        let mut applied = 0;
        for id in ids {
            if let Ok(RefreshOutcome::Applied) = self.refresh(&id).await {
                applied += 1;
            }
        }
        applied
    }

    /// Shallow-merge `patch` into the entity.
    pub async fn update(&self, id: &EntityId, patch: E::Patch) -> TrackerResult<E> {
        self.update_with(id, move |_| patch).await
    }

    /// Build a patch from the current entity and apply it atomically.
    ///
    /// A patch that would leave the entity invalid is rejected unapplied.
    pub async fn update_with<F>(&self, id: &EntityId, make_patch: F) -> TrackerResult<E>
    where
        F: FnOnce(&E) -> E::Patch,
    {
        let mut state = self.state.lock().await;
        let Some(current) = state.collection.get(id) else {
            return Err(self.fail("update", TrackerError::not_found(id.to_string())));
        };
        let mut updated = current.clone();
        updated.apply_patch(make_patch(current));
        if let Err(err) = updated.validate() {
            return Err(self.fail("update", err));
        }

        let outcome = state
            .collection
            .modify(id, |entity| *entity = updated.clone())
            .map_err(|e| self.fail("update", e.into()))?;
        drop(state);

        self.surface(outcome);
        Ok(updated)
    }

    /// Delete `id`; `None` when it was not tracked.
    pub async fn remove(&self, id: &EntityId) -> TrackerResult<Option<E>> {
        let mut state = self.state.lock().await;
        state.in_flight.remove(id);
        let outcome = state
            .collection
            .remove(id)
            .map_err(|e| self.fail("remove", e.into()))?;
        drop(state);

        let removed = self.surface(outcome);
        if removed.is_some() {
            tracing::info!(kind = E::KIND, id = %id, "removed");
        }
        Ok(removed)
    }

    /// Remove everything; returns how many entities were dropped.
    pub async fn clear(&self) -> TrackerResult<usize> {
        let mut state = self.state.lock().await;
        state.in_flight.clear();
        let outcome = state
            .collection
            .clear()
            .map_err(|e| self.fail("clear", e.into()))?;
        drop(state);

        let dropped = self.surface(outcome);
        tracing::info!(kind = E::KIND, dropped, "cleared");
        Ok(dropped)
    }

    /// Retry a write that failed earlier in the session.
    pub async fn flush(&self) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        if !state.collection.is_dirty() {
            return Ok(());
        }
        state
            .collection
            .flush()
            .map_err(|e| self.fail("flush", e.into()))
    }

    pub async fn get(&self, id: &EntityId) -> Option<E> {
        self.state.lock().await.collection.get(id).cloned()
    }

    pub async fn find_by_natural_key(&self, key: &str) -> Option<E> {
        self.state
            .lock()
            .await
            .collection
            .find_by_natural_key(key)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.collection.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All entities in insertion order.
    pub async fn snapshot(&self) -> Vec<E> {
        self.state.lock().await.collection.iter().cloned().collect()
    }

    /// Run `f` against the current collection, e.g. to compute stats.
    pub async fn read<R>(&self, f: impl FnOnce(&PersistedCollection<E, S>) -> R) -> R {
        let state = self.state.lock().await;
        f(&state.collection)
    }

    async fn precheck(&self, entity: &E) -> TrackerResult<()> {
        if let Err(err) = entity.validate() {
            return Err(self.fail("add", err));
        }
        let state = self.state.lock().await;
        state.ensure_unique(entity).map_err(|err| self.fail("add", err))
    }

    async fn commit(&self, entity: E) -> TrackerResult<E> {
        if let Err(err) = entity.validate() {
            return Err(self.fail("add", err));
        }

        let mut state = self.state.lock().await;
        // Another add may have committed the same key while we were fetching.
        state
            .ensure_unique(&entity)
            .map_err(|err| self.fail("add", err))?;
        let outcome = state
            .collection
            .add(entity.clone())
            .map_err(|e| self.fail("add", e.into()))?;
        drop(state);

        self.surface(outcome);
        tracing::info!(kind = E::KIND, id = %entity.id(), key = %entity.natural_key(), "added");
        self.notifier.notify(Notification::success(format!(
            "Added {} {}",
            E::KIND,
            entity.natural_key()
        )));
        Ok(entity)
    }

    fn fail(&self, action: &str, err: TrackerError) -> TrackerError {
        tracing::warn!(kind = E::KIND, action, error = %err, "tracker action failed");
        self.notifier.notify(Notification::from(&err));
        err
    }

    /// Report a write failure that kept the in-memory change.
    fn surface<T>(&self, outcome: Outcome<T>) -> T {
        let (value, warning) = outcome.into_parts();
        if let Some(warning) = warning {
            let err = TrackerError::Persistence(warning);
            tracing::warn!(kind = E::KIND, error = %err, "change not persisted");
            self.notifier.notify(Notification::from(&err));
        }
        value
    }
}

impl<E: Enrichable + Projectable, S: KeyValueStore> Tracker<E, S> {
    /// Filtered, sorted copy of the collection for rendering.
    pub async fn view(&self, filter: Option<&E::Filter>, sort: SortKey) -> Vec<E> {
        let state = self.state.lock().await;
        project(state.collection.iter(), filter, sort)
            .into_iter()
            .cloned()
            .collect()
    }
}
