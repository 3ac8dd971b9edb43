//! Command handlers: translate CLI input into tracker operations and render
//! the resulting projection.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::Utc;
use serde::Serialize;

use trackers_core::{Enrichable, Entity, EntityId, TrackerError, TrackerResult};
use trackers_infra::enrichment::resolve_movie;
use trackers_infra::notify::{Notification, Notifier};
use trackers_infra::search::{ProductSearch, SearchState};
use trackers_infra::{RefreshOutcome, Tracker};
use trackers_movies::{WatchFilter, WatchlistEntry, WatchlistStats};
use trackers_shipping::{Shipment, ShipmentFilter, ShipmentPatch, ShipmentStats, normalize_tracking_number};
use trackers_shopping::{ShoppingFilter, ShoppingItem, ShoppingPatch, ShoppingTotals};
use trackers_store::KeyValueStore;

use crate::app::Trackers;
use crate::cli::{Commands, MovieCommands, ShippingCommands, ShoppingCommands};
use crate::render;

/// Runs one command; output goes to stdout.
pub struct Runner {
    pub trackers: Trackers,
    pub notifier: Arc<dyn Notifier>,
    pub json: bool,
}

impl Runner {
    pub async fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Shipping(cmd) => self.shipping(cmd).await,
            Commands::Shopping(cmd) => self.shopping(cmd).await,
            Commands::Movies(cmd) => self.movies(cmd).await,
        }
    }

    async fn shipping(&self, cmd: ShippingCommands) -> anyhow::Result<()> {
        let tracker = &self.trackers.shipping;
        match cmd {
            ShippingCommands::Add {
                tracking_number,
                carrier,
                label,
            } => {
                let added = tracker
                    .add(Shipment::draft(&tracking_number, carrier, label, Utc::now()))
                    .await?;
                self.emit(&added, render::shipment_line(&added))
            }
            ShippingCommands::Refresh { id: None } => {
                let applied = tracker.refresh_all().await;
                println!("refreshed {applied} of {} parcels", tracker.len().await);
                Ok(())
            }
            ShippingCommands::Refresh { id: Some(raw) } => {
                let id = resolve(tracker, &raw, &[normalize_tracking_number(&raw)]).await?;
                report_refresh(tracker.refresh(&id).await?);
                if let Some(shipment) = tracker.get(&id).await {
                    self.emit(&shipment, render::shipment_line(&shipment))?;
                }
                Ok(())
            }
            ShippingCommands::Edit { id, label, status } => {
                let id = resolve(tracker, &id, &[normalize_tracking_number(&id)]).await?;
                let updated = tracker.update(&id, ShipmentPatch { label, status }).await?;
                self.emit(&updated, render::shipment_line(&updated))
            }
            ShippingCommands::Remove { id } => {
                let id = resolve(tracker, &id, &[normalize_tracking_number(&id)]).await?;
                tracker.remove(&id).await?;
                Ok(())
            }
            ShippingCommands::List {
                active,
                status,
                sort,
            } => {
                let filter = match (active, status) {
                    (_, Some(status)) => Some(ShipmentFilter::Status(status)),
                    (true, None) => Some(ShipmentFilter::Active),
                    (false, None) => None,
                };
                let view = tracker.view(filter.as_ref(), sort.sort).await;
                let stats = tracker.read(|c| ShipmentStats::compute(c.iter())).await;
                self.emit_list(&view, render::shipment_line, render::shipment_stats(&stats))
            }
            ShippingCommands::Clear => {
                let dropped = tracker.clear().await?;
                println!("removed {dropped} parcels");
                Ok(())
            }
        }
    }

    async fn shopping(&self, cmd: ShoppingCommands) -> anyhow::Result<()> {
        let tracker = &self.trackers.shopping;
        let currency = self.trackers.config.base_currency.clone();
        let keys = |raw: &str| vec![raw.trim().to_string(), raw.trim().to_lowercase()];
        match cmd {
            ShoppingCommands::Add {
                query,
                quantity,
                price,
                category,
                priority,
                notes,
                manual,
            } => {
                let now = Utc::now();
                let query = query.trim();
                let mut draft = if !manual && query.chars().all(|c| c.is_ascii_digit()) {
                    ShoppingItem::draft("", now).with_barcode(query)
                } else {
                    ShoppingItem::draft(query, now)
                };
                draft = draft.with_quantity(quantity).with_priority(priority);
                if let Some(price) = price {
                    draft = draft.with_price(price);
                }
                if let Some(category) = &category {
                    draft = draft.with_category(category);
                }
                draft.notes = notes.filter(|n| !n.trim().is_empty());

                let added = if manual {
                    tracker.add_manual(draft).await?
                } else {
                    tracker.add(draft).await?
                };
                self.emit(&added, render::shopping_line(&added, &currency))
            }
            ShoppingCommands::Lookup { query } => self.lookup(&query).await,
            ShoppingCommands::Toggle { id } => {
                let id = resolve(tracker, &id, &keys(&id)).await?;
                let updated = tracker
                    .update_with(&id, |item| ShoppingPatch {
                        purchased: Some(!item.purchased),
                        ..Default::default()
                    })
                    .await?;
                self.emit(&updated, render::shopping_line(&updated, &currency))
            }
            ShoppingCommands::Qty { id, delta } => {
                let id = resolve(tracker, &id, &keys(&id)).await?;
                let updated = tracker
                    .update_with(&id, |item| {
                        let mut next = item.clone();
                        next.adjust_quantity(delta);
                        ShoppingPatch {
                            quantity: Some(next.quantity),
                            ..Default::default()
                        }
                    })
                    .await?;
                self.emit(&updated, render::shopping_line(&updated, &currency))
            }
            ShoppingCommands::Edit {
                id,
                name,
                price,
                category,
                priority,
                notes,
            } => {
                let id = resolve(tracker, &id, &keys(&id)).await?;
                let patch = ShoppingPatch {
                    name,
                    price,
                    category,
                    priority,
                    notes,
                    ..Default::default()
                };
                let updated = tracker.update(&id, patch).await?;
                self.emit(&updated, render::shopping_line(&updated, &currency))
            }
            ShoppingCommands::Remove { id } => {
                let id = resolve(tracker, &id, &keys(&id)).await?;
                tracker.remove(&id).await?;
                Ok(())
            }
            ShoppingCommands::List {
                category,
                purchased,
                remaining,
                sort,
            } => {
                let filter = match (category, purchased, remaining) {
                    (Some(category), _, _) => Some(ShoppingFilter::Category(category)),
                    (None, true, _) => Some(ShoppingFilter::Purchased(true)),
                    (None, false, true) => Some(ShoppingFilter::Purchased(false)),
                    (None, false, false) => None,
                };
                let view = tracker.view(filter.as_ref(), sort.sort).await;
                let totals = tracker.read(|c| ShoppingTotals::compute(c.iter())).await;
                self.emit_list(
                    &view,
                    |item| render::shopping_line(item, &currency),
                    render::shopping_totals(&totals, &currency, 1.0),
                )
            }
            ShoppingCommands::Total { currency: target } => {
                let totals = tracker.read(|c| ShoppingTotals::compute(c.iter())).await;
                let (code, rate) = match target.map(|c| c.trim().to_ascii_uppercase()) {
                    Some(code) if code != currency => {
                        let rates = self.notified(self.trackers.rates.latest(&currency).await)?;
                        let rate = rates
                            .rate(&code)
                            .with_context(|| format!("no exchange rate from {currency} to {code}"))?;
                        (code, rate)
                    }
                    _ => (currency.clone(), 1.0),
                };
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&totals)?);
                }
                println!("{}", render::shopping_totals(&totals, &code, rate));
                Ok(())
            }
            ShoppingCommands::Clear => {
                let dropped = tracker.clear().await?;
                println!("removed {dropped} items");
                Ok(())
            }
        }
    }

    /// Runs the query through the debounced search, as the search box does.
    async fn lookup(&self, query: &str) -> anyhow::Result<()> {
        let config = &self.trackers.config;
        let search = ProductSearch::new(Arc::clone(&self.trackers.products), config.search_debounce);
        if query.trim().is_empty() {
            bail!("search query is required");
        }
        let mut results = search.subscribe();
        search.input(query);

        let deadline = config.search_debounce + config.http_timeout + Duration::from_secs(1);
        tokio::time::timeout(deadline, results.changed())
            .await
            .context("product search timed out")?
            .context("product search stopped")?;

        let state = results.borrow().clone();
        match state {
            SearchState::Results { products, .. } if products.is_empty() => {
                self.notifier.notify(Notification::info(format!("no products match \"{query}\"")));
            }
            SearchState::Results { products, .. } => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&products)?);
                } else {
                    for p in products {
                        let code = p.barcode.as_deref().unwrap_or("-");
                        let brand = p.brand.as_deref().unwrap_or("");
                        println!("{code:<14} {} {brand}", p.name);
                    }
                }
            }
            SearchState::Failed { message, .. } => {
                self.notifier.notify(Notification::error(message.clone()));
                bail!(message);
            }
            SearchState::Idle => {}
        }
        Ok(())
    }

    async fn movies(&self, cmd: MovieCommands) -> anyhow::Result<()> {
        let tracker = &self.trackers.movies;
        let keys = |raw: &str| vec![raw.trim().to_string()];
        match cmd {
            MovieCommands::Search { title } => {
                let hits = self.notified(self.trackers.catalog.search(&title).await)?;
                self.emit_list(&hits, render::movie_summary, format!("{} results", hits.len()))
            }
            MovieCommands::Trending => {
                let hits = self.notified(self.trackers.trending.trending().await)?;
                self.emit_list(&hits, render::movie_summary, format!("{} trending", hits.len()))
            }
            MovieCommands::Add { query } => {
                // A title or id already on the list needs no catalogue search.
                if let Some(existing) = tracker.find_by_natural_key(query.trim()).await {
                    self.notified(Err::<(), _>(TrackerError::duplicate(existing.natural_key())))?;
                }
                let movie = self.notified(resolve_movie(self.trackers.catalog.as_ref(), &query).await)?;
                let added = tracker.add(WatchlistEntry::draft(&movie, Utc::now())).await?;
                self.emit(&added, render::movie_line(&added))
            }
            MovieCommands::Toggle { id } => {
                let id = resolve(tracker, &id, &keys(&id)).await?;
                let now = Utc::now();
                let updated = tracker.update_with(&id, |e| e.toggle_patch(now)).await?;
                self.emit(&updated, render::movie_line(&updated))
            }
            MovieCommands::Refresh { id } => {
                let id = resolve(tracker, &id, &keys(&id)).await?;
                report_refresh(tracker.refresh(&id).await?);
                Ok(())
            }
            MovieCommands::Remove { id } => {
                let id = resolve(tracker, &id, &keys(&id)).await?;
                tracker.remove(&id).await?;
                Ok(())
            }
            MovieCommands::List {
                status,
                genre,
                sort,
            } => {
                let filter = status
                    .map(WatchFilter::Status)
                    .or(genre.map(WatchFilter::Genre));
                let view = tracker.view(filter.as_ref(), sort.sort).await;
                let stats = tracker.read(|c| WatchlistStats::compute(c.iter())).await;
                self.emit_list(&view, render::movie_line, render::watchlist_stats(&stats))
            }
            MovieCommands::Clear => {
                let dropped = tracker.clear().await?;
                println!("removed {dropped} movies");
                Ok(())
            }
        }
    }

    /// Route a failed lookup that bypasses the trackers through the notifier.
    fn notified<T>(&self, result: TrackerResult<T>) -> TrackerResult<T> {
        if let Err(err) = &result {
            self.notifier.notify(Notification::from(err));
        }
        result
    }

    fn emit<T: Serialize>(&self, value: &T, text: String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{text}");
        }
        Ok(())
    }

    fn emit_list<T: Serialize>(
        &self,
        items: &[T],
        line: impl Fn(&T) -> String,
        footer: String,
    ) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(items)?);
            return Ok(());
        }
        for item in items {
            println!("{}", line(item));
        }
        println!("{footer}");
        Ok(())
    }
}

fn report_refresh(outcome: RefreshOutcome) {
    match outcome {
        RefreshOutcome::Applied => {}
        RefreshOutcome::Superseded => println!("a newer refresh is in progress"),
        RefreshOutcome::Removed => println!("removed while refreshing"),
    }
}

/// Find an entity by internal id or by any of the natural-key spellings.
async fn resolve<E, S>(tracker: &Tracker<E, S>, raw: &str, keys: &[String]) -> anyhow::Result<EntityId>
where
    E: Enrichable,
    S: KeyValueStore,
{
    let raw = raw.trim();
    let id = EntityId::new(raw);
    if tracker.get(&id).await.is_some() {
        return Ok(id);
    }
    for key in keys {
        if let Some(entity) = tracker.find_by_natural_key(key).await {
            return Ok(entity.id().clone());
        }
    }
    bail!("no {} matches `{raw}`", E::KIND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use trackers_infra::RecordingNotifier;
    use trackers_infra::config::TrackersConfig;
    use trackers_shipping::{Carrier, ShipmentStatus};

    fn runner(dir: &std::path::Path) -> (Runner, Arc<RecordingNotifier>) {
        let vars = HashMap::from([("TRACKERS_DATA_DIR", dir.display().to_string())]);
        let config = TrackersConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let trackers = crate::app::build(config, notifier.clone()).unwrap();
        (
            Runner {
                trackers,
                notifier: notifier.clone(),
                json: false,
            },
            notifier,
        )
    }

    #[tokio::test]
    async fn shipments_resolve_by_tracking_number() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, _) = runner(dir.path());

        runner
            .run(Commands::Shipping(ShippingCommands::Add {
                tracking_number: "abc 123d".into(),
                carrier: Carrier::Auto,
                label: None,
            }))
            .await
            .unwrap();
        runner
            .run(Commands::Shipping(ShippingCommands::Edit {
                id: "abc123d".into(),
                label: Some("books".into()),
                status: Some(ShipmentStatus::Exception),
            }))
            .await
            .unwrap();

        let shipment = runner
            .trackers
            .shipping
            .find_by_natural_key("ABC123D")
            .await
            .unwrap();
        assert_eq!(shipment.label.as_deref(), Some("books"));
        assert_eq!(shipment.status, ShipmentStatus::Exception);
    }

    #[tokio::test]
    async fn manual_shopping_items_toggle_and_adjust() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, _) = runner(dir.path());

        runner
            .run(Commands::Shopping(ShoppingCommands::Add {
                query: "Milk".into(),
                quantity: 2,
                price: Some(1.5),
                category: Some("Dairy".into()),
                priority: None,
                notes: None,
                manual: true,
            }))
            .await
            .unwrap();
        runner
            .run(Commands::Shopping(ShoppingCommands::Qty {
                id: "milk".into(),
                delta: -5,
            }))
            .await
            .unwrap();
        runner
            .run(Commands::Shopping(ShoppingCommands::Toggle { id: "MILK".into() }))
            .await
            .unwrap();

        let item = runner.trackers.shopping.find_by_natural_key("milk").await.unwrap();
        assert_eq!(item.quantity, 1);
        assert!(item.purchased);
        assert_eq!(item.category, "dairy");
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, _) = runner(dir.path());
        let err = runner
            .run(Commands::Movies(MovieCommands::Remove { id: "tt404".into() }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no movie matches"));
    }

    /// Catalogue that counts searches and never finds anything.
    #[derive(Default)]
    struct CountingCatalog(std::sync::atomic::AtomicUsize);

    #[async_trait::async_trait]
    impl trackers_infra::external::MovieCatalog for CountingCatalog {
        async fn search(&self, _: &str) -> TrackerResult<Vec<trackers_movies::MovieSummary>> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn detail(&self, id: &str, _: chrono::DateTime<Utc>) -> TrackerResult<trackers_movies::MovieDetail> {
            Err(TrackerError::not_found(id))
        }
    }

    #[tokio::test]
    async fn movies_already_listed_are_rejected_without_searching() {
        let dir = tempfile::tempdir().unwrap();
        let (mut runner, notifier) = runner(dir.path());
        let catalog = Arc::new(CountingCatalog::default());
        runner.trackers.catalog = catalog.clone();

        let mut heat = WatchlistEntry::draft(&trackers_movies::MovieRef::Primary("tt0113277".into()), Utc::now());
        heat.title = "Heat".into();
        runner.trackers.movies.add_manual(heat).await.unwrap();

        for query in ["heat", "tt0113277"] {
            let err = runner
                .run(Commands::Movies(MovieCommands::Add { query: query.into() }))
                .await
                .unwrap_err();
            assert!(matches!(err.downcast_ref::<TrackerError>(), Some(TrackerError::Duplicate(_))));
        }
        assert_eq!(catalog.0.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(notifier.count(trackers_infra::Severity::Error), 2);
        assert_eq!(runner.trackers.movies.len().await, 1);
    }
}
