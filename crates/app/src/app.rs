//! Wiring: config → stores, HTTP clients, enrichers and trackers.

use std::sync::Arc;

use anyhow::Context;

use trackers_infra::config::{TrackersConfig, TrackingMode};
use trackers_infra::external::{
    ExchangeRateClient, HttpClient, LiveTracking, MovieCatalog, NominatimGeocoder, OmdbClient,
    OpenFoodFactsClient, ProductSource, RateSource, SimulatedTracking, TmdbClient,
    TrackingSource, TrendingCatalog,
};
use trackers_infra::notify::{Notification, Notifier, Severity};
use trackers_infra::{
    MovieEnricher, ProductEnricher, ShipmentEnricher, ShipmentTracker, ShoppingTracker, Tracker,
    WatchlistTracker,
};
use trackers_store::FileStore;

/// The three trackers plus the lookups that do not go through a collection.
#[derive(Clone)]
pub struct Trackers {
    pub config: TrackersConfig,
    pub shipping: ShipmentTracker<Arc<FileStore>>,
    pub shopping: ShoppingTracker<Arc<FileStore>>,
    pub movies: WatchlistTracker<Arc<FileStore>>,
    pub products: Arc<dyn ProductSource>,
    pub rates: Arc<dyn RateSource>,
    pub catalog: Arc<dyn MovieCatalog>,
    pub trending: Arc<dyn TrendingCatalog>,
}

/// Build every tracker from `config`, storing under `config.data_dir`.
pub fn build(config: TrackersConfig, notifier: Arc<dyn Notifier>) -> anyhow::Result<Trackers> {
    let store = Arc::new(
        FileStore::open(&config.data_dir)
            .with_context(|| format!("opening data dir {}", config.data_dir.display()))?,
    );
    let http = HttpClient::new(config.http_timeout).context("building HTTP client")?;

    let tracking: Arc<dyn TrackingSource> = match config.tracking_mode {
        TrackingMode::Simulated => Arc::new(SimulatedTracking),
        TrackingMode::Live => Arc::new(LiveTracking::new(http.clone(), config.tracking.clone())),
    };
    let mut shipment_enricher = ShipmentEnricher::new(tracking);
    if config.tracking_mode == TrackingMode::Live {
        shipment_enricher = shipment_enricher.with_geocoder(Arc::new(NominatimGeocoder::new(
            http.clone(),
            config.geocode.clone(),
        )));
    }

    let products: Arc<dyn ProductSource> =
        Arc::new(OpenFoodFactsClient::new(http.clone(), config.products.clone()));
    let catalog: Arc<dyn MovieCatalog> = Arc::new(OmdbClient::new(http.clone(), config.omdb.clone()));
    let trending: Arc<dyn TrendingCatalog> =
        Arc::new(TmdbClient::new(http.clone(), config.tmdb.clone()));
    let rates: Arc<dyn RateSource> =
        Arc::new(ExchangeRateClient::new(http, config.exchange.clone()));

    tracing::info!(
        data_dir = %config.data_dir.display(),
        tracking = ?config.tracking_mode,
        "trackers ready"
    );

    Ok(Trackers {
        shipping: Tracker::new(Arc::clone(&store), Arc::new(shipment_enricher), Arc::clone(&notifier)),
        shopping: Tracker::new(
            Arc::clone(&store),
            Arc::new(ProductEnricher::new(Arc::clone(&products))),
            Arc::clone(&notifier),
        ),
        movies: Tracker::new(
            store,
            Arc::new(MovieEnricher::new(Arc::clone(&catalog), Arc::clone(&trending))),
            notifier,
        ),
        products,
        rates,
        catalog,
        trending,
        config,
    })
}

/// Prints notifications to stderr, one line each.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, n: Notification) {
        let tag = match n.severity {
            Severity::Info => "note",
            Severity::Success => "ok",
            Severity::Error => "error",
        };
        eprintln!("{tag}: {}", n.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use trackers_core::Entity;
    use trackers_infra::RecordingNotifier;
    use trackers_shipping::{Carrier, Shipment, ShipmentStatus};

    fn config(dir: &std::path::Path) -> TrackersConfig {
        let vars: HashMap<&str, String> =
            HashMap::from([("TRACKERS_DATA_DIR", dir.display().to_string())]);
        TrackersConfig::from_lookup(|k| vars.get(k).cloned()).unwrap()
    }

    #[tokio::test]
    async fn simulated_shipments_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier::new());

        let trackers = build(config(dir.path()), notifier.clone()).unwrap();
        let added = trackers
            .shipping
            .add(Shipment::draft("ABC123D", Carrier::Ups, Some("books".into()), chrono::Utc::now()))
            .await
            .unwrap();
        assert_eq!(added.status, ShipmentStatus::Delivered);
        assert!(dir.path().join(format!("{}.json", Shipment::STORAGE_KEY)).exists());

        let reopened = build(config(dir.path()), notifier).unwrap();
        assert_eq!(reopened.shipping.get(&added.id).await, Some(added));
    }
}
