//! Debounced product search feeding a watch channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use trackers_shopping::{ProductInfo, ProductQuery};

use crate::debounce::Debouncer;
use crate::external::ProductSource;

/// Latest state of the search box.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Idle,
    Results {
        query: String,
        products: Vec<ProductInfo>,
    },
    Failed {
        query: String,
        message: String,
    },
}

/// Search-as-you-type over a [`ProductSource`].
///
/// Keystrokes call [`ProductSearch::input`]; only the last input of a burst
/// reaches the network, and its result is published to subscribers.
#[derive(Debug)]
pub struct ProductSearch {
    debouncer: Debouncer<ProductQuery>,
    state: Arc<watch::Sender<SearchState>>,
}

impl ProductSearch {
    pub fn new(source: Arc<dyn ProductSource>, quiet: Duration) -> Self {
        let (tx, _rx) = watch::channel(SearchState::Idle);
        let state = Arc::new(tx);
        let publish = Arc::clone(&state);

        let debouncer = Debouncer::new(quiet, move |query: ProductQuery| {
            let source = Arc::clone(&source);
            let publish = Arc::clone(&publish);
            async move {
                let found = match &query {
                    ProductQuery::Barcode(code) => source
                        .by_barcode(code)
                        .await
                        .map(|hit| hit.into_iter().collect()),
                    ProductQuery::Text(text) => source.search(text).await,
                };
                let next = match found {
                    Ok(products) => SearchState::Results {
                        query: query.as_str().to_string(),
                        products,
                    },
                    Err(e) => {
                        tracing::warn!(query = query.as_str(), error = %e, "product search failed");
                        SearchState::Failed {
                            query: query.as_str().to_string(),
                            message: e.to_string(),
                        }
                    }
                };
                publish.send_replace(next);
            }
        });

        Self { debouncer, state }
    }

    /// Feed the current contents of the search box.
    pub fn input(&self, raw: &str) {
        match ProductQuery::parse(raw) {
            Ok(query) => self.debouncer.trigger(query),
            Err(_) => {
                self.debouncer.cancel();
                self.state.send_replace(SearchState::Idle);
            }
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SearchState {
        self.state.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use trackers_core::{TrackerError, TrackerResult};

    #[derive(Default)]
    struct FakeProducts {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProductSource for FakeProducts {
        async fn by_barcode(&self, barcode: &str) -> TrackerResult<Option<ProductInfo>> {
            self.calls.lock().unwrap().push(format!("barcode:{barcode}"));
            Ok(None)
        }

        async fn search(&self, text: &str) -> TrackerResult<Vec<ProductInfo>> {
            self.calls.lock().unwrap().push(format!("text:{text}"));
            if text == "boom" {
                return Err(TrackerError::not_found("boom"));
            }
            Ok(vec![ProductInfo {
                name: text.to_string(),
                brand: None,
                image_url: None,
                barcode: None,
                category: None,
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn typing_burst_issues_one_lookup() {
        let source = Arc::new(FakeProducts::default());
        let search = ProductSearch::new(source.clone(), Duration::from_millis(700));
        let mut rx = search.subscribe();

        for prefix in ["o", "oa", "oat", "oat ", "oat milk"] {
            search.input(prefix);
            tokio::time::sleep(Duration::from_millis(120)).await;
        }
        rx.changed().await.unwrap();

        assert_eq!(*source.calls.lock().unwrap(), ["text:oat milk"]);
        match search.current() {
            SearchState::Results { query, products } => {
                assert_eq!(query, "oat milk");
                assert_eq!(products.len(), 1);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn digits_go_to_barcode_lookup_and_blank_resets() {
        let source = Arc::new(FakeProducts::default());
        let search = ProductSearch::new(source.clone(), Duration::from_millis(700));

        search.input("3017620422003");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*source.calls.lock().unwrap(), ["barcode:3017620422003"]);

        search.input("boom");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(matches!(search.current(), SearchState::Failed { .. }));

        search.input("  ");
        assert_eq!(search.current(), SearchState::Idle);
    }
}
