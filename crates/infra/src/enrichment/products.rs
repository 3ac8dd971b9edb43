use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use trackers_core::TrackerResult;
use trackers_shopping::{ProductInfo, ProductQuery, ShoppingItem};

use super::Enricher;
use crate::external::ProductSource;

/// Product metadata lookup for shopping items.
///
/// Items with a barcode are looked up by that code; otherwise the name is the
/// query (a digits-only name is treated as a barcode too).
#[derive(Clone)]
pub struct ProductEnricher {
    source: Arc<dyn ProductSource>,
}

impl ProductEnricher {
    pub fn new(source: Arc<dyn ProductSource>) -> Self {
        Self { source }
    }

    pub async fn lookup(&self, raw: &str) -> TrackerResult<ProductInfo> {
        let query = ProductQuery::parse(raw)?;
        let candidates = match &query {
            ProductQuery::Barcode(code) => self.source.by_barcode(code).await?.into_iter().collect(),
            ProductQuery::Text(text) => self.source.search(text).await?,
        };
        query.resolve(candidates)
    }
}

#[async_trait]
impl Enricher<ShoppingItem> for ProductEnricher {
    async fn enrich(&self, item: &ShoppingItem, _now: DateTime<Utc>) -> TrackerResult<ProductInfo> {
        let query = item.barcode.as_deref().unwrap_or(&item.name);
        self.lookup(query).await
    }
}
