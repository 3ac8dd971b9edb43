//! Open Food Facts-style product catalogue.

use async_trait::async_trait;
use serde::Deserialize;

use trackers_core::TrackerResult;
use trackers_shopping::ProductInfo;

use super::{HttpClient, ProductSource, present};
use crate::config::ApiEndpoint;

const PAGE_SIZE: &str = "10";

#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    http: HttpClient,
    endpoint: ApiEndpoint,
}

impl OpenFoodFactsClient {
    pub fn new(http: HttpClient, endpoint: ApiEndpoint) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl ProductSource for OpenFoodFactsClient {
    async fn by_barcode(&self, barcode: &str) -> TrackerResult<Option<ProductInfo>> {
        const OPERATION: &str = "product lookup";
        let url = HttpClient::url(
            OPERATION,
            &self.endpoint.base_url,
            &format!("api/v2/product/{barcode}.json"),
            &[],
        )?;
        let found: Option<BarcodeResponse> =
            self.http.get_json_or_not_found(OPERATION, url, &[]).await?;
        Ok(found.and_then(BarcodeResponse::into_product))
    }

    async fn search(&self, text: &str) -> TrackerResult<Vec<ProductInfo>> {
        const OPERATION: &str = "product search";
        let url = HttpClient::url(
            OPERATION,
            &self.endpoint.base_url,
            "cgi/search.pl",
            &[
                ("search_terms", text),
                ("search_simple", "1"),
                ("json", "1"),
                ("page_size", PAGE_SIZE),
            ],
        )?;
        let found: SearchResponse = self.http.get_json(OPERATION, url, &[]).await?;
        Ok(found
            .products
            .into_iter()
            .filter_map(RemoteProduct::into_product)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct BarcodeResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    product: Option<RemoteProduct>,
}

impl BarcodeResponse {
    /// `status` is 1 only when the code is known.
    fn into_product(self) -> Option<ProductInfo> {
        if self.status != 1 {
            return None;
        }
        self.product.and_then(RemoteProduct::into_product)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<RemoteProduct>,
}

#[derive(Debug, Deserialize)]
struct RemoteProduct {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    image_front_small_url: Option<String>,
    #[serde(default)]
    categories: Option<String>,
}

impl RemoteProduct {
    /// Unnamed products are dropped.
    fn into_product(self) -> Option<ProductInfo> {
        let name = present(self.product_name)?;
        Some(ProductInfo {
            name,
            brand: present(self.brands).map(|b| first_listed(&b)),
            image_url: present(self.image_url).or_else(|| present(self.image_front_small_url)),
            barcode: present(self.code),
            category: present(self.categories).map(|c| first_listed(&c)),
        })
    }
}

/// Catalogue fields are comma-separated lists; keep the first entry.
fn first_listed(raw: &str) -> String {
    raw.split(',').next().unwrap_or(raw).trim().to_string()
}
