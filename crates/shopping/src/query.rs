//! Product lookup queries.

use trackers_core::{TrackerError, TrackerResult};

use crate::item::ProductInfo;

/// How a product query is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductQuery {
    /// Digits only: exact barcode lookup.
    Barcode(String),
    /// Anything else: fuzzy text search.
    Text(String),
}

impl ProductQuery {
    pub fn parse(raw: &str) -> TrackerResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TrackerError::validation("search query is required"));
        }
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            Ok(ProductQuery::Barcode(trimmed.to_string()))
        } else {
            Ok(ProductQuery::Text(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProductQuery::Barcode(code) | ProductQuery::Text(code) => code,
        }
    }

    /// Pick the result a lookup resolves to.
    ///
    /// Barcodes only accept a candidate with exactly that code; text queries
    /// take the first result.
    pub fn resolve(&self, candidates: Vec<ProductInfo>) -> TrackerResult<ProductInfo> {
        match self {
            ProductQuery::Barcode(code) => candidates
                .into_iter()
                .find(|p| p.barcode.as_deref() == Some(code.as_str()))
                .ok_or_else(|| TrackerError::not_found(format!("no product with barcode {code}"))),
            ProductQuery::Text(text) => candidates
                .into_iter()
                .next()
                .ok_or_else(|| TrackerError::not_found(format!("no products match \"{text}\""))),
        }
    }
}
