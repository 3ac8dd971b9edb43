use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trackers_core::projection::deserialize_lenient_priority;
use trackers_core::{
    Enrichable, Entity, EntityId, Priority, Projectable, TrackerError, TrackerResult,
};

pub const DEFAULT_CATEGORY: &str = "other";

/// An entry on the shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Unit price in the list's base currency.
    #[serde(default)]
    pub price: f64,
    #[serde(default, deserialize_with = "deserialize_lenient_priority")]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub purchased: bool,
    #[serde(default)]
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_quantity() -> u32 {
    1
}

impl ShoppingItem {
    /// A new unpurchased item with quantity 1.
    pub fn draft(name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::generate(),
            name: name.trim().to_string(),
            brand: None,
            image_url: None,
            barcode: None,
            category: default_category(),
            quantity: 1,
            price: 0.0,
            priority: None,
            purchased: false,
            notes: None,
            added_at: now,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = normalize_category(category);
        self
    }

    pub fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_barcode(mut self, barcode: &str) -> Self {
        let barcode = barcode.trim();
        self.barcode = (!barcode.is_empty()).then(|| barcode.to_string());
        self
    }

    /// Price × quantity.
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    /// Change quantity by `delta`, never dropping below one.
    pub fn adjust_quantity(&mut self, delta: i64) {
        let next = (i64::from(self.quantity) + delta).clamp(1, i64::from(u32::MAX));
        self.quantity = next as u32;
    }
}

fn normalize_category(raw: &str) -> String {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() {
        default_category()
    } else {
        trimmed
    }
}

/// User edits to an item; unset fields are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShoppingPatch {
    pub name: Option<String>,
    pub quantity: Option<u32>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub purchased: Option<bool>,
    pub notes: Option<String>,
}

/// Product metadata returned by the product lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
}

impl Entity for ShoppingItem {
    type Status = bool;
    type Patch = ShoppingPatch;

    const STORAGE_KEY: &'static str = "shopping_items";
    const KIND: &'static str = "item";

    fn id(&self) -> &EntityId {
        &self.id
    }

    /// The case-folded name. A barcode-only draft has no name until it is
    /// looked up, so it goes by its barcode.
    fn natural_key(&self) -> String {
        match &self.barcode {
            Some(code) if self.name.is_empty() => code.clone(),
            _ => self.name.to_lowercase(),
        }
    }

    fn matches_key(&self, key: &str) -> bool {
        self.name.to_lowercase() == key || self.barcode.as_deref() == Some(key)
    }

    fn status(&self) -> bool {
        self.purchased
    }

    fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    fn validate(&self) -> TrackerResult<()> {
        if self.name.is_empty() && self.barcode.is_none() {
            return Err(TrackerError::validation("item name is required"));
        }
        if self.quantity == 0 {
            return Err(TrackerError::validation("quantity must be at least 1"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(TrackerError::validation("price must be a non-negative number"));
        }
        Ok(())
    }

    fn apply_patch(&mut self, patch: ShoppingPatch) {
        if let Some(name) = patch.name {
            let name = name.trim();
            if !name.is_empty() {
                self.name = name.to_string();
            }
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity.max(1);
        }
        if let Some(price) = patch.price.filter(|p| p.is_finite() && *p >= 0.0) {
            self.price = price;
        }
        if let Some(category) = patch.category {
            self.category = normalize_category(&category);
        }
        if patch.priority.is_some() {
            self.priority = patch.priority;
        }
        if let Some(purchased) = patch.purchased {
            self.purchased = purchased;
        }
        if let Some(notes) = patch.notes {
            let notes = notes.trim().to_string();
            self.notes = (!notes.is_empty()).then_some(notes);
        }
    }
}

impl Enrichable for ShoppingItem {
    type Enrichment = ProductInfo;

    fn merge_enrichment(&mut self, product: ProductInfo) {
        if self.name.is_empty() && !product.name.trim().is_empty() {
            self.name = product.name.trim().to_string();
        }
        if product.brand.is_some() {
            self.brand = product.brand;
        }
        if product.image_url.is_some() {
            self.image_url = product.image_url;
        }
        if self.barcode.is_none() {
            self.barcode = product.barcode;
        }
        if self.category == DEFAULT_CATEGORY {
            if let Some(category) = product.category {
                self.category = normalize_category(&category);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShoppingFilter {
    Category(String),
    Purchased(bool),
}

impl Projectable for ShoppingItem {
    type Filter = ShoppingFilter;

    fn matches(&self, filter: &ShoppingFilter) -> bool {
        match filter {
            ShoppingFilter::Category(category) => self.category.eq_ignore_ascii_case(category.trim()),
            ShoppingFilter::Purchased(purchased) => self.purchased == *purchased,
        }
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn price(&self) -> Option<f64> {
        Some(self.price)
    }

    fn priority(&self) -> Option<Priority> {
        self.priority
    }
}
