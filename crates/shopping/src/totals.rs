//! List totals and currency conversion.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::item::ShoppingItem;

/// Aggregates shown next to the list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShoppingTotals {
    pub items: usize,
    pub purchased_items: usize,
    /// Σ price × quantity of items still to buy.
    pub remaining_cost: f64,
    /// Σ price × quantity of items already bought.
    pub purchased_cost: f64,
    pub by_category: BTreeMap<String, usize>,
}

impl ShoppingTotals {
    pub fn compute<'a>(items: impl IntoIterator<Item = &'a ShoppingItem>) -> Self {
        let mut totals = Self::default();
        for item in items {
            totals.items += 1;
            if item.purchased {
                totals.purchased_items += 1;
                totals.purchased_cost += item.line_total();
            } else {
                totals.remaining_cost += item.line_total();
            }
            *totals.by_category.entry(item.category.clone()).or_default() += 1;
        }
        totals
    }

    pub fn total_cost(&self) -> f64 {
        self.remaining_cost + self.purchased_cost
    }
}

/// Exchange rates relative to `base` (1 base = `rates[code]` code).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    pub base: String,
    pub rates: HashMap<String, f64>,
}

impl ExchangeRates {
    pub fn new(base: &str, rates: HashMap<String, f64>) -> Self {
        Self {
            base: base.to_ascii_uppercase(),
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
                .collect(),
        }
    }

    pub fn rate(&self, currency: &str) -> Option<f64> {
        let currency = currency.to_ascii_uppercase();
        if currency == self.base {
            return Some(1.0);
        }
        self.rates.get(&currency).copied().filter(|r| r.is_finite() && *r > 0.0)
    }

    /// Convert an amount in the base currency; `None` for unknown currencies.
    pub fn convert(&self, amount: f64, to: &str) -> Option<f64> {
        self.rate(to).map(|rate| amount * rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn sums_split_by_purchased_state() {
        let now = Utc::now();
        let mut bought = ShoppingItem::draft("Coffee", now).with_price(8.0).with_quantity(2);
        bought.purchased = true;
        let items = vec![
            ShoppingItem::draft("Milk", now).with_price(1.25).with_quantity(4).with_category("dairy"),
            ShoppingItem::draft("Cheese", now).with_price(3.5).with_category("dairy"),
            bought,
        ];

        let totals = ShoppingTotals::compute(&items);
        assert_eq!(totals.items, 3);
        assert_eq!(totals.purchased_items, 1);
        assert!((totals.remaining_cost - 8.5).abs() < 1e-9);
        assert!((totals.purchased_cost - 16.0).abs() < 1e-9);
        assert_eq!(totals.by_category.get("dairy"), Some(&2));
        assert_eq!(totals.by_category.get("other"), Some(&1));
    }

    #[test]
    fn converts_with_case_insensitive_codes() {
        let rates = ExchangeRates::new("usd", HashMap::from([("eur".to_string(), 0.5)]));
        assert_eq!(rates.convert(10.0, "EUR"), Some(5.0));
        assert_eq!(rates.convert(10.0, "usd"), Some(10.0));
        assert_eq!(rates.convert(10.0, "GBP"), None);
    }
}
