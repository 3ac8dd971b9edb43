//! View projection: filtered, ordered read view over a collection.
//!
//! Projections are pure. The same collection, filter and sort always yield the
//! same sequence, and nothing is mutated.

use core::cmp::Ordering;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::entity::Entity;
use crate::error::TrackerError;

/// User-assigned urgency of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Rank used for sorting: high=0, medium=1, low=2.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    /// Rank of an optional priority; missing or unknown ranks as medium.
    pub fn rank_of(priority: Option<Priority>) -> u8 {
        priority.map_or(Priority::Medium.rank(), Priority::rank)
    }

    /// Parse a priority tag, returning `None` for anything unrecognized.
    pub fn parse_lenient(tag: &str) -> Option<Priority> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::parse_lenient(s)
            .ok_or_else(|| TrackerError::validation(format!("unknown priority `{s}`")))
    }
}

/// Serde helper: stored priorities that are not recognized load as `None`.
pub fn deserialize_lenient_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Priority::parse_lenient))
}

/// Ordering applied to a projection. All sorts are stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Most recently added first.
    #[default]
    AddedDesc,
    /// Most expensive first.
    PriceDesc,
    /// Alphabetical by display name.
    NameAsc,
    /// high, medium, low; missing priority counts as medium.
    Priority,
}

impl FromStr for SortKey {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "added" | "date" | "added_desc" => Ok(SortKey::AddedDesc),
            "price" | "price_desc" => Ok(SortKey::PriceDesc),
            "name" | "name_asc" => Ok(SortKey::NameAsc),
            "priority" => Ok(SortKey::Priority),
            other => Err(TrackerError::validation(format!("unknown sort `{other}`"))),
        }
    }
}

/// An entity that can appear in a projection.
pub trait Projectable: Entity {
    /// Kind-specific attribute-equality filter (status tab, category, ...).
    type Filter: core::fmt::Debug;

    fn matches(&self, filter: &Self::Filter) -> bool;

    fn display_name(&self) -> &str;

    fn price(&self) -> Option<f64> {
        None
    }

    fn priority(&self) -> Option<Priority> {
        None
    }
}

/// Filter and order `items` for display.
///
/// `None` as filter keeps every item. Items comparing equal under `sort` keep
/// their input (insertion) order.
pub fn project<'a, E, I>(items: I, filter: Option<&E::Filter>, sort: SortKey) -> Vec<&'a E>
where
    E: Projectable,
    I: IntoIterator<Item = &'a E>,
{
    let mut view: Vec<&E> = items
        .into_iter()
        .filter(|item| filter.is_none_or(|f| item.matches(f)))
        .collect();

    match sort {
        SortKey::AddedDesc => view.sort_by(|a, b| b.added_at().cmp(&a.added_at())),
        SortKey::PriceDesc => view.sort_by(|a, b| {
            let pa = a.price().unwrap_or(0.0);
            let pb = b.price().unwrap_or(0.0);
            pb.total_cmp(&pa)
        }),
        SortKey::NameAsc => view.sort_by(|a, b| collate(a.display_name(), b.display_name())),
        SortKey::Priority => {
            view.sort_by_key(|item| Priority::rank_of(item.priority()));
        }
    }

    view
}

/// Case-insensitive collation with a deterministic tie-break on the raw text.
pub fn collate(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}
