//! Text rendering of projections and stats.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use trackers_movies::{MovieSummary, WatchStatus, WatchlistEntry, WatchlistStats};
use trackers_shipping::{PROGRESS_STEPS, Shipment, ShipmentStats, progress_step};
use trackers_shopping::{ShoppingItem, ShoppingTotals};

pub fn progress_bar(shipment: &Shipment) -> String {
    let step = progress_step(shipment.status);
    (0..PROGRESS_STEPS)
        .map(|i| if i <= step { '#' } else { '-' })
        .collect()
}

fn date(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

pub fn shipment_line(s: &Shipment) -> String {
    let mut line = format!(
        "{}  [{}] {:<18} {:<12} {}",
        s.id,
        progress_bar(s),
        s.tracking_number,
        s.carrier.name(),
        s.status.label()
    );
    if let Some(label) = &s.label {
        let _ = write!(line, "  \"{label}\"");
    }
    if let Some(eta) = s.estimated_delivery {
        let _ = write!(line, "  eta {}", date(eta));
    }
    if let Some(place) = s.latest_location() {
        let _ = write!(line, "  @ {place}");
    }
    line
}

pub fn shipment_stats(stats: &ShipmentStats) -> String {
    let mut line = format!("{} tracked, {} active", stats.total, stats.active);
    for (status, count) in &stats.by_status {
        let _ = write!(line, ", {} {}", count, status.label().to_lowercase());
    }
    line
}

pub fn money(amount: f64, currency: &str) -> String {
    format!("{amount:.2} {currency}")
}

pub fn shopping_line(item: &ShoppingItem, currency: &str) -> String {
    let mark = if item.purchased { 'x' } else { ' ' };
    let mut line = format!(
        "{}  [{mark}] {} x{}  {}  ({})",
        item.id,
        item.name,
        item.quantity,
        money(item.line_total(), currency),
        item.category
    );
    if let Some(priority) = item.priority {
        let _ = write!(line, "  !{}", priority.as_str());
    }
    if let Some(brand) = &item.brand {
        let _ = write!(line, "  {brand}");
    }
    if let Some(notes) = &item.notes {
        let _ = write!(line, "  - {notes}");
    }
    line
}

pub fn shopping_totals(totals: &ShoppingTotals, currency: &str, rate: f64) -> String {
    format!(
        "{} items ({} purchased): remaining {}, purchased {}, total {}",
        totals.items,
        totals.purchased_items,
        money(totals.remaining_cost * rate, currency),
        money(totals.purchased_cost * rate, currency),
        money(totals.total_cost() * rate, currency),
    )
}

pub fn movie_line(entry: &WatchlistEntry) -> String {
    let mark = match entry.status {
        WatchStatus::Watched => 'x',
        WatchStatus::ToWatch => ' ',
    };
    let mut line = format!("{:<12} [{mark}] {}", entry.id, entry.title);
    if let Some(year) = &entry.year {
        let _ = write!(line, " ({year})");
    }
    if !entry.genres.is_empty() {
        let _ = write!(line, "  {}", entry.genres.join("/"));
    }
    if let Some(rating) = entry.rating {
        let _ = write!(line, "  {rating:.1}");
    }
    if let Some(minutes) = entry.runtime_minutes {
        let _ = write!(line, "  {minutes} min");
    }
    line
}

pub fn movie_summary(m: &MovieSummary) -> String {
    match &m.year {
        Some(year) => format!("{:<12} {} ({year})", m.id, m.title),
        None => format!("{:<12} {}", m.id, m.title),
    }
}

pub fn watchlist_stats(stats: &WatchlistStats) -> String {
    format!(
        "{} movies: {} to watch, {} watched",
        stats.total, stats.to_watch, stats.watched
    )
}
