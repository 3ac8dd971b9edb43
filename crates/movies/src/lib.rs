//! Movie watchlist domain.
//!
//! Watchlist entries plus the catalogue-neutral movie shapes both metadata
//! sources are normalized into.

pub mod movie;
pub mod watchlist;

pub use movie::{
    MovieDetail, MovieRef, MovieSource, MovieSummary, TRENDING_PREFIX, parse_runtime,
};
pub use watchlist::{WatchFilter, WatchPatch, WatchStatus, WatchlistEntry, WatchlistStats};
