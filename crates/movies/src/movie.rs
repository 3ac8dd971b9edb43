use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trackers_core::{TrackerError, TrackerResult};

/// Prefix marking identifiers that belong to the trending catalogue.
pub const TRENDING_PREFIX: &str = "tmdb-";

/// Catalogue a movie record came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieSource {
    /// Primary title search catalogue.
    #[default]
    Omdb,
    /// Trending catalogue.
    Tmdb,
}

/// Where a movie identifier must be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieRef {
    /// Primary catalogue identifier, e.g. `tt0133093`.
    Primary(String),
    /// Trending catalogue numeric identifier (from `tmdb-<n>`).
    Trending(u64),
}

impl MovieRef {
    pub fn parse(raw: &str) -> TrackerResult<Self> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(TrackerError::validation("movie identifier is required"));
        }
        match id.strip_prefix(TRENDING_PREFIX) {
            Some(rest) => rest
                .parse::<u64>()
                .map(MovieRef::Trending)
                .map_err(|_| TrackerError::validation(format!("malformed trending id `{id}`"))),
            None => Ok(MovieRef::Primary(id.to_string())),
        }
    }

    /// Identifier as stored on a watchlist entry.
    pub fn to_id(&self) -> String {
        match self {
            MovieRef::Primary(id) => id.clone(),
            MovieRef::Trending(n) => format!("{TRENDING_PREFIX}{n}"),
        }
    }

    pub fn source(&self) -> MovieSource {
        match self {
            MovieRef::Primary(_) => MovieSource::Omdb,
            MovieRef::Trending(_) => MovieSource::Tmdb,
        }
    }
}

/// One search or trending result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: String,
    pub title: String,
    pub year: Option<String>,
    pub poster: Option<String>,
    pub source: MovieSource,
}

/// Full movie record, normalized across catalogues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: String,
    pub title: String,
    pub year: Option<String>,
    pub poster: Option<String>,
    pub plot: Option<String>,
    pub genres: Vec<String>,
    pub director: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub rating: Option<f64>,
    pub source: MovieSource,
    pub fetched_at: DateTime<Utc>,
}

/// Parse runtimes such as `"136 min"` or `"136"`.
pub fn parse_runtime(raw: &str) -> Option<u32> {
    raw.split_whitespace().next()?.parse().ok().filter(|m| *m > 0)
}
