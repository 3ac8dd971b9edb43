use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trackers_core::{Enrichable, Entity, EntityId, Projectable, TrackerError, TrackerResult};

use crate::movie::{MovieDetail, MovieRef, MovieSource};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WatchStatus {
    #[default]
    #[serde(rename = "to-watch")]
    ToWatch,
    #[serde(rename = "watched")]
    Watched,
}

impl WatchStatus {
    pub fn toggled(self) -> Self {
        match self {
            WatchStatus::ToWatch => WatchStatus::Watched,
            WatchStatus::Watched => WatchStatus::ToWatch,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WatchStatus::ToWatch => "to-watch",
            WatchStatus::Watched => "watched",
        }
    }
}

impl core::str::FromStr for WatchStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "to-watch" | "towatch" => Ok(WatchStatus::ToWatch),
            "watched" => Ok(WatchStatus::Watched),
            other => Err(TrackerError::validation(format!("unknown watch status `{other}`"))),
        }
    }
}

/// A movie on the watchlist, keyed by its catalogue identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub runtime_minutes: Option<u32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub source: MovieSource,
    #[serde(default)]
    pub status: WatchStatus,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub watched_at: Option<DateTime<Utc>>,
}

impl WatchlistEntry {
    /// An entry awaiting its detail lookup.
    pub fn draft(movie: &MovieRef, now: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::new(movie.to_id()),
            title: String::new(),
            year: None,
            poster: None,
            plot: None,
            genres: Vec::new(),
            director: None,
            runtime_minutes: None,
            rating: None,
            source: movie.source(),
            status: WatchStatus::ToWatch,
            added_at: now,
            watched_at: None,
        }
    }

    /// Patch that flips watched state, stamping the time when marking watched.
    pub fn toggle_patch(&self, now: DateTime<Utc>) -> WatchPatch {
        let status = self.status.toggled();
        WatchPatch {
            status: Some(status),
            watched_at: Some((status == WatchStatus::Watched).then_some(now)),
        }
    }

    pub fn movie_ref(&self) -> TrackerResult<MovieRef> {
        MovieRef::parse(self.id.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchPatch {
    pub status: Option<WatchStatus>,
    /// `Some(None)` clears the watched time.
    pub watched_at: Option<Option<DateTime<Utc>>>,
}

impl Entity for WatchlistEntry {
    type Status = WatchStatus;
    type Patch = WatchPatch;

    const STORAGE_KEY: &'static str = "watchlist";
    const KIND: &'static str = "movie";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn natural_key(&self) -> String {
        self.id.to_string()
    }

    /// The catalogue id, or the title ignoring case once it is known.
    fn matches_key(&self, key: &str) -> bool {
        self.id.as_str() == key || (!self.title.is_empty() && self.title.to_lowercase() == key.to_lowercase())
    }

    fn status(&self) -> WatchStatus {
        self.status
    }

    fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    fn validate(&self) -> TrackerResult<()> {
        self.movie_ref().map(|_| ())
    }

    fn apply_patch(&mut self, patch: WatchPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(watched_at) = patch.watched_at {
            self.watched_at = watched_at;
        }
    }
}

impl Enrichable for WatchlistEntry {
    type Enrichment = MovieDetail;

    fn merge_enrichment(&mut self, detail: MovieDetail) {
        self.title = detail.title;
        self.year = detail.year;
        self.poster = detail.poster;
        self.plot = detail.plot;
        self.genres = detail.genres;
        self.director = detail.director;
        self.runtime_minutes = detail.runtime_minutes;
        self.rating = detail.rating;
        self.source = detail.source;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchFilter {
    Status(WatchStatus),
    Genre(String),
}

impl Projectable for WatchlistEntry {
    type Filter = WatchFilter;

    fn matches(&self, filter: &WatchFilter) -> bool {
        match filter {
            WatchFilter::Status(status) => self.status == *status,
            WatchFilter::Genre(genre) => self
                .genres
                .iter()
                .any(|g| g.eq_ignore_ascii_case(genre.trim())),
        }
    }

    fn display_name(&self) -> &str {
        if self.title.is_empty() {
            self.id.as_str()
        } else {
            &self.title
        }
    }
}

/// Counts per watch state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WatchlistStats {
    pub total: usize,
    pub to_watch: usize,
    pub watched: usize,
}

impl WatchlistStats {
    pub fn compute<'a>(entries: impl IntoIterator<Item = &'a WatchlistEntry>) -> Self {
        entries
            .into_iter()
            .fold(Self::default(), |mut stats, entry| {
                stats.total += 1;
                match entry.status {
                    WatchStatus::ToWatch => stats.to_watch += 1,
                    WatchStatus::Watched => stats.watched += 1,
                }
                stats
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 2, 20, 0, 0).unwrap()
    }

    fn detail() -> MovieDetail {
        MovieDetail {
            id: "tt0133093".into(),
            title: "The Matrix".into(),
            year: Some("1999".into()),
            poster: None,
            plot: Some("A hacker learns the truth.".into()),
            genres: vec!["Action".into(), "Sci-Fi".into()],
            director: Some("Lana Wachowski, Lilly Wachowski".into()),
            runtime_minutes: Some(136),
            rating: Some(8.7),
            source: MovieSource::Omdb,
            fetched_at: now(),
        }
    }

    #[test]
    fn status_serializes_with_dash() {
        assert_eq!(serde_json::to_string(&WatchStatus::ToWatch).unwrap(), "\"to-watch\"");
        assert_eq!("to_watch".parse::<WatchStatus>().unwrap(), WatchStatus::ToWatch);
    }

    #[test]
    fn toggle_stamps_and_clears_watched_time() {
        let mut entry = WatchlistEntry::draft(&MovieRef::Primary("tt0133093".into()), now());
        let patch = entry.toggle_patch(now());
        entry.apply_patch(patch);
        assert_eq!(entry.status, WatchStatus::Watched);
        assert_eq!(entry.watched_at, Some(now()));

        let patch = entry.toggle_patch(now());
        entry.apply_patch(patch);
        assert_eq!(entry.status, WatchStatus::ToWatch);
        assert_eq!(entry.watched_at, None);
    }

    #[test]
    fn merge_keeps_identity_and_status() {
        let mut entry = WatchlistEntry::draft(&MovieRef::Primary("tt0133093".into()), now());
        entry.status = WatchStatus::Watched;
        entry.merge_enrichment(detail());

        assert_eq!(entry.id.as_str(), "tt0133093");
        assert_eq!(entry.title, "The Matrix");
        assert_eq!(entry.status, WatchStatus::Watched);
        assert!(entry.matches(&WatchFilter::Genre("sci-fi".into())));
    }

    #[test]
    fn answers_to_id_and_title() {
        let mut entry = WatchlistEntry::draft(&MovieRef::Primary("tt0133093".into()), now());
        assert!(!entry.matches_key(""));
        entry.merge_enrichment(detail());

        assert_eq!(entry.natural_key(), "tt0133093");
        assert!(entry.matches_key("tt0133093"));
        assert!(entry.matches_key("the matrix"));
        assert!(!entry.matches_key("The Matrix Reloaded"));
    }

    #[test]
    fn stats_count_each_state() {
        let mut a = WatchlistEntry::draft(&MovieRef::Trending(1), now());
        a.status = WatchStatus::Watched;
        let b = WatchlistEntry::draft(&MovieRef::Trending(2), now());
        let stats = WatchlistStats::compute([&a, &b]);
        assert_eq!(
            stats,
            WatchlistStats {
                total: 2,
                to_watch: 1,
                watched: 1
            }
        );
    }
}
