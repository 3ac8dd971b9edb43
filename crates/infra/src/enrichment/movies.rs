use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use trackers_core::{TrackerError, TrackerResult};
use trackers_movies::{MovieDetail, MovieRef, WatchlistEntry};

use super::Enricher;
use crate::external::{MovieCatalog, TrendingCatalog};

/// Detail lookup routed by identifier: `tmdb-<n>` goes to the trending
/// catalogue, anything else to the primary one.
#[derive(Clone)]
pub struct MovieEnricher {
    primary: Arc<dyn MovieCatalog>,
    trending: Arc<dyn TrendingCatalog>,
}

impl MovieEnricher {
    pub fn new(primary: Arc<dyn MovieCatalog>, trending: Arc<dyn TrendingCatalog>) -> Self {
        Self { primary, trending }
    }

    pub async fn detail(&self, movie: &MovieRef, now: DateTime<Utc>) -> TrackerResult<MovieDetail> {
        match movie {
            MovieRef::Primary(id) => self.primary.detail(id, now).await,
            MovieRef::Trending(id) => self.trending.detail(*id, now).await,
        }
    }
}

#[async_trait]
impl Enricher<WatchlistEntry> for MovieEnricher {
    async fn enrich(&self, entry: &WatchlistEntry, now: DateTime<Utc>) -> TrackerResult<MovieDetail> {
        let movie = entry.movie_ref()?;
        self.detail(&movie, now).await
    }
}

/// Turn a title or identifier typed by the user into a [`MovieRef`].
///
/// Identifiers (`tt…`, `tmdb-…`) are used as given; anything else is a title
/// search whose first hit wins.
pub async fn resolve_movie(catalog: &dyn MovieCatalog, query: &str) -> TrackerResult<MovieRef> {
    let query = query.trim();
    if query.is_empty() {
        return Err(TrackerError::validation("movie title or id is required"));
    }
    if looks_like_id(query) {
        return MovieRef::parse(query);
    }
    let hit = catalog
        .search(query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| TrackerError::not_found(format!("no movies match \"{query}\"")))?;
    MovieRef::parse(&hit.id)
}

fn looks_like_id(query: &str) -> bool {
    let imdb = query
        .strip_prefix("tt")
        .is_some_and(|rest| rest.len() >= 7 && rest.chars().all(|c| c.is_ascii_digit()));
    imdb || query.starts_with(trackers_movies::TRENDING_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;
    use trackers_movies::{MovieSource, MovieSummary};

    #[derive(Default)]
    struct Calls(Mutex<Vec<String>>);

    impl Calls {
        fn push(&self, call: String) {
            self.0.lock().unwrap().push(call);
        }

        fn all(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    fn detail(id: &str, source: MovieSource, now: DateTime<Utc>) -> MovieDetail {
        MovieDetail {
            id: id.into(),
            title: format!("Movie {id}"),
            year: None,
            poster: None,
            plot: None,
            genres: vec![],
            director: None,
            runtime_minutes: None,
            rating: None,
            source,
            fetched_at: now,
        }
    }

    #[async_trait]
    impl MovieCatalog for Calls {
        async fn search(&self, title: &str) -> TrackerResult<Vec<MovieSummary>> {
            self.push(format!("search:{title}"));
            Ok(vec![MovieSummary {
                id: "tt0078748".into(),
                title: "Alien".into(),
                year: Some("1979".into()),
                poster: None,
                source: MovieSource::Omdb,
            }])
        }

        async fn detail(&self, id: &str, now: DateTime<Utc>) -> TrackerResult<MovieDetail> {
            self.push(format!("primary:{id}"));
            Ok(detail(id, MovieSource::Omdb, now))
        }
    }

    #[async_trait]
    impl TrendingCatalog for Calls {
        async fn trending(&self) -> TrackerResult<Vec<MovieSummary>> {
            Ok(vec![])
        }

        async fn detail(&self, id: u64, now: DateTime<Utc>) -> TrackerResult<MovieDetail> {
            self.push(format!("trending:{id}"));
            Ok(detail(&format!("tmdb-{id}"), MovieSource::Tmdb, now))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn prefixed_ids_route_to_trending_catalogue() {
        let calls = Arc::new(Calls::default());
        let enricher = MovieEnricher::new(calls.clone(), calls.clone());

        let trending = WatchlistEntry::draft(&MovieRef::Trending(603), now());
        let primary = WatchlistEntry::draft(&MovieRef::Primary("tt0133093".into()), now());
        assert_eq!(enricher.enrich(&trending, now()).await.unwrap().id, "tmdb-603");
        enricher.enrich(&primary, now()).await.unwrap();

        assert_eq!(calls.all(), ["trending:603", "primary:tt0133093"]);
    }

    #[tokio::test]
    async fn titles_are_searched_and_ids_are_not() {
        let calls = Calls::default();

        assert_eq!(
            resolve_movie(&calls, "alien").await.unwrap(),
            MovieRef::Primary("tt0078748".into())
        );
        assert_eq!(
            resolve_movie(&calls, "tmdb-42").await.unwrap(),
            MovieRef::Trending(42)
        );
        assert_eq!(
            resolve_movie(&calls, "tt0133093").await.unwrap(),
            MovieRef::Primary("tt0133093".into())
        );
        assert_eq!(calls.all(), ["search:alien"]);
        assert!(resolve_movie(&calls, " ").await.is_err());
    }
}
