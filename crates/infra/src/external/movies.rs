//! Movie metadata: the OMDb-style primary catalogue and the TMDB-style
//! trending catalogue, both normalized into [`MovieSummary`]/[`MovieDetail`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use trackers_core::{FetchError, TrackerError, TrackerResult};
use trackers_movies::{MovieDetail, MovieRef, MovieSource, MovieSummary, parse_runtime};

use super::{HttpClient, MovieCatalog, TrendingCatalog, present};
use crate::config::ApiEndpoint;

pub const TMDB_POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Clone)]
pub struct OmdbClient {
    http: HttpClient,
    endpoint: ApiEndpoint,
}

impl OmdbClient {
    pub fn new(http: HttpClient, endpoint: ApiEndpoint) -> Self {
        Self { http, endpoint }
    }

    async fn call<T>(&self, operation: &str, params: &[(&str, &str)]) -> TrackerResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut params = params.to_vec();
        let key = self.endpoint.api_key.as_deref().unwrap_or_default();
        params.push(("apikey", key));
        let url = HttpClient::url(operation, &self.endpoint.base_url, "", &params)?;
        let body: OmdbEnvelope<T> = self.http.get_json(operation, url, &[]).await?;
        body.into_result(operation)
    }
}

#[async_trait]
impl MovieCatalog for OmdbClient {
    async fn search(&self, title: &str) -> TrackerResult<Vec<MovieSummary>> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TrackerError::validation("movie title is required"));
        }
        let found: OmdbSearch = self
            .call("movie search", &[("s", title), ("type", "movie")])
            .await?;
        Ok(found.search.into_iter().map(OmdbHit::into_summary).collect())
    }

    async fn detail(&self, id: &str, now: DateTime<Utc>) -> TrackerResult<MovieDetail> {
        let found: OmdbDetail = self
            .call("movie details", &[("i", id), ("plot", "short")])
            .await?;
        Ok(found.into_detail(now))
    }
}

/// OMDb wraps every reply in `Response: "True" | "False"`.
#[derive(Debug, Deserialize)]
struct OmdbEnvelope<T> {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(flatten)]
    body: Option<T>,
}

impl<T> OmdbEnvelope<T> {
    fn into_result(self, operation: &str) -> TrackerResult<T> {
        if self.response.eq_ignore_ascii_case("true") {
            return self
                .body
                .ok_or_else(|| FetchError::parse(operation, "missing body").into());
        }
        let reason = self.error.unwrap_or_else(|| "no results".into());
        if reason.to_ascii_lowercase().contains("not found") {
            Err(TrackerError::not_found(reason))
        } else {
            Err(FetchError::network(operation, reason).into())
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmdbSearch {
    #[serde(rename = "Search", default)]
    search: Vec<OmdbHit>,
}

#[derive(Debug, Deserialize)]
struct OmdbHit {
    #[serde(rename = "imdbID")]
    id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
}

impl OmdbHit {
    fn into_summary(self) -> MovieSummary {
        MovieSummary {
            id: self.id,
            title: self.title,
            year: present(self.year),
            poster: present(self.poster),
            source: MovieSource::Omdb,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmdbDetail {
    #[serde(rename = "imdbID")]
    id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
    #[serde(rename = "Genre", default)]
    genre: Option<String>,
    #[serde(rename = "Director", default)]
    director: Option<String>,
    #[serde(rename = "Runtime", default)]
    runtime: Option<String>,
    #[serde(rename = "imdbRating", default)]
    rating: Option<String>,
}

impl OmdbDetail {
    fn into_detail(self, now: DateTime<Utc>) -> MovieDetail {
        MovieDetail {
            id: self.id,
            title: self.title,
            year: present(self.year),
            poster: present(self.poster),
            plot: present(self.plot),
            genres: present(self.genre)
                .map(|g| {
                    g.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            director: present(self.director),
            runtime_minutes: present(self.runtime).as_deref().and_then(parse_runtime),
            rating: present(self.rating).and_then(|r| r.parse().ok()),
            source: MovieSource::Omdb,
            fetched_at: now,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: HttpClient,
    endpoint: ApiEndpoint,
}

impl TmdbClient {
    pub fn new(http: HttpClient, endpoint: ApiEndpoint) -> Self {
        Self { http, endpoint }
    }

    fn key(&self, operation: &str) -> TrackerResult<&str> {
        self.endpoint.api_key.as_deref().ok_or_else(|| {
            FetchError::network(operation, "TRACKERS_TMDB_API_KEY is not set").into()
        })
    }
}

#[async_trait]
impl TrendingCatalog for TmdbClient {
    async fn trending(&self) -> TrackerResult<Vec<MovieSummary>> {
        const OPERATION: &str = "trending movies";
        let key = self.key(OPERATION)?;
        let url = HttpClient::url(
            OPERATION,
            &self.endpoint.base_url,
            "trending/movie/week",
            &[("api_key", key)],
        )?;
        let page: TmdbPage = self.http.get_json(OPERATION, url, &[]).await?;
        Ok(page.results.into_iter().map(TmdbMovie::into_summary).collect())
    }

    async fn detail(&self, id: u64, now: DateTime<Utc>) -> TrackerResult<MovieDetail> {
        const OPERATION: &str = "trending movie details";
        let key = self.key(OPERATION)?;
        let url = HttpClient::url(
            OPERATION,
            &self.endpoint.base_url,
            &format!("movie/{id}"),
            &[("api_key", key), ("append_to_response", "credits")],
        )?;
        let movie: Option<TmdbMovie> = self.http.get_json_or_not_found(OPERATION, url, &[]).await?;
        movie
            .map(|m| m.into_detail(now))
            .ok_or_else(|| TrackerError::not_found(format!("no movie {}", MovieRef::Trending(id).to_id())))
    }
}

#[derive(Debug, Deserialize)]
struct TmdbPage {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    vote_average: Option<f64>,
    #[serde(default)]
    credits: Option<TmdbCredits>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    crew: Vec<TmdbCrew>,
}

#[derive(Debug, Deserialize)]
struct TmdbCrew {
    #[serde(default)]
    job: String,
    name: String,
}

impl TmdbMovie {
    fn title(&self) -> String {
        present(self.title.clone())
            .or_else(|| present(self.name.clone()))
            .unwrap_or_else(|| "Untitled".to_string())
    }

    fn year(&self) -> Option<String> {
        present(self.release_date.clone()).and_then(|d| d.get(..4).map(str::to_string))
    }

    fn poster(&self) -> Option<String> {
        present(self.poster_path.clone()).map(|p| format!("{TMDB_POSTER_BASE}{p}"))
    }

    fn into_summary(self) -> MovieSummary {
        MovieSummary {
            id: MovieRef::Trending(self.id).to_id(),
            title: self.title(),
            year: self.year(),
            poster: self.poster(),
            source: MovieSource::Tmdb,
        }
    }

    fn into_detail(self, now: DateTime<Utc>) -> MovieDetail {
        let directors: Vec<String> = self
            .credits
            .iter()
            .flat_map(|c| c.crew.iter())
            .filter(|c| c.job == "Director")
            .map(|c| c.name.clone())
            .collect();

        MovieDetail {
            id: MovieRef::Trending(self.id).to_id(),
            title: self.title(),
            year: self.year(),
            poster: self.poster(),
            plot: present(self.overview),
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            director: (!directors.is_empty()).then(|| directors.join(", ")),
            runtime_minutes: self.runtime.filter(|m| *m > 0),
            rating: self.vote_average.filter(|r| *r > 0.0),
            source: MovieSource::Tmdb,
            fetched_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn omdb_detail_normalizes_placeholders() {
        let env: OmdbEnvelope<OmdbDetail> = serde_json::from_str(
            r#"{"Title":"The Matrix","Year":"1999","Runtime":"136 min",
                "Genre":"Action, Sci-Fi","Director":"Lana Wachowski, Lilly Wachowski",
                "Plot":"N/A","Poster":"N/A","imdbRating":"8.7","imdbID":"tt0133093",
                "Response":"True"}"#,
        )
        .unwrap();
        let detail = env.into_result("movie details").unwrap().into_detail(now());

        assert_eq!(detail.id, "tt0133093");
        assert_eq!(detail.genres, ["Action", "Sci-Fi"]);
        assert_eq!(detail.runtime_minutes, Some(136));
        assert_eq!(detail.rating, Some(8.7));
        assert_eq!(detail.plot, None);
        assert_eq!(detail.poster, None);
    }

    #[test]
    fn omdb_false_response_maps_to_not_found_or_fetch() {
        let env: OmdbEnvelope<OmdbSearch> =
            serde_json::from_str(r#"{"Response":"False","Error":"Movie not found!"}"#).unwrap();
        assert!(matches!(env.into_result("movie search"), Err(TrackerError::NotFound(_))));

        let env: OmdbEnvelope<OmdbSearch> =
            serde_json::from_str(r#"{"Response":"False","Error":"Invalid API key!"}"#).unwrap();
        assert!(matches!(env.into_result("movie search"), Err(TrackerError::Fetch(_))));
    }

    #[test]
    fn omdb_search_hits() {
        let env: OmdbEnvelope<OmdbSearch> = serde_json::from_str(
            r#"{"Search":[{"Title":"Alien","Year":"1979","imdbID":"tt0078748","Type":"movie","Poster":"https://img.test/a.jpg"}],
                "totalResults":"1","Response":"True"}"#,
        )
        .unwrap();
        let hits: Vec<_> = env
            .into_result("movie search")
            .unwrap()
            .search
            .into_iter()
            .map(OmdbHit::into_summary)
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "tt0078748");
        assert_eq!(hits[0].source, MovieSource::Omdb);
    }

    #[test]
    fn tmdb_detail_uses_prefixed_id_and_poster_base() {
        let movie: TmdbMovie = serde_json::from_str(
            r#"{"id":603,"title":"The Matrix","release_date":"1999-03-30",
                "poster_path":"/p.jpg","overview":"Neo wakes up.",
                "genres":[{"id":28,"name":"Action"}],"runtime":136,"vote_average":8.2,
                "credits":{"crew":[{"job":"Producer","name":"Joel Silver"},
                                   {"job":"Director","name":"Lana Wachowski"}]}}"#,
        )
        .unwrap();
        let detail = movie.into_detail(now());

        assert_eq!(detail.id, "tmdb-603");
        assert_eq!(detail.year.as_deref(), Some("1999"));
        assert_eq!(
            detail.poster.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/p.jpg")
        );
        assert_eq!(detail.director.as_deref(), Some("Lana Wachowski"));
        assert_eq!(detail.source, MovieSource::Tmdb);
    }

    #[test]
    fn tmdb_trending_page() {
        let page: TmdbPage = serde_json::from_str(
            r#"{"page":1,"results":[{"id":1,"title":"A"},{"id":2,"name":"B","release_date":""}]}"#,
        )
        .unwrap();
        let ids: Vec<_> = page
            .results
            .into_iter()
            .map(TmdbMovie::into_summary)
            .map(|s| (s.id, s.title, s.year))
            .collect();
        assert_eq!(
            ids,
            [
                ("tmdb-1".to_string(), "A".to_string(), None),
                ("tmdb-2".to_string(), "B".to_string(), None)
            ]
        );
    }
}
