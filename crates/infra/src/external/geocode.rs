//! Nominatim-style place search.

use async_trait::async_trait;
use serde::Deserialize;

use trackers_core::{FetchError, TrackerResult};
use trackers_shipping::GeoPoint;

use super::{Geocoder, HttpClient};
use crate::config::ApiEndpoint;

const OPERATION: &str = "geocode";

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: HttpClient,
    endpoint: ApiEndpoint,
}

impl NominatimGeocoder {
    pub fn new(http: HttpClient, endpoint: ApiEndpoint) -> Self {
        Self { http, endpoint }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> TrackerResult<Option<GeoPoint>> {
        let url = HttpClient::url(
            OPERATION,
            &self.endpoint.base_url,
            "search",
            &[("q", place), ("format", "json"), ("limit", "1")],
        )?;
        let places: Vec<Place> = self.http.get_json(OPERATION, url, &[]).await?;
        Ok(first_point(places)?)
    }
}

/// Coordinates arrive as decimal strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

fn first_point(places: Vec<Place>) -> Result<Option<GeoPoint>, FetchError> {
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };
    let coord = |raw: &str| {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| FetchError::parse(OPERATION, format!("bad coordinate `{raw}`")))
    };
    Ok(Some(GeoPoint {
        lat: coord(&place.lat)?,
        lon: coord(&place.lon)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_result_wins() {
        let places: Vec<Place> = serde_json::from_str(
            r#"[{"lat":"40.6501","lon":"-73.9496","display_name":"Brooklyn"},
                {"lat":"0","lon":"0"}]"#,
        )
        .unwrap();
        let point = first_point(places).unwrap().unwrap();
        assert!((point.lat - 40.6501).abs() < 1e-9);
        assert!((point.lon + 73.9496).abs() < 1e-9);
    }

    #[test]
    fn no_results_is_none_and_garbage_is_an_error() {
        assert_eq!(first_point(vec![]).unwrap(), None);
        let bad = vec![Place {
            lat: "north".into(),
            lon: "1".into(),
        }];
        assert!(first_point(bad).is_err());
    }
}
