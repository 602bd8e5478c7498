//! Address resolution client (Nominatim HTTP API): reverse lookup for map
//! clicks, forward search for address mode. Numeric fields arrive as JSON
//! strings and are parsed at this boundary.

use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Coordinate, GeoPoint};

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/";
const USER_AGENT: &str = "freight-cost-estimator/1.0";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder returned no usable result")]
    NoResult,
}

#[derive(Clone)]
pub struct GeocodeClient {
    http: Client,
    base_url: Url,
}

impl GeocodeClient {
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base: &str) -> Result<Self, GeocodeError> {
        let base_url = Url::parse(base)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, base_url })
    }

    /// Display name for a coordinate. Callers fall back to
    /// [`GeoPoint::unnamed`] when this fails.
    pub async fn reverse(&self, coordinate: Coordinate) -> Result<String, GeocodeError> {
        let mut url = self.base_url.join("reverse")?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &coordinate.lat.to_string())
            .append_pair("lon", &coordinate.lng.to_string());

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body: ReverseDto = response.json().await?;
        body.display_name.ok_or(GeocodeError::NoResult)
    }

    /// Forward search: candidate points for a free-text query.
    pub async fn search(&self, query: &str) -> Result<Vec<GeoPoint>, GeocodeError> {
        let mut url = self.base_url.join("search")?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("q", query);

        let response = self.http.get(url).send().await?.error_for_status()?;
        let results: Vec<SearchResultDto> = response.json().await?;
        Ok(results.into_iter().filter_map(point_from_result).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ReverseDto {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResultDto {
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

fn point_from_result(result: SearchResultDto) -> Option<GeoPoint> {
    let lat = result.lat.as_deref()?.parse::<f64>().ok()?;
    let lng = result.lon.as_deref()?.parse::<f64>().ok()?;
    Some(match result.display_name {
        Some(name) => GeoPoint::new(lat, lng, name),
        None => GeoPoint::unnamed(lat, lng),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_results_parse_string_coordinates() {
        let payload = r#"[
            {"lat": "48.8534951", "lon": "2.3483915", "display_name": "Paris, France"},
            {"lat": "not-a-number", "lon": "2.0", "display_name": "Broken"},
            {"lat": "51.5074", "lon": "-0.1278"}
        ]"#;
        let results: Vec<SearchResultDto> = serde_json::from_str(payload).unwrap();
        let points: Vec<GeoPoint> = results.into_iter().filter_map(point_from_result).collect();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].name, "Paris, France");
        assert_eq!(points[0].lat, 48.8534951);
        // A nameless hit keeps its raw coordinates as the label.
        assert_eq!(points[1].name, "51.5074, -0.1278");
    }

    #[test]
    fn reverse_without_display_name_is_no_result() {
        let body: ReverseDto = serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
        assert!(body.display_name.is_none());
    }
}
