//! Road routing client (OSRM HTTP API). Consumed only for its numeric
//! distance output; a missing path is a recoverable per-leg condition.

use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::Coordinate;

const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org/route/v1/driving/";
const USER_AGENT: &str = "freight-cost-estimator/1.0";

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no road route between the requested points")]
    NoRoute,
    #[error("routing api error: {0}")]
    Api(String),
}

#[derive(Clone)]
pub struct RoutingClient {
    http: Client,
    base_url: Url,
}

impl RoutingClient {
    pub fn new() -> Result<Self, RoutingError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base: &str) -> Result<Self, RoutingError> {
        let base_url = Url::parse(base)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, base_url })
    }

    /// Road distance in km between two coordinates.
    pub async fn road_distance_km(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<f64, RoutingError> {
        // OSRM wants lng,lat pairs.
        let mut url = self.base_url.join(&format!(
            "{},{};{},{}",
            origin.lng, origin.lat, destination.lng, destination.lat
        ))?;
        url.query_pairs_mut().append_pair("overview", "false");

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body: RouteResponseDto = response.json().await?;
        distance_from_response(body)
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponseDto {
    code: String,
    #[serde(default)]
    routes: Vec<RouteDto>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteDto {
    /// Meters.
    distance: f64,
}

fn distance_from_response(body: RouteResponseDto) -> Result<f64, RoutingError> {
    if !body.code.eq_ignore_ascii_case("ok") {
        if body.code.eq_ignore_ascii_case("noroute") {
            return Err(RoutingError::NoRoute);
        }
        return Err(RoutingError::Api(body.message.unwrap_or(body.code)));
    }

    body.routes
        .first()
        .map(|route| route.distance / 1000.0)
        .ok_or(RoutingError::NoRoute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_comes_back_in_km() {
        let body: RouteResponseDto = serde_json::from_str(
            r#"{"code": "Ok", "routes": [{"distance": 120000.0}, {"distance": 140000.0}]}"#,
        )
        .unwrap();
        assert_eq!(distance_from_response(body).unwrap(), 120.0);
    }

    #[test]
    fn no_route_code_is_a_typed_condition() {
        let body: RouteResponseDto =
            serde_json::from_str(r#"{"code": "NoRoute", "routes": []}"#).unwrap();
        assert!(matches!(
            distance_from_response(body),
            Err(RoutingError::NoRoute)
        ));
    }

    #[test]
    fn ok_with_no_routes_still_means_no_route() {
        let body: RouteResponseDto = serde_json::from_str(r#"{"code": "Ok"}"#).unwrap();
        assert!(matches!(
            distance_from_response(body),
            Err(RoutingError::NoRoute)
        ));
    }

    #[test]
    fn other_codes_surface_the_api_message() {
        let body: RouteResponseDto = serde_json::from_str(
            r#"{"code": "InvalidQuery", "message": "coordinates out of range"}"#,
        )
        .unwrap();
        match distance_from_response(body) {
            Err(RoutingError::Api(message)) => assert_eq!(message, "coordinates out of range"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
