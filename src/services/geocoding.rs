//! Geocoding and routing lookups against the external maps provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Raw routing result as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEstimate {
    pub meters: f64,
    pub seconds: f64,
}

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("no geocoding result for address: {0}")]
    NoResult(String),

    #[error("distance/time data not found in response")]
    NoRoute,

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodingError>;

    async fn distance_and_duration(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteEstimate, GeocodingError>;
}

/// Ola Maps (Krutrim) HTTP adapter.
pub struct OlaMapsGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OlaMapsGeocoder {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, GeocodingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeocodeResponse {
    #[serde(default)]
    geocoding_results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Coordinates,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixResponse {
    #[serde(default)]
    rows: Vec<DistanceMatrixRow>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixRow {
    #[serde(default)]
    elements: Vec<DistanceMatrixElement>,
}

#[derive(Debug, Deserialize)]
struct DistanceMatrixElement {
    distance: Option<f64>,
    duration: Option<f64>,
}

#[async_trait]
impl Geocoder for OlaMapsGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodingError> {
        let url = format!("{}/places/v1/geocode", self.base_url);
        let response: GeocodeResponse = self
            .client
            .get(url)
            .query(&[("address", address), ("api_key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .geocoding_results
            .into_iter()
            .next()
            .map(|r| r.geometry.location)
            .ok_or_else(|| GeocodingError::NoResult(address.to_string()))
    }

    async fn distance_and_duration(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<RouteEstimate, GeocodingError> {
        let url = format!("{}/routing/v1/distanceMatrix", self.base_url);
        let origins = format!("{},{}", origin.lat, origin.lng);
        let destinations = format!("{},{}", destination.lat, destination.lng);

        let response: DistanceMatrixResponse = self
            .client
            .get(url)
            .query(&[
                ("origins", origins.as_str()),
                ("destinations", destinations.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let element = response
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.elements.into_iter().next())
            .ok_or(GeocodingError::NoRoute)?;

        match (element.distance, element.duration) {
            (Some(meters), Some(seconds)) => Ok(RouteEstimate { meters, seconds }),
            _ => Err(GeocodingError::NoRoute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_geocode_payload() {
        let body = r#"{"geocodingResults":[{"geometry":{"location":{"lat":12.97,"lng":77.59}}}]}"#;
        let parsed: GeocodeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.geocoding_results[0].geometry.location.lat, 12.97);

        let empty: GeocodeResponse = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(empty.geocoding_results.is_empty());
    }

    #[test]
    fn test_parses_distance_matrix_with_missing_fields() {
        let body = r#"{"rows":[{"elements":[{"distance":1500,"duration":null}]}]}"#;
        let parsed: DistanceMatrixResponse = serde_json::from_str(body).unwrap();
        let element = &parsed.rows[0].elements[0];
        assert_eq!(element.distance, Some(1500.0));
        assert_eq!(element.duration, None);
    }
}
