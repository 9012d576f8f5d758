//! Google Maps reverse geocoding.
//!
//! Issues `GET {endpoint}?latlng={lat},{lng}&key={key}` and keeps
//! `formatted_address` and `place_id` of every result, nearest first.

use foundation::GeoPoint;
use serde::Deserialize;

use super::{BoxFuture, Geocoder};
use crate::error::{ServiceError, ServiceResult};
use crate::model::GeocodeResult;

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Clone)]
pub struct GoogleGeocoder {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), DEFAULT_ENDPOINT, api_key)
    }

    pub fn with_client(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct ReverseResponse {
    status: String,
    #[serde(default)]
    results: Vec<RawResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct RawResult {
    formatted_address: String,
    #[serde(default)]
    place_id: String,
}

/// Parses a geocoding response body.
///
/// `ZERO_RESULTS` is a successful empty answer; any other non-`OK` status is
/// an error carrying the service's message.
pub fn parse_response(body: &str) -> ServiceResult<Vec<GeocodeResult>> {
    let response: ReverseResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::with_source("malformed geocoder response", e))?;

    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => Ok(response
            .results
            .into_iter()
            .map(|r| GeocodeResult {
                formatted_address: r.formatted_address,
                place_id: r.place_id,
            })
            .collect()),
        status => Err(ServiceError::new(match response.error_message {
            Some(msg) => format!("geocoder status {status}: {msg}"),
            None => format!("geocoder status {status}"),
        })),
    }
}

impl Geocoder for GoogleGeocoder {
    fn search(&self, point: GeoPoint) -> BoxFuture<'_, ServiceResult<Vec<GeocodeResult>>> {
        Box::pin(async move {
            let latlng = format!("{},{}", point.latitude, point.longitude);
            let response = self
                .http
                .get(&self.endpoint)
                .query(&[("latlng", latlng.as_str()), ("key", self.api_key.as_str())])
                .send()
                .await
                .map_err(|e| ServiceError::with_source("geocoder request failed", e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ServiceError::new(format!("geocoder returned HTTP {status}")));
            }

            let body = response
                .text()
                .await
                .map_err(|e| ServiceError::with_source("geocoder body read failed", e))?;
            parse_response(&body)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::parse_response;

    #[test]
    fn keeps_results_in_order() {
        let body = r#"{
            "status": "OK",
            "results": [
                { "formatted_address": "1 Main St", "place_id": "p1", "types": ["street_address"] },
                { "formatted_address": "Main St", "place_id": "p2" }
            ]
        }"#;
        let results = parse_response(body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].formatted_address, "1 Main St");
        assert_eq!(results[0].place_id, "p1");
    }

    #[test]
    fn zero_results_is_empty_success() {
        let results = parse_response(r#"{ "status": "ZERO_RESULTS", "results": [] }"#).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn error_status_carries_message() {
        let err = parse_response(
            r#"{ "status": "REQUEST_DENIED", "error_message": "bad key", "results": [] }"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "geocoder status REQUEST_DENIED: bad key");

        assert!(parse_response("<html>").is_err());
    }
}
