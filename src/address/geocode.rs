//! Geocoding enrichment
//!
//! Resolves coordinates for a composed address string through an external
//! search provider (Nominatim by default). Only the first candidate is used.

use crate::config::GeocoderConfig;
use crate::error::{upstream_error, AppError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Provider coordinate, sent either as a JSON string or number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl RawCoordinate {
    fn parse(&self, axis: &str) -> Result<f64, AppError> {
        match self {
            RawCoordinate::Number(n) => Ok(*n),
            RawCoordinate::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| upstream_error(format!("geocoder returned a non-numeric {}: '{}'", axis, s))),
        }
    }
}

/// One search hit
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeocodeCandidate {
    #[serde(default)]
    pub lat: Option<RawCoordinate>,
    #[serde(default)]
    pub lon: Option<RawCoordinate>,
}

/// Raw provider answer
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResponse {
    pub status: u16,
    pub candidates: Vec<GeocodeCandidate>,
}

/// Resolved coordinates; each axis may be unset
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Coordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Free-text search against a geocoding provider
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(&self, query: &str) -> Result<GeocodeResponse, AppError>;
}

/// Resolve the coordinates of `query` from the provider's first candidate.
///
/// A non-200 status or an empty candidate list fails the call.
pub async fn resolve_coordinates(geocoder: &dyn Geocoder, query: &str) -> Result<Coordinates, AppError> {
    let response = geocoder.search(query).await?;

    if response.status != 200 {
        return Err(upstream_error(format!(
            "geolocation retrieval failed (status {})",
            response.status
        )));
    }

    let first = response
        .candidates
        .first()
        .ok_or_else(|| upstream_error(format!("no geocoding candidates for '{}'", query)))?;

    let coordinates = Coordinates {
        latitude: first.lat.as_ref().map(|c| c.parse("latitude")).transpose()?,
        longitude: first.lon.as_ref().map(|c| c.parse("longitude")).transpose()?,
    };

    debug!(
        "Geocoded '{}' to ({:?}, {:?}) from {} candidates",
        query,
        coordinates.latitude,
        coordinates.longitude,
        response.candidates.len()
    );

    Ok(coordinates)
}

/// HTTP client for a Nominatim-compatible search endpoint
pub struct NominatimClient {
    http: Client,
    endpoint: Url,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self, AppError> {
        let http = Client::builder()
            .user_agent(config.user_agent())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create geocoder HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(&self, query: &str) -> Result<GeocodeResponse, AppError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await
            .map_err(|e| upstream_error(format!("geolocation request failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(GeocodeResponse {
                status: status.as_u16(),
                candidates: Vec::new(),
            });
        }

        let candidates = response
            .json::<Vec<GeocodeCandidate>>()
            .await
            .map_err(|e| upstream_error(format!("geolocation response could not be parsed: {}", e)))?;

        Ok(GeocodeResponse {
            status: status.as_u16(),
            candidates,
        })
    }
}
