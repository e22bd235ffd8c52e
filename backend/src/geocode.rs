use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use shared::Coordinate;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
// Nominatim's usage policy requires an identifying User-Agent.
const USER_AGENT: &str = concat!("trajets/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoding service returned HTTP {0}")]
    Status(StatusCode),
    #[error("malformed geocoding response: {0}")]
    Decode(String),
}

/// Free-text place lookup. `Ok(None)` means the service had no match, which
/// is not a failure.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError>;
}

/// Nominatim search client. Takes the first match of
/// `GET {base}/search?format=json&limit=1&q=<query>`.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

// Nominatim serializes lat/lon as JSON strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

fn parse_axis(raw: &str, axis: &str) -> Result<f64, GeocodeError> {
    raw.parse::<f64>()
        .map_err(|err| GeocodeError::Decode(format!("invalid {axis} {raw:?}: {err}")))
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        tracing::debug!(%query, "geocode lookup");

        let response = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("limit", "1"), ("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status));
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        let Some(place) = places.first() else {
            tracing::debug!(%query, "geocode lookup returned no match");
            return Ok(None);
        };

        let coord = Coordinate {
            lat: parse_axis(&place.lat, "latitude")?,
            lon: parse_axis(&place.lon, "longitude")?,
        };
        if !coord.is_valid() {
            return Err(GeocodeError::Decode(format!(
                "coordinate out of range: {}, {}",
                coord.lat, coord.lon
            )));
        }
        Ok(Some(coord))
    }
}
