use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use shared::Coordinate;

const EARTH_RADIUS_KM: f64 = 6_371.0;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_PROFILE: &str = "car";

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("routing service returned HTTP {0}")]
    Status(StatusCode),
    #[error("no route found between the requested locations")]
    NoRoute,
    #[error("malformed routing response: {0}")]
    Decode(String),
}

/// One computed leg: the polyline and the raw distance in meters as reported
/// by the routing service.
#[derive(Debug, Clone)]
pub struct RouteLeg {
    pub path: Vec<Coordinate>,
    pub distance_meters: f64,
}

#[async_trait]
pub trait RoutingApi: Send + Sync {
    async fn route(&self, from: Coordinate, to: Coordinate) -> Result<RouteLeg, RoutingError>;
}

/// OSRM HTTP client:
/// `GET {base}/route/v1/{profile}/{lon},{lat};{lon},{lat}?overview=full&geometries=geojson`.
pub struct OsrmRouter {
    client: Client,
    base_url: String,
    profile: String,
}

impl OsrmRouter {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RoutingError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            profile: DEFAULT_PROFILE.to_string(),
        })
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    geometry: OsrmGeometry,
}

// GeoJSON LineString: positions are [lon, lat].
#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[async_trait]
impl RoutingApi for OsrmRouter {
    async fn route(&self, from: Coordinate, to: Coordinate) -> Result<RouteLeg, RoutingError> {
        let url = format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url, self.profile, from.lon, from.lat, to.lon, to.lat
        );
        tracing::debug!(%url, "routing request");

        let response = self
            .client
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Status(status));
        }

        let body: OsrmResponse = response.json().await?;
        if body.code != "Ok" {
            tracing::debug!(code = %body.code, "routing service found no route");
            return Err(RoutingError::NoRoute);
        }
        let Some(route) = body.routes.into_iter().next() else {
            return Err(RoutingError::NoRoute);
        };

        let path: Vec<Coordinate> = route
            .geometry
            .coordinates
            .into_iter()
            .map(|[lon, lat]| Coordinate { lat, lon })
            .collect();
        if let Some(bad) = path.iter().find(|c| !c.is_valid()) {
            return Err(RoutingError::Decode(format!(
                "coordinate out of range: {}, {}",
                bad.lat, bad.lon
            )));
        }

        Ok(RouteLeg {
            path,
            distance_meters: route.distance,
        })
    }
}

pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

pub fn path_length_km(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}
