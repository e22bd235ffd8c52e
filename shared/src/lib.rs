use serde::{Deserialize, Serialize};

/// Display label used for an endpoint resolved from the device sensor.
pub const LIVE_LOCATION_LABEL: &str = "Live Location";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Latitude in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Which endpoint of the journey a trigger applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Which {
    Start,
    End,
}

/// Joint resolution status of the two endpoints and the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResolutionPhase {
    Idle,
    Resolving,
    Resolved,
    Failed { reason: String },
}

/// One endpoint as seen by a rendering client: the label the user searched
/// for (or the live-location sentinel) and the coordinate it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointView {
    pub label: Option<String>,
    pub coordinate: Option<Coordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub path: Vec<Coordinate>,
    pub distance_km: f64,
}

/// Full planner state for rendering: markers, polyline, distance, status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub start: EndpointView,
    pub end: EndpointView,
    pub phase: ResolutionPhase,
    pub route: Option<RouteSummary>,
}

/// Body of `POST /api/route`. An empty or whitespace field keeps that
/// endpoint's previously resolved coordinate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRouteRequest {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

/// Body of `POST /api/route/live`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LiveRouteRequest {
    pub which: Which,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub path: Vec<Coordinate>,
    pub distance_km: f64,
    pub gpx_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
