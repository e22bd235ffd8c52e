pub mod error;
pub mod geocode;
pub mod gpx_export;
pub mod planner;
pub mod position;
pub mod routing;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use shared::{
    ApiError, Coordinate, LiveRouteRequest, RouteResponse, StateSnapshot, TextRouteRequest,
};

use crate::error::ResolveError;
use crate::gpx_export::encode_route_as_gpx;
use crate::planner::RoutePlanner;
use crate::position::SharedPosition;

#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<RoutePlanner>,
    /// Sink for device positions reported by the client; the planner reads
    /// the same instance as its position provider.
    pub position: Arc<SharedPosition>,
}

pub fn create_router(state: AppState) -> Router {
    // The map UI is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/route", post(route_handler))
        .route("/api/route/live", post(live_route_handler))
        .route("/api/route/swap", post(swap_handler))
        .route("/api/state", get(state_handler))
        .route("/api/position", post(position_handler))
        .layer(cors)
        .with_state(state)
}

async fn route_handler(
    State(state): State<AppState>,
    Json(req): Json<TextRouteRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let summary = state
        .planner
        .resolve_by_text(&req.start, &req.end)
        .await
        .map_err(resolve_error)?;
    let gpx_base64 = encode_route_as_gpx(&summary.path).map_err(internal_error)?;

    Ok(Json(RouteResponse {
        path: summary.path,
        distance_km: summary.distance_km,
        gpx_base64,
    }))
}

async fn live_route_handler(
    State(state): State<AppState>,
    Json(req): Json<LiveRouteRequest>,
) -> Result<Json<StateSnapshot>, (StatusCode, Json<ApiError>)> {
    state
        .planner
        .resolve_by_device(req.which)
        .await
        .map_err(resolve_error)?;
    Ok(Json(state.planner.snapshot()))
}

async fn swap_handler(State(state): State<AppState>) -> Json<StateSnapshot> {
    state.planner.swap().await;
    Json(state.planner.snapshot())
}

async fn state_handler(State(state): State<AppState>) -> Json<StateSnapshot> {
    Json(state.planner.snapshot())
}

async fn position_handler(
    State(state): State<AppState>,
    Json(coordinate): Json<Coordinate>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    if !coordinate.is_valid() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                message: format!(
                    "coordinate out of range: {}, {}",
                    coordinate.lat, coordinate.lon
                ),
            }),
        ));
    }
    state.position.report(coordinate);
    Ok(StatusCode::NO_CONTENT)
}

fn resolve_error(err: ResolveError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        ResolveError::EndpointsUnresolved => StatusCode::UNPROCESSABLE_ENTITY,
        ResolveError::GeocodeUnavailable(_)
        | ResolveError::RouteUnavailable(_)
        | ResolveError::GeolocationUnavailable(_) => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}

fn internal_error(err: gpx::errors::GpxError) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
