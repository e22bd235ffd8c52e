use std::{net::SocketAddr, sync::Arc, time::Duration};

use backend::planner::{PlannerConfig, RoutePlanner};
use backend::position::SharedPosition;
use backend::routing::OsrmRouter;
use backend::{AppState, create_router, geocode::NominatimGeocoder};
use shared::Coordinate;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

// Central London, so a route can be drawn before any search
const DEFAULT_START: Coordinate = Coordinate {
    lat: 51.505,
    lon: -0.09,
};
const DEFAULT_END: Coordinate = Coordinate {
    lat: 51.515,
    lon: -0.1,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let nominatim_url =
        std::env::var("NOMINATIM_URL").unwrap_or_else(|_| DEFAULT_NOMINATIM_URL.to_string());
    let osrm_url = std::env::var("OSRM_URL").unwrap_or_else(|_| DEFAULT_OSRM_URL.to_string());

    let geocoder = NominatimGeocoder::new(nominatim_url.as_str()).expect("build geocoding client");
    let router = OsrmRouter::new(osrm_url.as_str()).expect("build routing client");
    tracing::info!("geocoding via {nominatim_url}, routing via {osrm_url}");

    let position = Arc::new(SharedPosition::default());
    let planner = RoutePlanner::new(
        Arc::new(geocoder),
        Arc::new(router),
        position.clone(),
        PlannerConfig {
            position_timeout: Duration::from_secs(10),
            default_start: Some(DEFAULT_START),
            default_end: Some(DEFAULT_END),
        },
    );

    let state = AppState {
        planner: Arc::new(planner),
        position,
    };
    let app = create_router(state);

    let addr: SocketAddr = "0.0.0.0:8080".parse().expect("valid socket address");
    tracing::info!("starting backend on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}
