use thiserror::Error;

use crate::geocode::GeocodeError;
use crate::position::PositionError;
use crate::routing::RoutingError;

/// Failure modes of the three planner triggers. All recoverable: the last
/// good coordinates and route stay in place and the caller may re-issue the
/// operation.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("geocoding service unavailable: {0}")]
    GeocodeUnavailable(#[from] GeocodeError),
    #[error("routing service unavailable: {0}")]
    RouteUnavailable(#[from] RoutingError),
    #[error("geolocation unavailable: {0}")]
    GeolocationUnavailable(#[from] PositionError),
    #[error("start or end location has never been resolved")]
    EndpointsUnresolved,
}
