use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use shared::Coordinate;

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("no device position has been reported")]
    NoFix,
    #[error("device position access was denied")]
    Denied,
    #[error("device position request timed out")]
    TimedOut,
    #[error("device position out of range: {lat}, {lon}")]
    OutOfRange { lat: f64, lon: f64 },
}

/// Single-shot device position source. One fix per call, no continuous
/// tracking.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinate, PositionError>;
}

/// The device sensor lives on the client in this deployment, so the backend
/// side of the geolocation collaborator is the most recent reading the
/// client posted to `/api/position`.
#[derive(Debug, Default)]
pub struct SharedPosition {
    latest: Mutex<Option<Coordinate>>,
}

impl SharedPosition {
    pub fn report(&self, coordinate: Coordinate) {
        *self.latest.lock().unwrap() = Some(coordinate);
    }

    pub fn clear(&self) {
        *self.latest.lock().unwrap() = None;
    }
}

#[async_trait]
impl PositionProvider for SharedPosition {
    async fn current_position(&self) -> Result<Coordinate, PositionError> {
        self.latest.lock().unwrap().ok_or(PositionError::NoFix)
    }
}
