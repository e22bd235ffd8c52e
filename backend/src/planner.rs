use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::timeout;

use shared::{
    Coordinate, EndpointView, LIVE_LOCATION_LABEL, ResolutionPhase, RouteSummary, StateSnapshot,
    Which,
};

use crate::error::ResolveError;
use crate::geocode::{GeocodeError, Geocoder};
use crate::position::{PositionError, PositionProvider};
use crate::routing::RoutingApi;

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Upper bound on one device-position request.
    pub position_timeout: Duration,
    /// Optional unlabeled seed coordinates so a route can be drawn before
    /// any search.
    pub default_start: Option<Coordinate>,
    pub default_end: Option<Coordinate>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            position_timeout: Duration::from_secs(10),
            default_start: None,
            default_end: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct EndpointState {
    label: Option<String>,
    coordinate: Option<Coordinate>,
}

impl EndpointState {
    fn seeded(coordinate: Option<Coordinate>) -> Self {
        Self {
            label: None,
            coordinate,
        }
    }

    fn view(&self) -> EndpointView {
        EndpointView {
            label: self.label.clone(),
            coordinate: self.coordinate,
        }
    }
}

struct PlannerState {
    /// Sequence number of the newest resolution cycle. A completion tagged
    /// with an older number must not touch state.
    seq: u64,
    start: EndpointState,
    end: EndpointState,
    phase: ResolutionPhase,
    route: Option<RouteSummary>,
}

/// Resolves the two journey endpoints and the route between them.
///
/// All mutation goes through [`resolve_by_text`](Self::resolve_by_text),
/// [`resolve_by_device`](Self::resolve_by_device) and [`swap`](Self::swap);
/// rendering clients read [`snapshot`](Self::snapshot). Overlapping triggers
/// are safe: each cycle is tagged at issue time and a completion belonging to
/// a superseded cycle is discarded instead of overwriting newer state.
pub struct RoutePlanner {
    geocoder: Arc<dyn Geocoder>,
    routing: Arc<dyn RoutingApi>,
    position: Arc<dyn PositionProvider>,
    position_timeout: Duration,
    state: Mutex<PlannerState>,
}

impl RoutePlanner {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        routing: Arc<dyn RoutingApi>,
        position: Arc<dyn PositionProvider>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            geocoder,
            routing,
            position,
            position_timeout: config.position_timeout,
            state: Mutex::new(PlannerState {
                seq: 0,
                start: EndpointState::seeded(config.default_start),
                end: EndpointState::seeded(config.default_end),
                phase: ResolutionPhase::Idle,
                route: None,
            }),
        }
    }

    /// Geocode both texts and route between the resulting pair.
    ///
    /// An empty or whitespace text keeps that endpoint's previous coordinate,
    /// as does a lookup with no match. Calling with both texts empty re-issues
    /// routing over the retained pair, so it doubles as a retry.
    pub async fn resolve_by_text(
        &self,
        start_text: &str,
        end_text: &str,
    ) -> Result<RouteSummary, ResolveError> {
        let seq = self.begin();
        let start_text = start_text.trim();
        let end_text = end_text.trim();

        // Both lookups are in flight before either is awaited.
        let (start_hit, end_hit) = tokio::join!(
            self.lookup_or_keep(start_text),
            self.lookup_or_keep(end_text)
        );
        let (start_hit, end_hit) = match (start_hit, end_hit) {
            (Ok(start_hit), Ok(end_hit)) => (start_hit, end_hit),
            (Err(err), _) | (_, Err(err)) => {
                self.fail(seq, err.to_string());
                return Err(err.into());
            }
        };

        let (start_coord, end_coord) = {
            let mut st = self.state.lock().unwrap();
            if st.seq == seq {
                if let Some(coordinate) = start_hit {
                    st.start = EndpointState {
                        label: Some(start_text.to_string()),
                        coordinate: Some(coordinate),
                    };
                }
                if let Some(coordinate) = end_hit {
                    st.end = EndpointState {
                        label: Some(end_text.to_string()),
                        coordinate: Some(coordinate),
                    };
                }
            } else {
                tracing::debug!(cycle = seq, current = st.seq, "discarding stale geocode results");
            }
            (st.start.coordinate, st.end.coordinate)
        };

        let (Some(from), Some(to)) = (start_coord, end_coord) else {
            self.fail(seq, ResolveError::EndpointsUnresolved.to_string());
            return Err(ResolveError::EndpointsUnresolved);
        };

        self.request_route(seq, from, to).await
    }

    /// Resolve one endpoint from the device position provider and recompute
    /// the route if the other endpoint already holds a coordinate.
    ///
    /// A provider failure leaves endpoints and route untouched. A routing
    /// failure after a successful fix keeps the fix applied and is surfaced
    /// through [`snapshot`](Self::snapshot).
    pub async fn resolve_by_device(&self, which: Which) -> Result<Coordinate, ResolveError> {
        let seq = self.begin();

        let fix = match timeout(self.position_timeout, self.position.current_position()).await {
            Ok(result) => result,
            Err(_) => Err(PositionError::TimedOut),
        };
        let fix = match fix {
            Ok(coordinate) if coordinate.is_valid() => coordinate,
            Ok(coordinate) => {
                let err = PositionError::OutOfRange {
                    lat: coordinate.lat,
                    lon: coordinate.lon,
                };
                self.fail(seq, err.to_string());
                return Err(err.into());
            }
            Err(err) => {
                self.fail(seq, err.to_string());
                return Err(err.into());
            }
        };

        let (start_coord, end_coord) = {
            let mut st = self.state.lock().unwrap();
            if st.seq == seq {
                let endpoint = match which {
                    Which::Start => &mut st.start,
                    Which::End => &mut st.end,
                };
                *endpoint = EndpointState {
                    label: Some(LIVE_LOCATION_LABEL.to_string()),
                    coordinate: Some(fix),
                };
            } else {
                tracing::debug!(cycle = seq, current = st.seq, "discarding stale device fix");
            }
            (st.start.coordinate, st.end.coordinate)
        };

        if let (Some(from), Some(to)) = (start_coord, end_coord) {
            let _ = self.request_route(seq, from, to).await;
        } else {
            self.commit(seq, |st| st.phase = ResolutionPhase::Resolved);
        }

        Ok(fix)
    }

    /// Exchange start and end, coordinate and label together, then recompute
    /// the route when both endpoints hold coordinates. Two consecutive swaps
    /// restore the original endpoints exactly.
    pub async fn swap(&self) {
        let (seq, start_coord, end_coord, previous_phase) = {
            let mut st = self.state.lock().unwrap();
            st.seq += 1;
            let previous_phase = std::mem::replace(&mut st.phase, ResolutionPhase::Resolving);
            let st = &mut *st;
            std::mem::swap(&mut st.start, &mut st.end);
            (st.seq, st.start.coordinate, st.end.coordinate, previous_phase)
        };

        if let (Some(from), Some(to)) = (start_coord, end_coord) {
            let _ = self.request_route(seq, from, to).await;
        } else {
            // Swapping unresolved endpoints is not a failure. A superseded
            // cycle's Resolving must not be restored, nothing will finish it.
            let restored = match previous_phase {
                ResolutionPhase::Resolving => ResolutionPhase::Idle,
                other => other,
            };
            self.commit(seq, move |st| st.phase = restored);
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let st = self.state.lock().unwrap();
        StateSnapshot {
            start: st.start.view(),
            end: st.end.view(),
            phase: st.phase.clone(),
            route: st.route.clone(),
        }
    }

    /// Open a new resolution cycle, superseding any cycle still in flight.
    fn begin(&self) -> u64 {
        let mut st = self.state.lock().unwrap();
        st.seq += 1;
        st.phase = ResolutionPhase::Resolving;
        st.seq
    }

    /// Apply a state change only if `seq` is still the newest cycle.
    fn commit<F: FnOnce(&mut PlannerState)>(&self, seq: u64, apply: F) -> bool {
        let mut st = self.state.lock().unwrap();
        if st.seq != seq {
            tracing::debug!(cycle = seq, current = st.seq, "discarding stale completion");
            return false;
        }
        apply(&mut st);
        true
    }

    fn fail(&self, seq: u64, reason: String) {
        self.commit(seq, move |st| st.phase = ResolutionPhase::Failed { reason });
    }

    async fn lookup_or_keep(&self, text: &str) -> Result<Option<Coordinate>, GeocodeError> {
        if text.is_empty() {
            return Ok(None);
        }
        let hit = self.geocoder.lookup(text).await?;
        if hit.is_none() {
            tracing::warn!(query = text, "no geocoding match, keeping previous coordinate");
        }
        Ok(hit)
    }

    async fn request_route(
        &self,
        seq: u64,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<RouteSummary, ResolveError> {
        match self.routing.route(from, to).await {
            Ok(leg) => {
                let summary = RouteSummary {
                    distance_km: round_km(leg.distance_meters),
                    path: leg.path,
                };
                let route = summary.clone();
                self.commit(seq, move |st| {
                    st.route = Some(route);
                    st.phase = ResolutionPhase::Resolved;
                });
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(error = %err, "routing request failed");
                self.fail(seq, err.to_string());
                Err(err.into())
            }
        }
    }
}

fn round_km(meters: f64) -> f64 {
    (meters / 1000.0 * 100.0).round() / 100.0
}
