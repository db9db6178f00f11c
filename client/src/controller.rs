//! Route request orchestration.
//!
//! Each request kind carries its own generation counter. A refresh advances
//! both counters and tags the outgoing requests with the new values; a
//! response may touch state only if its tag still equals the counter when it
//! arrives. Responses for superseded inputs are dropped instead of cancelled.

use serde_json::Value;
use shared::{
    Coordinate, OptimalRouteQuery, OptimalRouteResponse, ShortestRouteQuery,
    ShortestRouteResponse, TimeOfDay,
};

use crate::endpoints::EndpointSnapshot;
use crate::error::ClientError;
use crate::map::{MapSurface, Notice, OverlayHandle};
use crate::params::Beta;
use crate::service::ServiceError;

pub type Generation = u64;

#[derive(Debug, Default, Clone)]
pub struct GenerationCounter {
    current: Generation,
}

impl GenerationCounter {
    pub fn advance(&mut self) -> Generation {
        self.current += 1;
        self.current
    }

    pub fn current(&self) -> Generation {
        self.current
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.current
    }
}

/// The inputs a result was computed for: endpoint pair and time of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteKey {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub time: TimeOfDay,
}

impl From<&OptimalRouteQuery> for RouteKey {
    fn from(query: &OptimalRouteQuery) -> Self {
        Self {
            origin: query.origin(),
            destination: query.destination(),
            time: query.time(),
        }
    }
}

impl From<&ShortestRouteQuery> for RouteKey {
    fn from(query: &ShortestRouteQuery) -> Self {
        Self {
            origin: query.origin(),
            destination: query.destination(),
            time: query.time(),
        }
    }
}

/// The rendered optimal route. `length` is in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub geometry: Value,
    pub length: f64,
    pub sun_exposure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteMetrics {
    pub length: f64,
    pub sun_exposure: f64,
}

/// Optimal-over-shortest ratios. A ratio with a zero denominator is `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonMetrics {
    pub length_ratio: Option<f64>,
    pub sun_ratio: Option<f64>,
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    let value = numerator / denominator;
    (denominator > 0.0 && value.is_finite()).then_some(value)
}

/// Everything a refresh reads, captured at one instant.
#[derive(Debug, Clone, Copy)]
pub struct RefreshInputs {
    pub endpoints: EndpointSnapshot,
    pub beta: Beta,
    pub time: TimeOfDay,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshPlan {
    /// Fewer than two endpoints: route and metrics were cleared.
    Cleared,
    Requests {
        optimal: (Generation, OptimalRouteQuery),
        shortest: (Generation, ShortestRouteQuery),
    },
}

/// What handling one response did.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    Applied,
    /// A newer request of the same kind was issued since; nothing changed.
    StaleDiscarded,
    /// The request failed; prior state is untouched.
    Failed(ClientError),
}

#[derive(Debug, Default)]
pub struct RouteController {
    optimal_generation: GenerationCounter,
    shortest_generation: GenerationCounter,
    overlay: Option<OverlayHandle>,
    optimal: Option<(RouteKey, RouteResult)>,
    shortest: Option<(RouteKey, RouteMetrics)>,
}

impl RouteController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn optimal_generation(&self) -> Generation {
        self.optimal_generation.current()
    }

    pub fn shortest_generation(&self) -> Generation {
        self.shortest_generation.current()
    }

    pub fn route(&self) -> Option<&RouteResult> {
        self.optimal.as_ref().map(|(_, route)| route)
    }

    pub fn shortest(&self) -> Option<&RouteMetrics> {
        self.shortest.as_ref().map(|(_, metrics)| metrics)
    }

    /// Ratios, defined only when the stored optimal and shortest results
    /// were computed for the same endpoint pair and time.
    pub fn comparison(&self) -> Option<ComparisonMetrics> {
        let (optimal_key, optimal) = self.optimal.as_ref()?;
        let (shortest_key, shortest) = self.shortest.as_ref()?;
        if optimal_key != shortest_key {
            return None;
        }
        Some(ComparisonMetrics {
            length_ratio: ratio(optimal.length, shortest.length),
            sun_ratio: ratio(optimal.sun_exposure, shortest.sun_exposure),
        })
    }

    pub fn refresh(&mut self, surface: &mut impl MapSurface, inputs: RefreshInputs) -> RefreshPlan {
        let Some((origin, destination)) = inputs.endpoints.pair() else {
            // Invalidate anything still in flight for the previous pair.
            self.optimal_generation.advance();
            self.shortest_generation.advance();
            self.clear(surface);
            return RefreshPlan::Cleared;
        };

        let optimal_generation = self.optimal_generation.advance();
        let shortest_generation = self.shortest_generation.advance();
        tracing::debug!(
            optimal_generation,
            shortest_generation,
            beta = inputs.beta.value(),
            time = %inputs.time,
            "issuing route requests"
        );
        RefreshPlan::Requests {
            optimal: (
                optimal_generation,
                OptimalRouteQuery::new(origin, destination, inputs.beta.value(), inputs.time),
            ),
            shortest: (
                shortest_generation,
                ShortestRouteQuery::new(origin, destination, inputs.time),
            ),
        }
    }

    fn clear(&mut self, surface: &mut impl MapSurface) {
        if let Some(overlay) = self.overlay.take() {
            surface.remove_overlay(overlay);
        }
        self.optimal = None;
        self.shortest = None;
    }

    pub fn handle_optimal(
        &mut self,
        surface: &mut impl MapSurface,
        generation: Generation,
        query: &OptimalRouteQuery,
        result: Result<OptimalRouteResponse, ServiceError>,
    ) -> ResponseOutcome {
        if !self.optimal_generation.is_current(generation) {
            tracing::debug!(
                generation,
                current = self.optimal_generation.current(),
                "discarding stale optimal route response"
            );
            return ResponseOutcome::StaleDiscarded;
        }

        let response = match result {
            Ok(response) => response,
            Err(ServiceError::OutOfBounds) => {
                tracing::info!(generation, "optimal route endpoints out of domain");
                surface.notify(Notice::EndpointOutOfBounds);
                return ResponseOutcome::Failed(ClientError::EndpointOutOfBounds);
            }
            Err(err) => {
                tracing::warn!(generation, "failed to fetch optimal route: {err}");
                return ResponseOutcome::Failed(ClientError::RouteFetchFailed(err.to_string()));
            }
        };
        if let Err(err) = check_metrics(response.length, response.sun) {
            tracing::warn!(generation, "rejecting optimal route response: {err}");
            return ResponseOutcome::Failed(err);
        }

        if let Some(previous) = self.overlay.take() {
            surface.remove_overlay(previous);
        }
        self.overlay = Some(surface.add_route_overlay(&response.route));
        tracing::debug!(
            generation,
            length = response.length,
            sun = response.sun,
            "optimal route rendered"
        );
        self.optimal = Some((
            RouteKey::from(query),
            RouteResult {
                geometry: response.route,
                length: response.length,
                sun_exposure: response.sun,
            },
        ));
        ResponseOutcome::Applied
    }

    pub fn handle_shortest(
        &mut self,
        generation: Generation,
        query: &ShortestRouteQuery,
        result: Result<ShortestRouteResponse, ServiceError>,
    ) -> ResponseOutcome {
        if !self.shortest_generation.is_current(generation) {
            tracing::debug!(
                generation,
                current = self.shortest_generation.current(),
                "discarding stale shortest route response"
            );
            return ResponseOutcome::StaleDiscarded;
        }

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(generation, "failed to fetch shortest route: {err}");
                return ResponseOutcome::Failed(ClientError::RouteFetchFailed(err.to_string()));
            }
        };
        if let Err(err) = check_metrics(response.length, response.sun) {
            tracing::warn!(generation, "rejecting shortest route response: {err}");
            return ResponseOutcome::Failed(err);
        }

        self.shortest = Some((
            RouteKey::from(query),
            RouteMetrics {
                length: response.length,
                sun_exposure: response.sun,
            },
        ));
        ResponseOutcome::Applied
    }
}

fn check_metrics(length: f64, sun: f64) -> Result<(), ClientError> {
    if length.is_finite() && length >= 0.0 && sun.is_finite() && sun >= 0.0 {
        Ok(())
    } else {
        Err(ClientError::RouteFetchFailed(format!(
            "invalid route metrics: length={length} sun={sun}"
        )))
    }
}
