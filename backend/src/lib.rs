pub mod catalog;
pub mod error;
pub mod models;
pub mod routing;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::catalog::{build_catalog, LayerCatalogConfig};
use crate::error::RouteError;
use crate::models::{
    Coordinate, DomainBounds, OptimalRouteQuery, OptimalRouteResponse, ShadeLayerDescriptor,
    ShortestRouteQuery, TimeOfDay,
};
use crate::routing::{optimal_route, shortest_route};

#[derive(Clone)]
pub struct AppState {
    pub domain: DomainBounds,
    pub catalog: Arc<Vec<ShadeLayerDescriptor>>,
}

impl AppState {
    pub fn new(domain: DomainBounds, layers: &LayerCatalogConfig) -> Self {
        Self {
            domain,
            catalog: Arc::new(build_catalog(layers)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/layers", get(layers_handler))
        .route("/route/optimal", get(optimal_handler))
        .route("/route/shortest", get(shortest_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state)
}

async fn layers_handler(State(state): State<AppState>) -> Json<Vec<ShadeLayerDescriptor>> {
    Json(state.catalog.as_ref().clone())
}

async fn optimal_handler(
    State(state): State<AppState>,
    Query(query): Query<OptimalRouteQuery>,
) -> Result<Json<OptimalRouteResponse>, RouteError> {
    let time = parse_time(query.hour, query.minute)?;
    if !(0.0..=1.0).contains(&query.beta) {
        return Err(RouteError::InvalidBeta(query.beta));
    }
    let (start, end) = validate_endpoints(&state.domain, query.origin(), query.destination())?;

    let route = optimal_route(start, end, query.beta, time);
    tracing::info!(
        "optimal route beta={:.2} at {time}: {:.0} m, sun {:.1}",
        query.beta,
        route.length_m,
        route.sun
    );
    Ok(Json(OptimalRouteResponse {
        route: route.geometry(),
        length: route.length_m,
        sun: route.sun,
    }))
}

async fn shortest_handler(
    State(state): State<AppState>,
    Query(query): Query<ShortestRouteQuery>,
) -> Result<Json<OptimalRouteResponse>, RouteError> {
    let time = parse_time(query.hour, query.minute)?;
    let (start, end) = validate_endpoints(&state.domain, query.origin(), query.destination())?;

    let route = shortest_route(start, end, time);
    tracing::info!(
        "shortest route at {time}: {:.0} m, sun {:.1}",
        route.length_m,
        route.sun
    );
    Ok(Json(OptimalRouteResponse {
        route: route.geometry(),
        length: route.length_m,
        sun: route.sun,
    }))
}

fn parse_time(hour: u8, minute: u8) -> Result<TimeOfDay, RouteError> {
    TimeOfDay::new(hour, minute).ok_or(RouteError::InvalidTime { hour, minute })
}

fn validate_endpoints(
    domain: &DomainBounds,
    start: Coordinate,
    end: Coordinate,
) -> Result<(Coordinate, Coordinate), RouteError> {
    if !start.is_finite() || !end.is_finite() {
        return Err(RouteError::InvalidCoordinate);
    }
    if !domain.contains(start) || !domain.contains(end) {
        tracing::debug!("rejecting endpoints outside domain: {start:?} -> {end:?}");
        return Err(RouteError::OutOfDomain);
    }
    Ok((start, end))
}
