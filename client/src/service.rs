use shared::{
    OptimalRouteQuery, OptimalRouteResponse, ShadeLayerDescriptor, ShortestRouteQuery,
    ShortestRouteResponse,
};
use thiserror::Error;

use crate::controller::Generation;

/// Transport-level outcome of one request to the routing service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// HTTP 403: an endpoint lies outside the routing domain.
    #[error("endpoint outside routing domain")]
    OutOfBounds,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Maps a non-success HTTP status to an error.
    pub fn from_status(status: u16) -> Self {
        if status == 403 {
            ServiceError::OutOfBounds
        } else {
            ServiceError::Status(status)
        }
    }
}

/// Contract of the remote routing/imagery service.
///
/// Futures are not required to be `Send`: every implementation runs on the
/// single interaction thread.
#[allow(async_fn_in_trait)]
pub trait RouteService {
    async fn layers(&self) -> Result<Vec<ShadeLayerDescriptor>, ServiceError>;

    async fn optimal_route(
        &self,
        query: &OptimalRouteQuery,
    ) -> Result<OptimalRouteResponse, ServiceError>;

    async fn shortest_route(
        &self,
        query: &ShortestRouteQuery,
    ) -> Result<ShortestRouteResponse, ServiceError>;
}

/// A request the session wants issued.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchCatalog,
    FetchOptimal {
        generation: Generation,
        query: OptimalRouteQuery,
    },
    FetchShortest {
        generation: Generation,
        query: ShortestRouteQuery,
    },
}

/// A completed request, fed back to [`crate::session::Session::handle`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CatalogFetched(Result<Vec<ShadeLayerDescriptor>, ServiceError>),
    OptimalFetched {
        generation: Generation,
        query: OptimalRouteQuery,
        result: Result<OptimalRouteResponse, ServiceError>,
    },
    ShortestFetched {
        generation: Generation,
        query: ShortestRouteQuery,
        result: Result<ShortestRouteResponse, ServiceError>,
    },
}

/// Performs one command against `service`.
pub async fn execute<S: RouteService>(service: &S, command: Command) -> Event {
    match command {
        Command::FetchCatalog => Event::CatalogFetched(service.layers().await),
        Command::FetchOptimal { generation, query } => {
            let result = service.optimal_route(&query).await;
            Event::OptimalFetched {
                generation,
                query,
                result,
            }
        }
        Command::FetchShortest { generation, query } => {
            let result = service.shortest_route(&query).await;
            Event::ShortestFetched {
                generation,
                query,
                result,
            }
        }
    }
}
