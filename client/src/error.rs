use thiserror::Error;

/// Failures the interaction core reports to its caller.
///
/// Discarding a stale response is not an error; it is reported as
/// [`crate::session::ResponseOutcome::StaleDiscarded`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("shade layer catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("one or more endpoints lie outside the routing domain")]
    EndpointOutOfBounds,
    #[error("route fetch failed: {0}")]
    RouteFetchFailed(String),
    #[error("time index {index} out of range for catalog of {len} layers")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("shade layer catalog not loaded")]
    CatalogNotLoaded,
    #[error("beta must be a finite number, got {0}")]
    InvalidBeta(f64),
    #[error("coordinate must be finite, got ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },
}
