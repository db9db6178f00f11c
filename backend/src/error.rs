use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiError;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("endpoint outside the routing domain")]
    OutOfDomain,
    #[error("invalid time {hour}:{minute}")]
    InvalidTime { hour: u8, minute: u8 },
    #[error("beta must be within [0, 1], got {0}")]
    InvalidBeta(f64),
    #[error("coordinates must be finite")]
    InvalidCoordinate,
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        match self {
            // Clients key on the bare status.
            RouteError::OutOfDomain => StatusCode::FORBIDDEN.into_response(),
            other => (
                StatusCode::BAD_REQUEST,
                Json(ApiError {
                    message: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}
