use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ValidationError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid customer payload: {0}")]
    InvalidBody(#[from] ValidationError),
    #[error("invalid customer id {0:?}")]
    InvalidId(String),
    #[error("customer not found")]
    NotFound,
    #[error("grid error: {0}")]
    Grid(#[from] grid_map::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidBody(err) => {
                tracing::debug!(error = %err, "rejected customer payload");
                (StatusCode::BAD_REQUEST, "Invalid JSON").into_response()
            }
            Self::InvalidId(raw) => {
                tracing::debug!(id = %raw, "rejected customer id");
                (StatusCode::BAD_REQUEST, "Invalid ID").into_response()
            }
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Grid(err) => {
                tracing::error!(error = %err, "customers map operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
