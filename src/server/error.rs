use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use super::types::ErrorBody;

/// Failures that are the server's fault rather than the caller's.
///
/// Unknown texture names are not errors at this level; handlers answer them
/// with an [`ErrorBody`] payload and a 200 status.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            ServerError::Internal(err) => error!(error = %format!("{err:#}"), "request failed"),
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("internal server error")),
        )
            .into_response()
    }
}
