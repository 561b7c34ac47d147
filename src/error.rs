use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;

use crate::models::ErrorBody;
use crate::services::chain::ChainError;

pub const MISSING_PROMPT_MESSAGE: &str = "No prompt provided";
pub const UPSTREAM_MESSAGE: &str = "Upstream completion service failed";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Error returned by HTTP handlers; rendered as `{"error": ...}`.
#[derive(Debug)]
pub enum AppError {
    MissingInput,
    Upstream,
    Internal,
}

impl From<ChainError> for AppError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::MissingInput => AppError::MissingInput,
            ChainError::Upstream { .. } => {
                tracing::error!(error = %err, "Prompt chain failed upstream");
                AppError::Upstream
            }
            ChainError::Template(_) => {
                tracing::error!(error = %err, "Prompt chain failed to render a template");
                AppError::Internal
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::MissingInput => (StatusCode::BAD_REQUEST, MISSING_PROMPT_MESSAGE),
            AppError::Upstream => (StatusCode::BAD_GATEWAY, UPSTREAM_MESSAGE),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE),
        };

        (
            status,
            Json(ErrorBody {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}
