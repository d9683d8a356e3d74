use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::external::provider::ProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Flat error contract: a response body is either a full indicator report or
/// `{"error": "<text>"}`, never a mixture, and both arrive with the same
/// status code. Clients branch on the presence of the `error` key alone.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::OK,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
