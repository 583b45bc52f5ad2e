use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use newsfact_core::ErrorBody;
use thiserror::Error;

use crate::state::LoadFailure;

/// Request failures, each rendered as `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    MalformedRequest(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(#[from] LoadFailure),

    #[error("{0}")]
    Inference(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::ModelLoad(_) | Self::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
