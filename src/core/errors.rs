use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::compare::CompareError;

/// Boundary error for HTTP handlers.
///
/// Whatever happened below the handler, the client only ever sees the
/// uniform `{"incorrect": true, "kind": ...}` body. Details stay in the logs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("comparison failed: {0}")]
    Comparison(#[from] CompareError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Comparison(err) => err.status_code(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_input",
            ApiError::Comparison(err) => err.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({ "incorrect": true, "kind": self.kind() }));
        (self.status(), body).into_response()
    }
}
