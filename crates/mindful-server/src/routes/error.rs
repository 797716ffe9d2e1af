//! Mapping from pipeline errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use mindful_core::Error;

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// Pipeline or store failure.
    Pipeline(Error),
    /// A fixed status and `{error}` body.
    Status(StatusCode, String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Status(StatusCode::BAD_REQUEST, message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Status(StatusCode::INTERNAL_SERVER_ERROR, message.into())
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Pipeline(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Status(status, message) => {
                (status, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Pipeline(Error::Validation(m)) | ApiError::Pipeline(Error::Parse(m)) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
            }
            ApiError::Pipeline(Error::NotFound(m)) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
            }
            ApiError::Pipeline(e) => {
                error!("Request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "An error occurred processing your request",
                        "details": e.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let status = |e: ApiError| e.into_response().status();
        assert_eq!(status(Error::Validation("x".into()).into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(Error::Parse("x".into()).into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(Error::NotFound("x".into()).into()), StatusCode::NOT_FOUND);
        assert_eq!(status(Error::Llm("x".into()).into()), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(ApiError::internal("x")), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
