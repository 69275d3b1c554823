//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use viamon_domain::error::ViamonError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`ViamonError`] to an HTTP response with appropriate status code.
pub struct ApiError(ViamonError);

impl From<ViamonError> for ApiError {
    fn from(err: ViamonError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ViamonError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ViamonError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            ViamonError::Transport(_) | ViamonError::Publish(_) => {
                tracing::error!(error = %self.0, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
