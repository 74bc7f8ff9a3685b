//! Error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use field_common::FieldError;
use serde::Serialize;
use tracing::{error, warn};

/// Anything a handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Malformed body or query string.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Field(e) => e.error_code(),
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Field(e) => StatusCode::from_u16(e.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_user_facing(&self) -> bool {
        match self {
            ApiError::Field(e) => e.is_user_facing(),
            ApiError::BadRequest(_) => true,
            ApiError::Internal(_) => false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        metrics::counter!("field_request_failures_total", "code" => code).increment(1);

        // Internal detail stays in the log
        let message = if self.is_user_facing() {
            warn!(code, error = %self, "Request rejected");
            self.to_string()
        } else {
            error!(code, error = %self, "Request failed");
            "Internal server error".to_string()
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                code,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_field_error() {
        let err = ApiError::from(FieldError::InsufficientFrames { found: 1 });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "InsufficientFrames");

        let err = ApiError::from(FieldError::GeometryLoad("/srv/x.geojson".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_user_facing());
    }
}
