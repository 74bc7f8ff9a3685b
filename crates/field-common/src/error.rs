//! Error types for the field rendering pipeline.

use thiserror::Error;

/// Result type alias using FieldError.
pub type FieldResult<T> = Result<T, FieldError>;

/// Primary error type for interpolation and rendering operations.
#[derive(Debug, Error)]
pub enum FieldError {
    // === Input Errors ===
    #[error("No usable measurement points")]
    EmptyInput,

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Interpolation Errors ===
    #[error("Time slice {time} has {found} points, at least {required} are required")]
    InsufficientPoints {
        time: String,
        found: usize,
        required: usize,
    },

    #[error("Only {found} usable time slices, at least 2 are required for interpolation")]
    InsufficientFrames { found: usize },

    #[error("Interpolation system is singular: {0}")]
    SingularSystem(String),

    // === Geometry Errors ===
    #[error("Failed to load boundary geometry: {0}")]
    GeometryLoad(String),

    // === Output Errors ===
    #[error("Encoding failed: {0}")]
    Encoding(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Request exceeds {limit}: {requested} > {allowed}")]
    ResourceLimit {
        limit: &'static str,
        requested: usize,
        allowed: usize,
    },

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FieldError {
    /// Create an InvalidParameter error.
    pub fn invalid(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an Encoding error.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Stable machine-readable code reported to callers.
    pub fn error_code(&self) -> &'static str {
        match self {
            FieldError::EmptyInput => "EmptyInput",
            FieldError::InvalidParameter { .. } => "InvalidParameter",
            FieldError::InsufficientPoints { .. } => "InsufficientPoints",
            FieldError::InsufficientFrames { .. } => "InsufficientFrames",
            FieldError::SingularSystem(_) => "InsufficientPoints",
            FieldError::GeometryLoad(_) => "GeometryLoad",
            FieldError::Encoding(_) => "Encoding",
            FieldError::ResourceLimit { .. } => "ResourceLimit",
            FieldError::Render(_) | FieldError::Internal(_) => "Internal",
        }
    }

    /// Whether the message is safe and useful to show to the requester.
    ///
    /// Everything else is reported as a generic internal failure.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            FieldError::GeometryLoad(_) | FieldError::Render(_) | FieldError::Internal(_)
        )
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            FieldError::EmptyInput | FieldError::InvalidParameter { .. } => 400,

            FieldError::InsufficientPoints { .. }
            | FieldError::InsufficientFrames { .. }
            | FieldError::SingularSystem(_) => 422,

            FieldError::ResourceLimit { .. } => 413,

            _ => 500,
        }
    }
}

impl From<std::io::Error> for FieldError {
    fn from(err: std::io::Error) -> Self {
        FieldError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_distinguish_conditions() {
        assert_eq!(FieldError::EmptyInput.http_status_code(), 400);
        assert_eq!(
            FieldError::InsufficientFrames { found: 1 }.http_status_code(),
            422
        );
        assert_eq!(FieldError::encoding("gif").http_status_code(), 500);
        assert_eq!(FieldError::encoding("gif").error_code(), "Encoding");
    }

    #[test]
    fn test_internal_errors_are_not_user_facing() {
        assert!(!FieldError::Internal("boom".into()).is_user_facing());
        assert!(!FieldError::GeometryLoad("missing".into()).is_user_facing());
        assert!(FieldError::EmptyInput.is_user_facing());
    }
}
