//! Error types for the API client

use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Short message shown when the backend cannot be reached or fails
pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "FourMore is unavailable right now. Try again shortly.";

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// The session token was missing or rejected; the stored session has been cleared
    #[error("Not authenticated")]
    Unauthorized,

    /// The account is not yet admitted
    #[error("Waitlisted: {message}")]
    Waitlisted {
        /// Message from the backend, shown verbatim
        message: String,
    },

    /// Request rejected client-side before sending
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Session storage could not be read or written
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing env var error
    pub fn missing_env(var: impl Into<String>) -> Self {
        Self::MissingEnvVar(var.into())
    }

    /// Create an API response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Create a client-side validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True if the backend rejected the session
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Check if this error is retryable
    ///
    /// The client never retries on its own; callers use this to decide
    /// whether to offer a manual retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            Self::ApiResponse { status, .. } => *status >= 500 || *status == 429,
            Self::Json(_)
            | Self::Config(_)
            | Self::MissingEnvVar(_)
            | Self::Unauthorized
            | Self::Waitlisted { .. }
            | Self::Validation(_)
            | Self::InvalidUrl(_)
            | Self::Storage(_) => false,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::ApiResponse { status, .. } => (400..500).contains(status),
            Self::Unauthorized | Self::Waitlisted { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if *status >= 500)
    }

    /// Short message suitable for display next to the failed control
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::Waitlisted { message } => message.clone(),
            Self::Validation(message) => message.clone(),
            Self::ApiResponse { status: 404, .. } => "That place could not be found.".to_string(),
            Self::ApiResponse { status, message } if (400..500).contains(status) => message.clone(),
            _ => SERVICE_UNAVAILABLE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ApiError::api_response(503, "down").is_server_error());
        assert!(ApiError::api_response(503, "down").is_retryable());
        assert!(ApiError::api_response(422, "bad").is_client_error());
        assert!(!ApiError::api_response(422, "bad").is_retryable());
        assert!(ApiError::Unauthorized.is_client_error());
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert!(!ApiError::validation("radius").is_retryable());
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            ApiError::api_response(500, "Traceback ...").user_message(),
            SERVICE_UNAVAILABLE_MESSAGE
        );
        assert_eq!(
            ApiError::Waitlisted {
                message: "We're inviting people in waves.".into()
            }
            .user_message(),
            "We're inviting people in waves."
        );
        assert_eq!(
            ApiError::api_response(400, "Comment too long").user_message(),
            "Comment too long"
        );
    }
}
