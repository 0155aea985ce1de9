//! Error types for the search crate.

use fourmore_api_client::ApiError;
use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Shown in place of results when a search request fails
pub const SEARCH_UNAVAILABLE_MESSAGE: &str = "Search is unavailable right now. Try again shortly.";

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Invalid query
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Category mapping could not be parsed
    #[error("Invalid category mapping: {0}")]
    Catalog(#[from] serde_json::Error),

    /// Category mapping file could not be read
    #[error("Cannot read category mapping: {0}")]
    Io(#[from] std::io::Error),

    /// The backend request failed
    #[error("Search request failed: {0}")]
    Backend(#[from] ApiError),
}

impl SearchError {
    /// Short message for display next to the search control
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidQuery(message) => message.clone(),
            Self::Backend(ApiError::Unauthorized) => ApiError::Unauthorized.user_message(),
            Self::Backend(_) | Self::Catalog(_) | Self::Io(_) => SEARCH_UNAVAILABLE_MESSAGE.to_string(),
        }
    }
}
