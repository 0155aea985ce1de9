//! Error types for the geo crate.

use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur during geo operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Invalid coordinate values
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Viewport with a zero or negative dimension
    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    /// Bounding box with inverted or empty edges
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),
}

/// Error code for integration with fourmore-core error handling.
/// Range: 10xxx for geo errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoErrorCode {
    /// Invalid coordinate values
    InvalidCoordinate = 10001,
    /// Invalid viewport dimensions
    InvalidViewport = 10002,
    /// Invalid bounding box
    InvalidBoundingBox = 10003,
}

impl GeoError {
    /// Returns the error code for this error.
    pub fn code(&self) -> GeoErrorCode {
        match self {
            GeoError::InvalidCoordinate(_) => GeoErrorCode::InvalidCoordinate,
            GeoError::InvalidViewport(_) => GeoErrorCode::InvalidViewport,
            GeoError::InvalidBoundingBox(_) => GeoErrorCode::InvalidBoundingBox,
        }
    }
}
