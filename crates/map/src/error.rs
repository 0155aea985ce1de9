//! Error types for the map crate.

use fourmore_core::{Error as CoreError, ErrorCode};
use fourmore_geo::GeoError;
use fourmore_search::SearchError;
use thiserror::Error;

/// Result type alias for map operations.
pub type Result<T> = std::result::Result<T, MapError>;

/// Why a position could not be determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("location request timed out")]
    Timeout,

    #[error("geolocation is not supported")]
    Unsupported,
}

impl LocationError {
    /// Short message shown next to the map
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Location access was denied. Enable it in your settings to see places near you."
            }
            Self::PositionUnavailable => "Your location is unavailable right now.",
            Self::Timeout => "Finding your location took too long. Try again.",
            Self::Unsupported => "Location is not supported on this device.",
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PermissionDenied => ErrorCode::PermissionDenied,
            Self::PositionUnavailable => ErrorCode::PositionUnavailable,
            Self::Timeout => ErrorCode::LocationTimeout,
            Self::Unsupported => ErrorCode::LocationUnsupported,
        }
    }
}

impl From<LocationError> for CoreError {
    fn from(err: LocationError) -> Self {
        let suggestion = match err {
            LocationError::PermissionDenied => "Allow location access, or pass --lat and --lon",
            LocationError::Unsupported => "Pass --lat and --lon explicitly",
            LocationError::PositionUnavailable | LocationError::Timeout => "Retry the location request",
        };
        CoreError::new(err.code(), err.user_message()).with_suggestion(suggestion)
    }
}

/// Errors surfaced by the map layer
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Invalid geometry: {0}")]
    Geo(#[from] GeoError),

    #[error("No active category search")]
    NoActiveCategory,
}

impl MapError {
    /// Short message for display near the affected control
    pub fn user_message(&self) -> String {
        match self {
            Self::Location(e) => e.user_message().to_string(),
            Self::Search(e) => e.user_message(),
            Self::Geo(_) | Self::NoActiveCategory => {
                fourmore_search::SEARCH_UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_messages_are_distinct() {
        let all = [
            LocationError::PermissionDenied,
            LocationError::PositionUnavailable,
            LocationError::Timeout,
            LocationError::Unsupported,
        ];
        let messages: std::collections::HashSet<_> = all.iter().map(LocationError::user_message).collect();
        assert_eq!(messages.len(), all.len());
    }

    #[test]
    fn test_location_error_maps_to_core_code() {
        let err: CoreError = LocationError::Timeout.into();
        assert_eq!(err.code, ErrorCode::LocationTimeout);
        assert!(err.suggestion.is_some());
    }
}
