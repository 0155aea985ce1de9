//! Geospatial utilities for the FourMore map client.
//!
//! This crate provides:
//! - Coordinates and latitude/longitude bounding boxes
//! - Spherical-Mercator viewport math (center + zoom <-> bounding box)
//! - Haversine distance calculations
//! - Human-readable distance formatting
//!
//! # Example
//!
//! ```
//! use fourmore_geo::{bbox_from_center_zoom, zoom_from_bbox, Coordinate, ViewportSize};
//!
//! let center = Coordinate::new(40.0, -74.0);
//! let size = ViewportSize::new(390.0, 844.0);
//!
//! let bbox = bbox_from_center_zoom(&center, 15.0, size);
//! assert!(bbox.contains(&center));
//! assert!((zoom_from_bbox(&bbox, size) - 15.0).abs() < 1e-6);
//! ```

mod bbox;
mod error;
mod format;
mod haversine;
mod viewport;

pub use bbox::BoundingBox;
pub use error::{GeoError, GeoErrorCode, Result};
pub use format::format_distance;
pub use haversine::{haversine_distance, haversine_distance_meters, EARTH_RADIUS_KM, EARTH_RADIUS_M};
pub use viewport::{
    bbox_from_center_zoom, bbox_from_radius, meters_per_pixel, zoom_from_bbox, ViewportSize,
    EARTH_CIRCUMFERENCE_M, MAX_LATITUDE, METERS_PER_DEGREE_LAT, TILE_SIZE_PX,
};

/// A geographic coordinate with latitude and longitude (WGS84 degrees).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    ///
    /// # Arguments
    /// * `latitude` - Latitude in degrees (-90 to 90)
    /// * `longitude` - Longitude in degrees (-180 to 180)
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Returns true if the coordinate has valid values.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Validates the coordinate, returning it unchanged when in range.
    pub fn validated(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(GeoError::InvalidCoordinate(format!(
                "({}, {}) is outside WGS84 bounds",
                self.latitude, self.longitude
            )))
        }
    }

    /// Returns true if either axis differs from `other` by more than `threshold_deg`.
    ///
    /// This is the cheap degree-space displacement test used to decide whether
    /// the map "has moved"; it deliberately avoids a haversine call.
    #[inline]
    pub fn moved_beyond(&self, other: &Coordinate, threshold_deg: f64) -> bool {
        (self.latitude - other.latitude).abs() > threshold_deg
            || (self.longitude - other.longitude).abs() > threshold_deg
    }

    /// Rounds both axes to `decimals` places.
    pub fn rounded(&self, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        Self {
            latitude: (self.latitude * factor).round() / factor,
            longitude: (self.longitude * factor).round() / factor,
        }
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(&self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lon): (f64, f64)) -> Self {
        Self::new(lat, lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_creation() {
        let coord = Coordinate::new(40.7128, -74.0060);
        assert_eq!(coord.latitude, 40.7128);
        assert_eq!(coord.longitude, -74.0060);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
        assert!(Coordinate::new(95.0, 0.0).validated().is_err());
    }

    #[test]
    fn test_coordinate_from_tuple() {
        let coord: Coordinate = (40.0, -74.0).into();
        assert_eq!(coord.latitude, 40.0);
        assert_eq!(coord.longitude, -74.0);
    }

    #[test]
    fn test_moved_beyond_threshold() {
        let origin = Coordinate::new(40.0, -74.0);
        assert!(!origin.moved_beyond(&Coordinate::new(40.001, -74.001), 0.002));
        assert!(origin.moved_beyond(&Coordinate::new(40.003, -74.0), 0.002));
        assert!(origin.moved_beyond(&Coordinate::new(40.0, -73.997), 0.002));
    }

    #[test]
    fn test_rounded() {
        let coord = Coordinate::new(40.123_456_789, -74.987_654_321).rounded(6);
        assert_eq!(coord.latitude, 40.123457);
        assert_eq!(coord.longitude, -74.987654);
    }
}
