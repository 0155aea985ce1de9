//! Spherical-Mercator viewport math.
//!
//! Converts between a `(center, zoom)` camera and the latitude/longitude box it
//! shows for a given viewport size. Uses the standard web-map ground resolution
//! `cos(lat) * C / (256 * 2^zoom)` meters per pixel and a flat
//! degrees-to-meters approximation, which is accurate enough at street and
//! city scale.

use crate::{BoundingBox, Coordinate, GeoError, Result};
use serde::{Deserialize, Serialize};

/// Equatorial circumference of the Earth in meters (WGS84).
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// Approximate length of one degree of latitude in meters.
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Web-map tile edge in pixels.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Latitudes are clamped to this magnitude before any `cos(lat)` division.
pub const MAX_LATITUDE: f64 = 89.9;

/// Highest zoom `zoom_from_bbox` will report (single-point boxes).
const MAX_ZOOM: f64 = 22.0;

/// Size of the rendered map in CSS/device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl ViewportSize {
    /// Creates a viewport size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Rejects zero, negative, or non-finite dimensions.
    pub fn validated(self) -> Result<Self> {
        if self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0 {
            Ok(self)
        } else {
            Err(GeoError::InvalidViewport(format!("{}x{}", self.width, self.height)))
        }
    }
}

#[inline]
fn clamp_latitude(latitude: f64) -> f64 {
    latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE)
}

/// Ground resolution in meters per pixel at `latitude` and `zoom`.
#[inline]
pub fn meters_per_pixel(latitude: f64, zoom: f64) -> f64 {
    let lat = clamp_latitude(latitude).to_radians();
    lat.cos() * EARTH_CIRCUMFERENCE_M / (TILE_SIZE_PX * 2f64.powf(zoom))
}

/// Bounding box visible in a viewport of `size` centered on `center` at `zoom`.
pub fn bbox_from_center_zoom(center: &Coordinate, zoom: f64, size: ViewportSize) -> BoundingBox {
    let lat = clamp_latitude(center.latitude);
    let mpp = meters_per_pixel(lat, zoom);

    let half_height_m = size.height / 2.0 * mpp;
    let half_width_m = size.width / 2.0 * mpp;

    let d_lat = half_height_m / METERS_PER_DEGREE_LAT;
    let d_lon = half_width_m / (METERS_PER_DEGREE_LAT * lat.to_radians().cos());

    BoundingBox::new(
        center.latitude + d_lat,
        center.latitude - d_lat,
        center.longitude + d_lon,
        center.longitude - d_lon,
    )
}

/// Largest zoom at which all of `bbox` fits inside a viewport of `size`.
///
/// Takes the minimum of the zoom needed to fit the height and the zoom needed
/// to fit the width, so the box is never cropped. Degenerate axes are ignored;
/// a single-point box reports the maximum zoom.
pub fn zoom_from_bbox(bbox: &BoundingBox, size: ViewportSize) -> f64 {
    let lat = clamp_latitude(bbox.center().latitude);
    let cos_lat = lat.to_radians().cos();

    let height_m = bbox.height_deg() * METERS_PER_DEGREE_LAT;
    let width_m = bbox.width_deg() * METERS_PER_DEGREE_LAT * cos_lat;

    let zoom_for = |extent_m: f64, pixels: f64| -> f64 {
        if extent_m <= 0.0 {
            return MAX_ZOOM;
        }
        let mpp = extent_m / pixels;
        (cos_lat * EARTH_CIRCUMFERENCE_M / (TILE_SIZE_PX * mpp)).log2()
    };

    zoom_for(height_m, size.height)
        .min(zoom_for(width_m, size.width))
        .clamp(0.0, MAX_ZOOM)
}

/// Box approximating a circle of `radius_m` around `center`.
pub fn bbox_from_radius(center: &Coordinate, radius_m: f64) -> BoundingBox {
    let lat = clamp_latitude(center.latitude);
    let d_lat = radius_m / METERS_PER_DEGREE_LAT;
    let d_lon = radius_m / (METERS_PER_DEGREE_LAT * lat.to_radians().cos());

    BoundingBox::new(
        center.latitude + d_lat,
        center.latitude - d_lat,
        center.longitude + d_lon,
        center.longitude - d_lon,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PHONE: ViewportSize = ViewportSize { width: 390.0, height: 844.0 };

    #[test]
    fn test_meters_per_pixel_equator_zoom_zero() {
        let mpp = meters_per_pixel(0.0, 0.0);
        assert!((mpp - 156_543.03).abs() < 0.1, "got {}", mpp);
    }

    #[test]
    fn test_meters_per_pixel_halves_per_zoom() {
        let z15 = meters_per_pixel(40.0, 15.0);
        let z16 = meters_per_pixel(40.0, 16.0);
        assert!((z15 / z16 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_bbox_is_centered() {
        let center = Coordinate::new(40.0, -74.0);
        let bbox = bbox_from_center_zoom(&center, 16.0, PHONE);
        let c = bbox.center();
        assert!((c.latitude - 40.0).abs() < 1e-12);
        assert!((c.longitude + 74.0).abs() < 1e-12);
        assert!(bbox.height_deg() > 0.0);
        assert!(bbox.width_deg() > 0.0);
    }

    #[test]
    fn test_lower_zoom_covers_more() {
        let center = Coordinate::new(40.0, -74.0);
        let near = bbox_from_center_zoom(&center, 17.0, PHONE);
        let far = bbox_from_center_zoom(&center, 14.0, PHONE);
        assert!(far.height_deg() > near.height_deg() * 7.9);
        assert!(far.contains(&Coordinate::new(near.north, near.east)));
    }

    #[test]
    fn test_zoom_from_bbox_takes_tighter_axis() {
        // A wide, short box must be fit by width.
        let wide = BoundingBox::new(40.001, 39.999, -73.9, -74.1);
        let tall = BoundingBox::new(40.1, 39.9, -73.999, -74.001);
        let z_wide = zoom_from_bbox(&wide, PHONE);
        let z_tall = zoom_from_bbox(&tall, PHONE);
        let shown_wide = bbox_from_center_zoom(&wide.center(), z_wide, PHONE);
        let shown_tall = bbox_from_center_zoom(&tall.center(), z_tall, PHONE);
        assert!(shown_wide.width_deg() >= wide.width_deg() - 1e-9);
        assert!(shown_wide.height_deg() >= wide.height_deg());
        assert!(shown_tall.height_deg() >= tall.height_deg() - 1e-9);
        assert!(shown_tall.width_deg() >= tall.width_deg());
    }

    #[test]
    fn test_zoom_from_degenerate_bbox() {
        let point = BoundingBox::new(40.0, 40.0, -74.0, -74.0);
        assert_eq!(zoom_from_bbox(&point, PHONE), MAX_ZOOM);
    }

    #[test]
    fn test_polar_latitude_is_clamped() {
        let bbox = bbox_from_center_zoom(&Coordinate::new(90.0, 0.0), 12.0, PHONE);
        assert!(bbox.width_deg().is_finite());
        assert!(bbox.height_deg().is_finite());
    }

    #[test]
    fn test_bbox_from_radius() {
        let bbox = bbox_from_radius(&Coordinate::new(0.0, 0.0), METERS_PER_DEGREE_LAT);
        assert!((bbox.north - 1.0).abs() < 1e-12);
        assert!((bbox.south + 1.0).abs() < 1e-12);
        assert!((bbox.east - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_validation() {
        assert!(ViewportSize::new(390.0, 844.0).validated().is_ok());
        assert!(ViewportSize::new(0.0, 844.0).validated().is_err());
        assert!(ViewportSize::new(390.0, f64::NAN).validated().is_err());
    }

    proptest! {
        #[test]
        fn prop_bbox_zoom_round_trip(
            lat in -80.0f64..80.0,
            lon in -179.0f64..179.0,
            zoom in 2.0f64..20.0,
            width in 200.0f64..2000.0,
            height in 200.0f64..2000.0,
        ) {
            let size = ViewportSize::new(width, height);
            let bbox = bbox_from_center_zoom(&Coordinate::new(lat, lon), zoom, size);
            let recovered = zoom_from_bbox(&bbox, size);
            prop_assert!((recovered - zoom).abs() < 1e-6, "zoom {} recovered as {}", zoom, recovered);
        }
    }
}
