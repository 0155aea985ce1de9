//! Latitude/longitude bounding boxes.

use crate::{Coordinate, GeoError, Result};
use serde::{Deserialize, Serialize};

/// A rectangle in latitude/longitude expressed as north/south/east/west edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Northern edge (max latitude)
    pub north: f64,
    /// Southern edge (min latitude)
    pub south: f64,
    /// Eastern edge (max longitude)
    pub east: f64,
    /// Western edge (min longitude)
    pub west: f64,
}

impl BoundingBox {
    /// Creates a bounding box from its four edges.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self { north, south, east, west }
    }

    /// Creates a bounding box, rejecting inverted edges.
    pub fn try_new(north: f64, south: f64, east: f64, west: f64) -> Result<Self> {
        if north < south {
            return Err(GeoError::InvalidBoundingBox(format!(
                "north ({north}) is below south ({south})"
            )));
        }
        if east < west {
            return Err(GeoError::InvalidBoundingBox(format!(
                "east ({east}) is west of west ({west})"
            )));
        }
        Ok(Self::new(north, south, east, west))
    }

    /// Smallest box containing every coordinate, or `None` for an empty input.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first.latitude, first.latitude, first.longitude, first.longitude);
        for point in iter {
            bbox.extend(point);
        }
        Some(bbox)
    }

    /// Grows the box to include `point`.
    pub fn extend(&mut self, point: &Coordinate) {
        self.north = self.north.max(point.latitude);
        self.south = self.south.min(point.latitude);
        self.east = self.east.max(point.longitude);
        self.west = self.west.min(point.longitude);
    }

    /// Centroid of the box.
    pub fn center(&self) -> Coordinate {
        Coordinate::new((self.north + self.south) / 2.0, (self.east + self.west) / 2.0)
    }

    /// Latitude span in degrees.
    pub fn height_deg(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees.
    pub fn width_deg(&self) -> f64 {
        self.east - self.west
    }

    /// Returns true if `point` lies inside or on the edge of the box.
    pub fn contains(&self, point: &Coordinate) -> bool {
        point.latitude <= self.north
            && point.latitude >= self.south
            && point.longitude <= self.east
            && point.longitude >= self.west
    }

    /// A box collapsed to a single point (all edges equal).
    pub fn is_degenerate(&self) -> bool {
        self.height_deg() == 0.0 && self.width_deg() == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let points = [
            Coordinate::new(40.0, -74.0),
            Coordinate::new(40.5, -73.5),
            Coordinate::new(39.8, -74.2),
        ];
        let bbox = BoundingBox::from_points(points.iter()).unwrap();
        assert_eq!(bbox, BoundingBox::new(40.5, 39.8, -73.5, -74.2));
    }

    #[test]
    fn test_from_points_empty() {
        let points: Vec<Coordinate> = Vec::new();
        assert!(BoundingBox::from_points(points.iter()).is_none());
    }

    #[test]
    fn test_single_point_is_degenerate() {
        let points = [Coordinate::new(40.0, -74.0)];
        let bbox = BoundingBox::from_points(points.iter()).unwrap();
        assert!(bbox.is_degenerate());
    }

    #[test]
    fn test_center_and_contains() {
        let bbox = BoundingBox::new(41.0, 39.0, -73.0, -75.0);
        assert_eq!(bbox.center(), Coordinate::new(40.0, -74.0));
        assert!(bbox.contains(&Coordinate::new(40.0, -74.0)));
        assert!(bbox.contains(&Coordinate::new(41.0, -73.0)));
        assert!(!bbox.contains(&Coordinate::new(41.1, -74.0)));
    }

    #[test]
    fn test_try_new_rejects_inverted() {
        assert!(BoundingBox::try_new(39.0, 41.0, -73.0, -75.0).is_err());
        assert!(BoundingBox::try_new(41.0, 39.0, -75.0, -73.0).is_err());
        assert!(BoundingBox::try_new(41.0, 39.0, -73.0, -75.0).is_ok());
    }
}
