//! Map locations addressed through the travel matrices.

use serde::{Deserialize, Serialize};

/// A location on the map: an index into the travel matrices plus a
/// geographic coordinate.
///
/// Identity is carried by the matrix index; the coordinate is descriptive
/// and never enters routing decisions.
///
/// # Examples
///
/// ```
/// use rvrp_engine::models::Point;
///
/// let p = Point::new(3, 55.75, 37.62);
/// assert_eq!(p.matrix_id(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    matrix_id: usize,
    lat: f64,
    lon: f64,
}

impl Point {
    /// Creates a point with the given matrix index and coordinate.
    pub fn new(matrix_id: usize, lat: f64, lon: f64) -> Self {
        Self {
            matrix_id,
            lat,
            lon,
        }
    }

    /// Index of this location in the travel matrices.
    pub fn matrix_id(&self) -> usize {
        self.matrix_id
    }

    /// Latitude.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude.
    pub fn lon(&self) -> f64 {
        self.lon
    }
}
