//! Geographic helpers for dashboard maps
//!
//! This module provides the coordinate types produced by analytics rows and
//! the spherical centroid used to centre a map view on them.

use crate::error::{ColumnarError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A (longitude, latitude) pair in decimal degrees (WGS84).
///
/// The field order follows GeoJSON: longitude first.
///
/// # Examples
///
/// ```rust
/// use columnardemo::CoordinatePair;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dallas = CoordinatePair::try_new(-96.7970, 32.7767)?;
/// assert_eq!(dallas.lat, 32.7767);
///
/// assert!(CoordinatePair::try_new(200.0, 0.0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinatePair {
    /// Longitude in decimal degrees (-180.0 to +180.0)
    pub lon: f64,
    /// Latitude in decimal degrees (-90.0 to +90.0)
    pub lat: f64,
}

impl CoordinatePair {
    /// Create a pair without range checks.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Create a pair, rejecting values outside the WGS84 range.
    pub fn try_new(lon: f64, lat: f64) -> Result<Self> {
        let pair = Self { lon, lat };
        if pair.is_valid() {
            Ok(pair)
        } else {
            Err(ColumnarError::InvalidCoordinate { lon, lat })
        }
    }

    /// Whether both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Unit-sphere Cartesian projection `(x, y, z)`.
    fn to_unit_vector(self) -> (f64, f64, f64) {
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();
        (lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
    }
}

impl From<geo::Coord<f64>> for CoordinatePair {
    fn from(coord: geo::Coord<f64>) -> Self {
        Self::new(coord.x, coord.y)
    }
}

impl From<geo::Point<f64>> for CoordinatePair {
    fn from(point: geo::Point<f64>) -> Self {
        Self::new(point.x(), point.y())
    }
}

impl From<CoordinatePair> for geo::Point<f64> {
    fn from(pair: CoordinatePair) -> Self {
        geo::Point::new(pair.lon, pair.lat)
    }
}

impl fmt::Display for CoordinatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lon, self.lat)
    }
}

/// A single aggregate point, latitude first as map libraries expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Centroid> for CoordinatePair {
    fn from(c: Centroid) -> Self {
        CoordinatePair::new(c.longitude, c.latitude)
    }
}

impl From<Centroid> for geo::Point<f64> {
    fn from(c: Centroid) -> Self {
        geo::Point::new(c.longitude, c.latitude)
    }
}

impl fmt::Display for Centroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Centroid plus the length of the mean unit vector it was recovered from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalMean {
    pub centroid: Centroid,
    /// Norm of the mean Cartesian vector, in `[0, 1]`.
    ///
    /// 1.0 when all points coincide; close to 0.0 when the points cancel
    /// out (e.g. antipodal pairs), in which case the centroid direction is
    /// numerically unstable.
    pub resultant_length: f64,
}

impl SphericalMean {
    /// Whether the points cancel out to within `tolerance`.
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        self.resultant_length < tolerance
    }
}

/// Geographic mean of `points` via unit-sphere vector averaging.
///
/// Averaging raw degrees breaks down near the poles and across the
/// antimeridian; averaging the 3D unit vectors does not.
///
/// # Examples
///
/// ```rust
/// use columnardemo::{centroid, CoordinatePair};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let points = [CoordinatePair::new(-179.0, 10.0), CoordinatePair::new(179.0, 10.0)];
/// let c = centroid(&points)?;
/// assert!(c.longitude.abs() > 179.0);
/// # Ok(())
/// # }
/// ```
pub fn centroid(points: &[CoordinatePair]) -> Result<Centroid> {
    spherical_mean(points).map(|mean| mean.centroid)
}

/// Like [`centroid`], also reporting how well-defined the result is.
pub fn spherical_mean(points: &[CoordinatePair]) -> Result<SphericalMean> {
    if points.is_empty() {
        return Err(ColumnarError::EmptyInput);
    }

    let (mut x_total, mut y_total, mut z_total) = (0.0, 0.0, 0.0);
    for point in points {
        let (x, y, z) = point.to_unit_vector();
        x_total += x;
        y_total += y;
        z_total += z;
    }

    let count = points.len() as f64;
    let x_avg = x_total / count;
    let y_avg = y_total / count;
    let z_avg = z_total / count;

    let hyp = (x_avg * x_avg + y_avg * y_avg).sqrt();
    let longitude = y_avg.atan2(x_avg).to_degrees();
    let latitude = z_avg.atan2(hyp).to_degrees();

    Ok(SphericalMean {
        centroid: Centroid {
            latitude,
            longitude,
        },
        resultant_length: (hyp * hyp + z_avg * z_avg).sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_coordinate_validation() {
        assert!(CoordinatePair::try_new(180.0, 90.0).is_ok());
        assert!(CoordinatePair::try_new(-180.0, -90.0).is_ok());
        assert!(CoordinatePair::try_new(180.1, 0.0).is_err());
        assert!(CoordinatePair::try_new(0.0, -90.5).is_err());
        assert!(CoordinatePair::try_new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(centroid(&[]), Err(ColumnarError::EmptyInput)));
    }

    #[test]
    fn test_single_point_is_itself() {
        for (lon, lat) in [(0.0, 0.0), (-74.006, 40.7128), (151.2153, -33.8568), (179.5, 89.0)] {
            let c = centroid(&[CoordinatePair::new(lon, lat)]).unwrap();
            assert!((c.latitude - lat).abs() < TOLERANCE, "lat {} vs {}", c.latitude, lat);
            assert!((c.longitude - lon).abs() < TOLERANCE, "lon {} vs {}", c.longitude, lon);
        }
    }

    #[test]
    fn test_square_around_origin() {
        let points = [
            CoordinatePair::new(-1.0, -1.0),
            CoordinatePair::new(1.0, -1.0),
            CoordinatePair::new(1.0, 1.0),
            CoordinatePair::new(-1.0, 1.0),
        ];
        let c = centroid(&points).unwrap();
        assert!(c.latitude.abs() < TOLERANCE);
        assert!(c.longitude.abs() < TOLERANCE);
    }

    #[test]
    fn test_antimeridian() {
        let points = [CoordinatePair::new(-179.0, 10.0), CoordinatePair::new(179.0, 10.0)];
        let c = centroid(&points).unwrap();
        assert!((c.longitude.abs() - 180.0).abs() < 1e-6);
        assert!((c.latitude - 10.0).abs() < 0.1);
    }

    #[test]
    fn test_antipodal_is_degenerate() {
        let points = [CoordinatePair::new(0.0, 0.0), CoordinatePair::new(180.0, 0.0)];
        let mean = spherical_mean(&points).unwrap();
        assert!(mean.is_degenerate(1e-9));

        let mean = spherical_mean(&[CoordinatePair::new(10.0, 20.0)]).unwrap();
        assert!((mean.resultant_length - 1.0).abs() < TOLERANCE);
        assert!(!mean.is_degenerate(1e-9));
    }

    #[test]
    fn test_geo_conversions() {
        let pair: CoordinatePair = geo::Point::new(-96.8, 32.8).into();
        assert_eq!(pair, CoordinatePair::new(-96.8, 32.8));

        let point: geo::Point<f64> = Centroid {
            latitude: 32.8,
            longitude: -96.8,
        }
        .into();
        assert_eq!(point.x(), -96.8);
        assert_eq!(point.y(), 32.8);
    }

    #[test]
    fn test_display() {
        let c = Centroid {
            latitude: 40.7128,
            longitude: -74.006,
        };
        assert_eq!(format!("{}", c), "(40.712800, -74.006000)");
    }
}
