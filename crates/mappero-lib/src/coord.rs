//! Coordinate value types
//!
//! [`GeoPoint`] is a WGS84 latitude/longitude pair in degrees, [`UnitPoint`] a
//! position in the application's projected unit space. The two are only ever
//! related through a [`Projection`](crate::Projection).

use geo::{Haversine, InterpolatePoint};
use std::fmt;

/// Earth's mean radius in meters, used for great-circle distances
pub const EARTH_RADIUS_M: f64 = 6371000.0;

/// A geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Calculate the Haversine distance to another point in meters
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Point at fraction `t` along the great-circle arc towards `other`;
    /// `t` is clamped to `[0, 1]` and the ends are returned exactly.
    pub fn intermediate(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        let start: geo::Point<f64> = (*self).into();
        let end: geo::Point<f64> = (*other).into();
        Haversine
            .point_at_ratio_between(start, end, t.clamp(0.0, 1.0))
            .into()
    }
}

/// Renders `"lat, lon"` with six decimal digits, the textual form remote
/// routing services accept in place of an address.
impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.lon, point.lat)
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        GeoPoint::new(point.y(), point.x())
    }
}

/// A position in projected unit space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitPoint {
    pub x: f64,
    pub y: f64,
}

impl UnitPoint {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}
