//! Coordinate transform provider
//!
//! The core never hard-codes a projection: every conversion between
//! [`GeoPoint`] and [`UnitPoint`] goes through a [`Projection`]. The active
//! projection lives in a [`ProjectionHandle`], a cheaply cloneable provider that
//! can be swapped at runtime. Replacing it is a single atomic substitution
//! observed by subsequent calls; subscribers are notified through a
//! `tokio::sync::watch` channel. Unit coordinates computed before a swap are
//! not recomputed.

use crate::{GeoPoint, UnitPoint};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Precomputed constant: 180.0 / EARTH_MERCATOR_MAX
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;

/// Precomputed constant: PI / EARTH_MERCATOR_MAX
const Y_TO_LAT_FACTOR: f64 = std::f64::consts::PI / EARTH_MERCATOR_MAX;

/// A pair of pure functions between geographic and unit coordinates
pub trait Projection: Send + Sync {
    fn latlon_to_unit(&self, geo: GeoPoint) -> UnitPoint;

    fn unit_to_latlon(&self, unit: UnitPoint) -> GeoPoint;
}

/// Spherical Web Mercator with unit coordinates in meters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebMercator;

impl Projection for WebMercator {
    /// Latitude is clamped to the valid Web Mercator range
    #[inline]
    fn latlon_to_unit(&self, geo: GeoPoint) -> UnitPoint {
        let lat = geo.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

        let x = geo.lon * LON_TO_X_FACTOR;
        let lat_rad = lat.to_radians();
        let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;

        UnitPoint::new(x, y)
    }

    #[inline]
    fn unit_to_latlon(&self, unit: UnitPoint) -> GeoPoint {
        let lon = unit.x * X_TO_LON_FACTOR;
        let lat = (std::f64::consts::PI / 2.0 - 2.0 * ((-unit.y * Y_TO_LAT_FACTOR).exp()).atan())
            .to_degrees();
        GeoPoint::new(lat, lon)
    }
}

/// Shared reference to a projection implementation
pub type SharedProjection = Arc<dyn Projection>;

/// Process-wide, swappable projection provider
///
/// Clones share the same underlying slot, so a handle injected into routers at
/// startup sees every later [`replace`](Self::replace).
#[derive(Clone)]
pub struct ProjectionHandle {
    sender: Arc<watch::Sender<SharedProjection>>,
}

impl ProjectionHandle {
    pub fn new(projection: impl Projection + 'static) -> Self {
        let (sender, _receiver) = watch::channel(Arc::new(projection) as SharedProjection);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// The projection active right now
    pub fn current(&self) -> SharedProjection {
        self.sender.borrow().clone()
    }

    /// Atomically substitute the active projection and notify subscribers
    pub fn replace(&self, projection: impl Projection + 'static) {
        self.sender.send_replace(Arc::new(projection));
        tracing::debug!(
            subscribers = self.sender.receiver_count(),
            "Active projection replaced"
        );
    }

    /// Receive a notification every time the active projection changes
    pub fn subscribe(&self) -> watch::Receiver<SharedProjection> {
        self.sender.subscribe()
    }

    #[inline]
    pub fn latlon_to_unit(&self, geo: GeoPoint) -> UnitPoint {
        self.current().latlon_to_unit(geo)
    }

    #[inline]
    pub fn unit_to_latlon(&self, unit: UnitPoint) -> GeoPoint {
        self.current().unit_to_latlon(unit)
    }
}

impl Default for ProjectionHandle {
    fn default() -> Self {
        Self::new(WebMercator)
    }
}

impl fmt::Debug for ProjectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionHandle")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plate carree scaled by a constant, handy to tell projections apart
    struct Scaled(f64);

    impl Projection for Scaled {
        fn latlon_to_unit(&self, geo: GeoPoint) -> UnitPoint {
            UnitPoint::new(geo.lon * self.0, geo.lat * self.0)
        }

        fn unit_to_latlon(&self, unit: UnitPoint) -> GeoPoint {
            GeoPoint::new(unit.y / self.0, unit.x / self.0)
        }
    }

    #[test]
    fn test_web_mercator_origin() {
        let unit = WebMercator.latlon_to_unit(GeoPoint::new(0.0, 0.0));
        assert!(unit.x.abs() < 0.01);
        assert!(unit.y.abs() < 0.01);
    }

    #[test]
    fn test_web_mercator_bounds() {
        let west = WebMercator.latlon_to_unit(GeoPoint::new(0.0, -180.0));
        assert!((west.x + EARTH_MERCATOR_MAX).abs() < 1.0);

        let east = WebMercator.latlon_to_unit(GeoPoint::new(0.0, 180.0));
        assert!((east.x - EARTH_MERCATOR_MAX).abs() < 1.0);

        // Poles are clamped instead of going to infinity
        let north = WebMercator.latlon_to_unit(GeoPoint::new(90.0, 0.0));
        assert!(north.y.is_finite());
    }

    #[test]
    fn test_web_mercator_roundtrip() {
        let geo = GeoPoint::new(60.2, 24.9);
        let back = WebMercator.unit_to_latlon(WebMercator.latlon_to_unit(geo));
        assert!((geo.lat - back.lat).abs() < 1e-9);
        assert!((geo.lon - back.lon).abs() < 1e-9);
    }

    #[test]
    fn test_handle_uses_latest_projection() {
        let handle = ProjectionHandle::new(Scaled(1.0));
        let clone = handle.clone();
        let geo = GeoPoint::new(10.0, 20.0);
        assert_eq!(clone.latlon_to_unit(geo), UnitPoint::new(20.0, 10.0));

        handle.replace(Scaled(2.0));
        assert_eq!(clone.latlon_to_unit(geo), UnitPoint::new(40.0, 20.0));
        assert_eq!(clone.unit_to_latlon(UnitPoint::new(40.0, 20.0)), geo);
    }

    #[test]
    fn test_handle_notifies_subscribers() {
        let handle = ProjectionHandle::default();
        let mut receiver = handle.subscribe();
        assert!(!receiver.has_changed().unwrap());

        handle.replace(Scaled(3.0));
        assert!(receiver.has_changed().unwrap());
        let active = receiver.borrow_and_update().clone();
        assert_eq!(
            active.latlon_to_unit(GeoPoint::new(1.0, 1.0)),
            UnitPoint::new(3.0, 3.0)
        );
        assert!(!receiver.has_changed().unwrap());
    }
}
