use crate::{GeoPoint, Projection, UnitPoint};

/// One end of a route query.
///
/// When `address` is set it is authoritative; otherwise backends derive a
/// textual `"lat, lon"` form from `point` through the active projection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Location {
    pub point: UnitPoint,
    pub address: Option<String>,
}

impl Location {
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            point: UnitPoint::default(),
            address: Some(address.into()),
        }
    }

    pub fn from_point(point: UnitPoint) -> Self {
        Self {
            point,
            address: None,
        }
    }

    pub fn from_geo(geo: GeoPoint, projection: &dyn Projection) -> Self {
        Self::from_point(projection.latlon_to_unit(geo))
    }

    /// The text sent to services that take free-form locations
    pub fn query_text(&self, projection: &dyn Projection) -> String {
        match &self.address {
            Some(address) => address.clone(),
            None => projection.unit_to_latlon(self.point).to_string(),
        }
    }
}

/// A route request. Backend-specific constraints (traffic, highways, walking
/// speed) are options of the router instance, not of the query.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterQuery {
    pub from: Location,
    pub to: Location,
    /// Unix time of departure, used by backends that stamp their points
    pub departure: Option<u32>,
}

impl RouterQuery {
    pub fn new(from: Location, to: Location) -> Self {
        Self {
            from,
            to,
            departure: None,
        }
    }

    pub fn departing_at(mut self, time: u32) -> Self {
        self.departure = Some(time);
        self
    }
}
