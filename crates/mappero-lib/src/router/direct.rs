//! Local great-circle router
//!
//! Needs no network: the route is the great-circle arc between the two
//! positions, sampled at a configurable number of steps. When the query has
//! a departure time every point is stamped with the time needed to reach it
//! at the configured pace. Free-text addresses cannot be resolved locally.

use super::{Location, RouteCallback, RouteResult, Router, RouterError, RouterQuery};
use crate::store::OptionStore;
use crate::{GeoPoint, PathData, PathPoint, ProjectionHandle};

const KEY_SPEED: &str = "routers/direct/speed";
const KEY_STEPS: &str = "routers/direct/steps";

pub const DEFAULT_STEPS: u32 = 16;

/// Travel pace used to time the generated points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedClass {
    Slow = 1,
    #[default]
    Normal,
    Fast,
    Running,
    Cycling,
}

impl SpeedClass {
    pub fn meters_per_minute(self) -> f64 {
        match self {
            SpeedClass::Slow => 30.0,
            SpeedClass::Normal => 70.0,
            SpeedClass::Fast => 100.0,
            SpeedClass::Running => 200.0,
            SpeedClass::Cycling => 300.0,
        }
    }

    /// Persisted numeric code
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(SpeedClass::Slow),
            2 => Some(SpeedClass::Normal),
            3 => Some(SpeedClass::Fast),
            4 => Some(SpeedClass::Running),
            5 => Some(SpeedClass::Cycling),
            _ => None,
        }
    }
}

pub struct DirectRouter {
    projection: ProjectionHandle,
    speed: SpeedClass,
    steps: u32,
}

impl DirectRouter {
    pub fn new(projection: ProjectionHandle) -> Self {
        Self {
            projection,
            speed: SpeedClass::default(),
            steps: DEFAULT_STEPS,
        }
    }

    pub fn speed(&self) -> SpeedClass {
        self.speed
    }

    pub fn set_speed(&mut self, speed: SpeedClass) {
        self.speed = speed;
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Zero is accepted here and rejected when a route is calculated
    pub fn set_steps(&mut self, steps: u32) {
        self.steps = steps;
    }

    fn resolve(&self, location: &Location) -> Result<GeoPoint, RouterError> {
        match &location.address {
            Some(address) => Err(RouterError::InvalidAddress(format!(
                "{address:?} cannot be resolved without a geocoding service"
            ))),
            None => Ok(self.projection.unit_to_latlon(location.point)),
        }
    }

    fn route(&self, query: &RouterQuery) -> RouteResult {
        if self.steps == 0 {
            return Err(RouterError::InvalidOptions(
                "step count must be at least 1".into(),
            ));
        }
        let from = self.resolve(&query.from)?;
        let to = self.resolve(&query.to)?;

        let speed = self.speed.meters_per_minute() / 60.0;
        let mut path = PathData::new();
        let mut travelled = 0.0;
        let mut previous = from;
        for step in 0..=self.steps {
            let geo = from.intermediate(&to, f64::from(step) / f64::from(self.steps));
            travelled += previous.distance_to(&geo);
            previous = geo;

            let mut point = PathPoint::new(geo);
            if let Some(departure) = query.departure {
                let offset = (travelled / speed).round() as u32;
                point = point.with_time(departure.saturating_add(offset));
            }
            path.append_point(point);
        }

        let projection = self.projection.current();
        path.add_waypoint(query.from.query_text(projection.as_ref()), 0)?;
        path.add_waypoint(query.to.query_text(projection.as_ref()), path.len() - 1)?;
        Ok(path)
    }
}

impl Router for DirectRouter {
    fn name(&self) -> &'static str {
        "Direct"
    }

    fn calculate_route(&self, query: RouterQuery, callback: RouteCallback) {
        let result = self.route(&query);
        if let Err(e) = &result {
            tracing::debug!(error = %e, "Direct route failed");
        }
        callback(result);
    }

    fn has_options(&self) -> bool {
        true
    }

    fn load_options(&mut self, store: &dyn OptionStore) -> Result<(), RouterError> {
        // Validate everything before touching the current settings
        let speed = match store.get_int(KEY_SPEED)? {
            Some(code) => SpeedClass::from_code(code).ok_or_else(|| {
                RouterError::InvalidOptions(format!("unknown speed class {code}"))
            })?,
            None => self.speed,
        };
        let steps = match store.get_int(KEY_STEPS)? {
            Some(steps) => u32::try_from(steps).map_err(|_| {
                RouterError::InvalidOptions(format!("step count {steps} out of range"))
            })?,
            None => self.steps,
        };

        self.speed = speed;
        self.steps = steps;
        Ok(())
    }

    fn save_options(&self, store: &dyn OptionStore) -> Result<(), RouterError> {
        store.set_int(KEY_SPEED, self.speed.code())?;
        store.set_int(KEY_STEPS, i64::from(self.steps))?;
        Ok(())
    }
}
