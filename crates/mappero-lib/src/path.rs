//! Path data model
//!
//! A [`PathData`] holds one or more tracks as a single append-only sequence of
//! points partitioned by [`Segment`] boundaries, plus [`WayPoint`] annotations
//! referencing points by index. Every codec builds it purely through streaming
//! appends, so no operation ever needs random-access mutation.

use crate::{GeoPoint, PathError, Projection, Result, UnitPoint};
use geo::Rect;
use std::ops::Range;

/// A recorded or planned position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathPoint {
    pub geo: GeoPoint,
    /// Altitude in meters, 0 when unknown
    pub altitude: f32,
    /// Unix epoch seconds, 0 when unknown
    pub time: u32,
}

impl PathPoint {
    pub const fn new(geo: GeoPoint) -> Self {
        Self {
            geo,
            altitude: 0.0,
            time: 0,
        }
    }

    pub fn with_altitude(mut self, altitude: f32) -> Self {
        self.altitude = altitude;
        self
    }

    pub fn with_time(mut self, time: u32) -> Self {
        self.time = time;
        self
    }
}

/// Start of a disjoint track within the point sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub start_index: usize,
}

/// A named annotation attached to one point
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WayPoint {
    pub description: String,
    pub point_index: usize,
}

/// One or more tracks with embedded waypoints
///
/// A new path is a single open track: it starts with one segment at index 0,
/// and [`break_segment`](Self::break_segment) opens the next one. Segment start
/// indices are strictly increasing and the last segment runs to the end of the
/// points, so the point sequence is partitioned without gaps or overlaps.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathData {
    points: Vec<PathPoint>,
    segments: Vec<Segment>,
    waypoints: Vec<WayPoint>,
}

impl Default for PathData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PathData {
    /// Create an empty path with its first segment open
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            segments: vec![Segment { start_index: 0 }],
            waypoints: Vec::new(),
        }
    }

    /// Append a point to the current (last) segment
    #[inline]
    pub fn append_point(&mut self, point: PathPoint) {
        self.points.push(point);
    }

    /// Open a new segment starting at the next appended point.
    ///
    /// Returns `false` and leaves the path untouched when the current segment
    /// is still empty, which covers both a fresh path and two breaks with no
    /// point appended in between.
    pub fn break_segment(&mut self) -> bool {
        let start_index = self.points.len();
        match self.segments.last() {
            Some(last) if last.start_index >= start_index => false,
            _ => {
                self.segments.push(Segment { start_index });
                true
            }
        }
    }

    /// Attach a waypoint to an existing point
    pub fn add_waypoint(
        &mut self,
        description: impl Into<String>,
        point_index: usize,
    ) -> Result<()> {
        if point_index >= self.points.len() {
            return Err(PathError::IndexOutOfRange {
                index: point_index,
                len: self.points.len(),
            });
        }
        self.waypoints.push(WayPoint {
            description: description.into(),
            point_index,
        });
        Ok(())
    }

    /// Append another path as new segments, rebasing its waypoint indices
    pub fn append_path(&mut self, other: &PathData) {
        let offset = self.points.len();
        for range in other.segment_ranges() {
            if range.is_empty() {
                continue;
            }
            self.break_segment();
            self.points.extend_from_slice(&other.points[range]);
        }
        self.waypoints
            .extend(other.waypoints.iter().map(|waypoint| WayPoint {
                description: waypoint.description.clone(),
                point_index: waypoint.point_index + offset,
            }));
    }

    #[inline]
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn waypoints(&self) -> &[WayPoint] {
        &self.waypoints
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn first(&self) -> Option<&PathPoint> {
        self.points.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&PathPoint> {
        self.points.last()
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Index range covered by a segment; the upper bound is the next
    /// segment's start, or the end of the points for the last one
    pub fn segment_range(&self, segment_index: usize) -> Option<Range<usize>> {
        let start = self.segments.get(segment_index)?.start_index;
        let end = self
            .segments
            .get(segment_index + 1)
            .map_or(self.points.len(), |next| next.start_index);
        Some(start..end)
    }

    pub fn segment_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.segments.len()).filter_map(|index| self.segment_range(index))
    }

    /// Points belonging to one segment, derived from the boundaries
    pub fn points_in_segment(&self, segment_index: usize) -> Option<&[PathPoint]> {
        self.segment_range(segment_index).map(|range| &self.points[range])
    }

    /// The waypoint attached to a point, if any
    pub fn waypoint_at(&self, point_index: usize) -> Option<&WayPoint> {
        self.waypoints
            .iter()
            .find(|waypoint| waypoint.point_index == point_index)
    }

    /// Total length in meters; segment gaps are not counted
    pub fn length(&self) -> f64 {
        self.segment_ranges()
            .map(|range| {
                self.points[range]
                    .windows(2)
                    .map(|pair| pair[0].geo.distance_to(&pair[1].geo))
                    .sum::<f64>()
            })
            .sum()
    }

    /// Bounding box with x = longitude and y = latitude
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        let first = self.points.first()?.geo;
        let (mut min, mut max) = (first, first);
        for point in &self.points[1..] {
            min.lat = min.lat.min(point.geo.lat);
            min.lon = min.lon.min(point.geo.lon);
            max.lat = max.lat.max(point.geo.lat);
            max.lon = max.lon.max(point.geo.lon);
        }
        Some(Rect::new(
            geo::Coord {
                x: min.lon,
                y: min.lat,
            },
            geo::Coord {
                x: max.lon,
                y: max.lat,
            },
        ))
    }

    /// Estimated position at a Unix time, interpolated between the two
    /// timestamped points around it. Points without a timestamp are ignored.
    /// Returns `None` when `time` falls outside the recorded interval.
    pub fn position_at(&self, time: u32) -> Option<GeoPoint> {
        let mut previous: Option<&PathPoint> = None;
        for point in self.points.iter().filter(|point| point.time != 0) {
            if point.time == time {
                return Some(point.geo);
            }
            if let Some(prev) = previous
                && prev.time < time
                && time < point.time
            {
                let t = f64::from(time - prev.time) / f64::from(point.time - prev.time);
                return Some(prev.geo.intermediate(&point.geo, t));
            }
            previous = Some(point);
        }
        None
    }

    /// Project every point with the given transform. Nothing is cached, so
    /// callers always see the projection they pass in.
    pub fn unit_points<'a>(
        &'a self,
        projection: &'a dyn Projection,
    ) -> impl Iterator<Item = UnitPoint> + 'a {
        self.points
            .iter()
            .map(move |point| projection.latlon_to_unit(point.geo))
    }
}

impl Extend<PathPoint> for PathData {
    fn extend<I: IntoIterator<Item = PathPoint>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl FromIterator<PathPoint> for PathData {
    fn from_iter<I: IntoIterator<Item = PathPoint>>(iter: I) -> Self {
        let mut path = PathData::new();
        path.extend(iter);
        path
    }
}
