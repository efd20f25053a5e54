//! KML reader
//!
//! Placemarks are read in document order from the `Document` container (and
//! any `Folder` inside it). A placemark whose geometry is a single point and
//! which carries a non-empty name is a waypoint candidate; every other
//! placemark contributes its points to the path. Once the whole document has
//! been read, each candidate is attached to the first matching point after the
//! previous match. Candidates with no matching point are dropped.
//!
//! KML coordinates are `lon,lat[,alt]`: longitude comes first.

use super::{ParseError, PathReader, XmlTokens};
use crate::{GeoPoint, PathData, PathPoint};
use std::io::Read;

/// The KML codec (read only)
#[derive(Debug, Clone, Copy, Default)]
pub struct Kml;

struct WaypointCandidate {
    name: String,
    geo: GeoPoint,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PathReader for Kml {
    fn read<R: Read>(
        &self,
        tokens: &mut XmlTokens<R>,
        data: &mut PathData,
    ) -> Result<(), ParseError> {
        let root = tokens
            .next_child()?
            .ok_or_else(|| ParseError::UnexpectedStructure("empty KML document".into()))?;
        if root.name != "kml" {
            return Err(ParseError::UnexpectedStructure(format!(
                "expected <kml> root, found <{}>",
                root.name
            )));
        }
        match tokens.next_child()? {
            Some(container) if container.name == "Document" => {}
            Some(other) => {
                return Err(ParseError::UnexpectedStructure(format!(
                    "expected <Document> in <kml>, found <{}>",
                    other.name
                )));
            }
            None => {
                return Err(ParseError::UnexpectedStructure(
                    "<kml> has no <Document>".into(),
                ));
            }
        }

        let first_index = data.len();
        let mut candidates = Vec::new();
        read_container(tokens, data, &mut candidates)?;
        // Anything after the Document is ignored
        while tokens.next_child()?.is_some() {
            tokens.skip_element()?;
        }

        let candidate_count = candidates.len();
        let attached = attach_waypoints(data, first_index, candidates)?;
        tracing::debug!(
            points = data.len() - first_index,
            waypoints = attached,
            dropped = candidate_count - attached,
            "KML document read"
        );
        Ok(())
    }
}

fn read_container<R: Read>(
    tokens: &mut XmlTokens<R>,
    data: &mut PathData,
    candidates: &mut Vec<WaypointCandidate>,
) -> Result<(), ParseError> {
    while let Some(child) = tokens.next_child()? {
        match child.name.as_str() {
            "Placemark" => read_placemark(tokens, data, candidates)?,
            "Folder" => read_container(tokens, data, candidates)?,
            _ => tokens.skip_element()?,
        }
    }
    Ok(())
}

fn read_placemark<R: Read>(
    tokens: &mut XmlTokens<R>,
    data: &mut PathData,
    candidates: &mut Vec<WaypointCandidate>,
) -> Result<(), ParseError> {
    let mut name = None;
    let mut points = Vec::new();
    while let Some(child) = tokens.next_child()? {
        match child.name.as_str() {
            "name" => name = Some(tokens.read_text()?.trim().to_string()),
            "Point" | "LineString" => read_geometry(tokens, &mut points)?,
            "GeometryCollection" | "MultiGeometry" => read_collection(tokens, &mut points)?,
            _ => tokens.skip_element()?,
        }
    }

    match name {
        Some(name) if points.len() == 1 && !name.is_empty() => {
            candidates.push(WaypointCandidate {
                name,
                geo: points[0].geo,
            });
        }
        _ => data.extend(points),
    }
    Ok(())
}

fn read_collection<R: Read>(
    tokens: &mut XmlTokens<R>,
    points: &mut Vec<PathPoint>,
) -> Result<(), ParseError> {
    while let Some(child) = tokens.next_child()? {
        if child.name == "LineString" {
            read_geometry(tokens, points)?;
        } else {
            tokens.skip_element()?;
        }
    }
    Ok(())
}

/// Reads the `coordinates` of a Point or LineString
fn read_geometry<R: Read>(
    tokens: &mut XmlTokens<R>,
    points: &mut Vec<PathPoint>,
) -> Result<(), ParseError> {
    while let Some(child) = tokens.next_child()? {
        if child.name == "coordinates" {
            let text = tokens.read_text()?;
            points.extend(text.split_whitespace().filter_map(parse_coordinate));
        } else {
            tokens.skip_element()?;
        }
    }
    Ok(())
}

/// Parses one `lon,lat[,alt]` tuple. A tuple with fewer than two fields or a
/// non-numeric coordinate yields nothing; a malformed altitude reads as 0.
fn parse_coordinate(tuple: &str) -> Option<PathPoint> {
    let mut fields = tuple.split(',');
    let lon = fields.next()?.parse::<f64>().ok().filter(|v| v.is_finite())?;
    let lat = fields.next()?.parse::<f64>().ok().filter(|v| v.is_finite())?;
    let altitude = fields
        .next()
        .and_then(|field| field.parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);
    Some(PathPoint::new(GeoPoint::new(lat, lon)).with_altitude(altitude))
}

/// Returns how many candidates found a matching point
fn attach_waypoints(
    data: &mut PathData,
    first_index: usize,
    candidates: Vec<WaypointCandidate>,
) -> Result<usize, ParseError> {
    let mut cursor = first_index;
    let mut attached = 0;
    for candidate in candidates {
        let found = data.points()[cursor..]
            .iter()
            .position(|point| point.geo == candidate.geo);
        match found {
            Some(offset) => {
                let index = cursor + offset;
                data.add_waypoint(candidate.name, index)?;
                cursor = index + 1;
                attached += 1;
            }
            None => tracing::warn!(
                name = %candidate.name,
                lat = candidate.geo.lat,
                lon = candidate.geo.lon,
                "No track point matches KML placemark, dropping waypoint"
            ),
        }
    }
    Ok(attached)
}
