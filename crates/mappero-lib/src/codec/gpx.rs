//! GPX 1.0/1.1 codec
//!
//! Reading accepts tracks (`trk` / `trkseg` / `trkpt`) and routes
//! (`rte` / `rtept`); every segment-like container opens a new path segment.
//! Writing emits a single GPX 1.0 track with one `trkseg` per segment.

use super::{ParseError, PathReader, PathWriter, StartTag, WriteError, XmlTokens};
use crate::{GeoPoint, PathData, PathPoint};
use chrono::{DateTime, NaiveDateTime};
use std::borrow::Cow;
use std::io::{Read, Write};
use xml::common::XmlVersion;
use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/0";
const CREATOR: &str = "mappero";

/// Options controlling GPX output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpxWriteOptions {
    /// Leave out the first point of every segment after the first one.
    ///
    /// Older exports treated that point as the anchor carried over from the
    /// previous segment and never wrote it; enable this to reproduce those
    /// files byte for byte. Re-reading such a file loses those points.
    pub skip_segment_anchor: bool,
}

/// The GPX codec
#[derive(Debug, Clone, Copy, Default)]
pub struct Gpx {
    options: GpxWriteOptions,
}

impl Gpx {
    pub fn with_options(options: GpxWriteOptions) -> Self {
        Self { options }
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PathReader for Gpx {
    fn read<R: Read>(
        &self,
        tokens: &mut XmlTokens<R>,
        data: &mut PathData,
    ) -> Result<(), ParseError> {
        let root = tokens
            .next_child()?
            .ok_or_else(|| ParseError::UnexpectedStructure("empty GPX document".into()))?;
        if root.name != "gpx" {
            return Err(ParseError::UnexpectedStructure(format!(
                "expected <gpx> root, found <{}>",
                root.name
            )));
        }

        let before = data.len();
        while let Some(child) = tokens.next_child()? {
            match child.name.as_str() {
                "trk" => read_track(tokens, data)?,
                "rte" => {
                    data.break_segment();
                    read_segment(tokens, data, "rtept")?;
                }
                _ => tokens.skip_element()?,
            }
        }

        tracing::debug!(
            creator = root.attr("creator").unwrap_or("unknown"),
            points = data.len() - before,
            "GPX document read"
        );
        Ok(())
    }
}

fn read_track<R: Read>(tokens: &mut XmlTokens<R>, data: &mut PathData) -> Result<(), ParseError> {
    while let Some(child) = tokens.next_child()? {
        if child.name == "trkseg" {
            data.break_segment();
            read_segment(tokens, data, "trkpt")?;
        } else {
            tokens.skip_element()?;
        }
    }
    Ok(())
}

fn read_segment<R: Read>(
    tokens: &mut XmlTokens<R>,
    data: &mut PathData,
    point_tag: &str,
) -> Result<(), ParseError> {
    while let Some(child) = tokens.next_child()? {
        if child.name == point_tag {
            read_point(tokens, data, &child)?;
        } else {
            tokens.skip_element()?;
        }
    }
    Ok(())
}

/// Reads one point element. A point without usable coordinates is dropped,
/// but its children are still consumed so the stream stays in step.
fn read_point<R: Read>(
    tokens: &mut XmlTokens<R>,
    data: &mut PathData,
    tag: &StartTag,
) -> Result<(), ParseError> {
    let geo = match (parse_coordinate(tag.attr("lat")), parse_coordinate(tag.attr("lon"))) {
        (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
        _ => {
            tracing::debug!(
                lat = tag.attr("lat"),
                lon = tag.attr("lon"),
                "Skipping GPX point with invalid coordinates"
            );
            None
        }
    };

    let mut altitude = 0.0;
    let mut time = 0;
    let mut comment = None;
    let mut description = None;
    while let Some(child) = tokens.next_child()? {
        match child.name.as_str() {
            "ele" => {
                altitude = tokens
                    .read_text()?
                    .trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .unwrap_or(0.0)
            }
            "time" => time = parse_time(tokens.read_text()?.trim()).unwrap_or(0),
            "cmt" => comment = non_empty(tokens.read_text()?),
            "desc" => description = non_empty(tokens.read_text()?),
            _ => tokens.skip_element()?,
        }
    }

    if let Some(geo) = geo {
        data.append_point(PathPoint {
            geo,
            altitude,
            time,
        });
        if let Some(text) = description.or(comment) {
            data.add_waypoint(text, data.len() - 1)?;
        }
    }
    Ok(())
}

fn parse_coordinate(value: Option<&str>) -> Option<f64> {
    value?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// ISO-8601 instant to Unix seconds; anything before 1970 or past 2106 is unknown
fn parse_time(text: &str) -> Option<u32> {
    let seconds = DateTime::parse_from_rfc3339(text)
        .map(|instant| instant.timestamp())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc().timestamp())
        })
        .ok()?;
    u32::try_from(seconds).ok()
}

fn format_time(time: u32) -> Option<String> {
    DateTime::from_timestamp(i64::from(time), 0)
        .map(|instant| instant.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PathWriter for Gpx {
    fn write<W: Write>(&self, sink: W, data: &PathData) -> Result<(), WriteError> {
        let mut writer = EmitterConfig::new()
            .perform_indent(true)
            .indent_string("  ")
            .create_writer(sink);

        writer.write(XmlEvent::StartDocument {
            version: XmlVersion::Version10,
            encoding: Some("UTF-8"),
            standalone: None,
        })?;
        writer.write(
            XmlEvent::start_element("gpx")
                .attr("version", "1.0")
                .attr("creator", CREATOR)
                .default_ns(GPX_NAMESPACE),
        )?;
        writer.write(XmlEvent::start_element("trk"))?;

        for (segment_index, range) in data.segment_ranges().enumerate() {
            let start = if self.options.skip_segment_anchor && segment_index > 0 {
                (range.start + 1).min(range.end)
            } else {
                range.start
            };

            writer.write(XmlEvent::start_element("trkseg"))?;
            for index in start..range.end {
                write_point(&mut writer, data, index)?;
            }
            writer.write(XmlEvent::end_element())?;
        }

        writer.write(XmlEvent::end_element())?; // trk
        writer.write(XmlEvent::end_element())?; // gpx
        writer.into_inner().write_all(b"\n")?;
        Ok(())
    }
}

fn write_point<W: Write>(
    writer: &mut EventWriter<W>,
    data: &PathData,
    index: usize,
) -> Result<(), WriteError> {
    let point = &data.points()[index];
    let lat = format!("{:.6}", point.geo.lat);
    let lon = format!("{:.6}", point.geo.lon);
    writer.write(
        XmlEvent::start_element("trkpt")
            .attr("lat", &lat)
            .attr("lon", &lon),
    )?;

    if point.altitude != 0.0 {
        write_text_element(writer, "ele", &format!("{:.2}", point.altitude))?;
    }
    if point.time != 0
        && let Some(time) = format_time(point.time)
    {
        write_text_element(writer, "time", &time)?;
    }
    if let Some(waypoint) = data.waypoint_at(index) {
        write_text_element(writer, "desc", &waypoint.description)?;
    }

    writer.write(XmlEvent::end_element())?;
    Ok(())
}

fn write_text_element<W: Write>(
    writer: &mut EventWriter<W>,
    name: &str,
    text: &str,
) -> Result<(), WriteError> {
    writer.write(XmlEvent::start_element(name))?;
    writer.write(XmlEvent::characters(&xml_safe(text)))?;
    writer.write(XmlEvent::end_element())?;
    Ok(())
}

/// Drops characters a conforming XML 1.0 reader would reject
fn xml_safe(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}
