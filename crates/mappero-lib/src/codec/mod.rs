//! Streaming codec layer
//!
//! Each format is a stateless codec that appends into a caller-owned
//! [`PathData`] while consuming tokens in a single forward pass
//! ([`PathReader`]), and optionally serializes one ([`PathWriter`]).
//!
//! Per-element anomalies (a point with a non-numeric latitude, a malformed
//! timestamp) are absorbed where they occur. Only a missing root structure,
//! broken XML or an I/O failure ends a parse with an error.

pub mod gpx;
pub mod kml;
mod tokens;

pub use gpx::{Gpx, GpxWriteOptions};
pub use kml::Kml;
pub use tokens::{StartTag, Token, XmlTokens};

use crate::{PathData, PathError};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Errors that end a parse
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected document structure: {0}")]
    UnexpectedStructure(String),

    #[error("XML syntax error: {0}")]
    Syntax(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path model error: {0}")]
    Path(#[from] PathError),
}

/// Errors that end a write
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML emitter error: {0}")]
    Xml(String),
}

impl From<xml::writer::Error> for WriteError {
    fn from(err: xml::writer::Error) -> Self {
        match err {
            xml::writer::Error::Io(io) => WriteError::Io(io),
            other => WriteError::Xml(other.to_string()),
        }
    }
}

/// Reads one document, appending into `data`
pub trait PathReader {
    fn read<R: Read>(&self, tokens: &mut XmlTokens<R>, data: &mut PathData)
    -> Result<(), ParseError>;
}

/// Serializes a whole path into one document
pub trait PathWriter {
    fn write<W: Write>(&self, sink: W, data: &PathData) -> Result<(), WriteError>;
}

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Gpx,
    Kml,
}

impl Format {
    /// Guess from a file extension (case-insensitive)
    pub fn from_extension(path: &Path) -> Option<Format> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "gpx" => Some(Format::Gpx),
            "kml" => Some(Format::Kml),
            _ => None,
        }
    }

    /// Recognize from the document's root element name
    pub fn from_root(name: &str) -> Option<Format> {
        match name {
            "gpx" => Some(Format::Gpx),
            "kml" => Some(Format::Kml),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Gpx => "GPX",
            Format::Kml => "KML",
        }
    }
}

/// Read a GPX or KML document into `data`, picking the codec from the root
/// element. Returns the detected format.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn read_into<R: Read>(source: R, data: &mut PathData) -> Result<Format, ParseError> {
    let mut tokens = XmlTokens::new(source);
    let root = tokens
        .peek_root()?
        .ok_or_else(|| ParseError::UnexpectedStructure("document has no root element".into()))?;
    let format = Format::from_root(root).ok_or_else(|| {
        ParseError::UnexpectedStructure(format!("unsupported document root <{root}>"))
    })?;

    match format {
        Format::Gpx => Gpx::default().read(&mut tokens, data)?,
        Format::Kml => Kml.read(&mut tokens, data)?,
    }
    Ok(format)
}

/// Parse a whole document into a fresh path
pub fn load<R: Read>(source: R) -> Result<PathData, ParseError> {
    let mut data = PathData::new();
    read_into(source, &mut data)?;
    Ok(data)
}

/// Parse a GPX or KML file
pub fn load_file(path: impl AsRef<Path>) -> Result<PathData, ParseError> {
    let file = File::open(path.as_ref())?;
    let data = load(BufReader::new(file))?;
    tracing::debug!(
        path = %path.as_ref().display(),
        points = data.len(),
        segments = data.segment_count(),
        "Loaded path file"
    );
    Ok(data)
}

/// Parse several files in parallel; results keep the order of `paths`
pub fn import_files<P: AsRef<Path> + Sync>(paths: &[P]) -> Vec<Result<PathData, ParseError>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("codec::import_files");

    paths.par_iter().map(load_file).collect()
}

/// Write a path as GPX
pub fn save_gpx<W: Write>(
    sink: W,
    data: &PathData,
    options: GpxWriteOptions,
) -> Result<(), WriteError> {
    Gpx::with_options(options).write(sink, data)
}
