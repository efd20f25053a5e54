//! Mappero Library - Path Model, Track Codecs and Route Calculation
//!
//! This library holds the engineering core of the Mappero map application: the
//! in-memory model for multi-segment GPS tracks, streaming GPX/KML codecs that
//! populate it in a single forward pass, and the pluggable routing protocol that
//! lets very different backends (local computation, remote HTTP services) fill
//! the same model through one callback contract.
//!
//! # Architecture
//!
//! - **[`GeoPoint`] / [`UnitPoint`]**: coordinate value types
//! - **[`ProjectionHandle`]**: swappable lat/lon <-> unit transform provider
//! - **[`PathData`]**: append-only points, segment boundaries and waypoints
//! - **[`codec`]**: GPX (read + write) and KML (read) over a pull token reader
//! - **[`router`]**: the [`Router`] trait, query envelope and the bundled backends
//! - **[`store`]**: key/value persistence for router options

pub mod codec;
mod coord;
mod path;
pub mod projection;
pub mod router;
mod runtime;
pub mod store;

// Public API exports
pub use codec::{Format, ParseError, WriteError};
pub use coord::{EARTH_RADIUS_M, GeoPoint, UnitPoint};
pub use path::{PathData, PathPoint, Segment, WayPoint};
pub use projection::{Projection, ProjectionHandle, WebMercator};
pub use router::{Location, Router, RouterError, RouterQuery};
pub use store::{FileStore, MemoryStore, OptionStore, StorageError};

/// Errors raised by the path model mutators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("point index {index} out of range (path has {len} points)")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, PathError>;
