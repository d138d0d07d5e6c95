//! Error types for the geoslice library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with raster datasets.
#[derive(Error, Debug)]
pub enum GeoSliceError {
    /// The metadata sidecar is unreadable, malformed, or inconsistent with
    /// the binary payload. Fatal at construction: no store exists afterwards.
    #[error("invalid dataset configuration: {reason}")]
    Configuration { reason: String },

    /// The binary payload could not be opened or memory-mapped. Fatal at
    /// construction.
    #[error("failed to map dataset payload {path}: {source}")]
    Mapping {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A requested window falls outside the raster bounds. Local and
    /// recoverable: the store remains usable for subsequent calls.
    #[error("window out of range: x={x}, y={y}, width={width}, height={height}")]
    OutOfRange { x: i64, y: i64, width: i64, height: i64 },
}

/// Result type alias using [`GeoSliceError`].
pub type Result<T> = std::result::Result<T, GeoSliceError>;
