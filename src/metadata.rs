//! Dataset metadata: the parsed contract of the JSON sidecar.
//!
//! Each raster dataset is a pair of companion files: `<base>.json` holding
//! the fields below, and `<base>.bin` holding headerless band-major pixels.
//! This module decodes and validates the sidecar; [`crate::store`] maps the
//! payload against it.

use serde::Deserialize;

use crate::error::{GeoSliceError, Result};

/// Pixel element type of a raster payload.
///
/// The serialized names match the sidecar's `dtype` strings (numpy-style).
/// An unrecognized string fails deserialization outright; there is no
/// fallback element size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl DataType {
    /// Size in bytes of a single pixel element.
    pub fn element_size(&self) -> usize {
        match self {
            DataType::Uint8 => 1,
            DataType::Int16 | DataType::Uint16 => 2,
            DataType::Int32 | DataType::Uint32 | DataType::Float32 => 4,
            DataType::Float64 => 8,
        }
    }
}

/// Immutable description of a raster dataset, decoded from its JSON sidecar.
///
/// The affine transform is restricted to north-up rasters:
/// `[pixel_size_x, 0, origin_x, 0, -pixel_size_y, origin_y]`.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetMetadata {
    /// Pixel element type.
    pub dtype: DataType,
    /// Number of bands.
    pub count: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// Raster width in pixels.
    pub width: u32,
    /// 6-value affine transform mapping pixel indices to projected coordinates.
    pub transform: [f64; 6],
    /// CRS identifier (e.g. "EPSG:32636"); the sidecar may carry `null`.
    #[serde(default)]
    pub crs: Option<String>,
}

impl DatasetMetadata {
    /// Check the structural invariants: band count and dimensions must be
    /// strictly positive.
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 || self.height == 0 || self.width == 0 {
            return Err(GeoSliceError::Configuration {
                reason: format!(
                    "count, height and width must be > 0 (got count={}, height={}, width={})",
                    self.count, self.height, self.width
                ),
            });
        }
        Ok(())
    }

    /// Total payload size implied by the metadata, in bytes.
    pub fn expected_bytes(&self) -> u64 {
        self.count as u64 * self.height as u64 * self.width as u64 * self.dtype.element_size() as u64
    }
}
