//! # GeoSlice - Zero-Copy Raster Window Reads
//!
//! Fast, random-access reads of rectangular pixel windows from large
//! georeferenced multi-band rasters, without copying pixel data.
//!
//! ## Features
//!
//! - **Zero-copy**: windows are strided views straight over a read-only
//!   memory mapping
//! - **Bounded caching**: opt-in, byte-budgeted LRU cache of materialized
//!   windows, keyed by window geometry
//! - **Coordinate transforms**: WGS84 lat/lon ↔ pixel space via a fixed UTM
//!   zone, plus sensor footprint → window sizing
//! - **Flight paths**: spiral/linear/grid waypoint generators and a simple
//!   flight simulation over a store
//!
//! The three core pieces are deliberately unwired: composing
//! transform → store → cache is the caller's job.
//!
//! ## Quick Start
//!
//! ```ignore
//! use geoslice::{GeoTransform, RasterStore, WindowCache};
//!
//! let store = RasterStore::open("/data/processed_map")?;
//! let geo = GeoTransform::new(store.metadata().transform);
//! let cache = WindowCache::new(256 * 1024 * 1024);
//!
//! let (px, py) = geo.latlon_to_pixel(31.45, 34.8);
//! let (w, h) = geo.fov_to_pixels(100.0, 60.0);
//! let (x, y) = (px - w / 2, py - h / 2);
//!
//! let bytes = match cache.get(x, y, w, h) {
//!     Some(hit) => hit,
//!     None => {
//!         let copy = store.get_window(x, y, w, h)?.to_vec();
//!         cache.put(x, y, w, h, copy.clone());
//!         copy.into()
//!     }
//! };
//! ```
//!
//! ## Dataset Format
//!
//! A dataset is two companion files sharing a base path:
//!
//! - `<base>.json` - metadata sidecar: `dtype`, `count` (bands), `height`,
//!   `width`, 6-value affine `transform`, `crs`
//! - `<base>.bin` - headerless pixels, band-major then row-major, totalling
//!   exactly `count * height * width * element_size` bytes

pub mod cache;
pub mod error;
pub mod flight;
pub mod metadata;
pub mod store;
pub mod transform;

// Re-export main types at crate root for convenience
pub use cache::{WindowCache, WindowKey};
pub use error::{GeoSliceError, Result};
pub use flight::{simulate_flight, FlightPath, SensorState, WindowRect};
pub use metadata::{DataType, DatasetMetadata};
pub use store::{RasterStore, WindowView};
pub use transform::GeoTransform;
