//! Memory-mapped raster storage and zero-copy window views.
//!
//! [`RasterStore`] maps a dataset's binary payload read-only and hands out
//! [`WindowView`]s: strided, band-major references straight into the mapped
//! bytes. No pixel data is ever copied on the read path; a view's lifetime is
//! tied to the store it came from, so a view can never outlive the mapping.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

use crate::error::{GeoSliceError, Result};
use crate::metadata::DatasetMetadata;

/// A memory-mapped, read-only raster dataset.
///
/// Opened from a base path: `<base>.json` is the metadata sidecar and
/// `<base>.bin` the headerless band-major payload. The mapping is established
/// eagerly at construction and released on drop. The store owns the mapping
/// exclusively: it can be moved but not cloned.
///
/// # Example
///
/// ```ignore
/// use geoslice::RasterStore;
///
/// let store = RasterStore::open("/data/processed_map")?;
/// let view = store.get_window(100, 100, 512, 512)?;
/// println!("{} bands, {} bytes", view.bands(), view.len_bytes());
/// ```
pub struct RasterStore {
    /// Memory-mapped payload.
    data: Mmap,
    /// Parsed sidecar contract.
    meta: DatasetMetadata,
}

impl RasterStore {
    /// Open a dataset from its base path (no extension).
    ///
    /// Reads and validates `<base>.json`, then memory-maps `<base>.bin`
    /// read-only and advises the OS that access will be random.
    ///
    /// # Errors
    ///
    /// - [`GeoSliceError::Configuration`] if the sidecar is unreadable or
    ///   malformed, declares zero bands/dimensions, or declares a total size
    ///   that does not match the payload's byte length
    /// - [`GeoSliceError::Mapping`] if the payload cannot be opened or mapped
    pub fn open<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base = base_path.as_ref();
        let json_path = append_extension(base, ".json");
        let bin_path = append_extension(base, ".bin");

        let raw = std::fs::read_to_string(&json_path).map_err(|e| GeoSliceError::Configuration {
            reason: format!("cannot read metadata {}: {e}", json_path.display()),
        })?;
        let meta: DatasetMetadata =
            serde_json::from_str(&raw).map_err(|e| GeoSliceError::Configuration {
                reason: format!("malformed metadata {}: {e}", json_path.display()),
            })?;
        meta.validate()?;

        let file = File::open(&bin_path).map_err(|source| GeoSliceError::Mapping {
            path: bin_path.clone(),
            source,
        })?;

        // SAFETY: the payload is opened read-only and the mapping is never
        // exposed mutably. Truncation of the file while mapped is the usual
        // memmap caveat and is outside this library's control.
        let data = unsafe {
            Mmap::map(&file).map_err(|source| GeoSliceError::Mapping {
                path: bin_path.clone(),
                source,
            })?
        };

        let expected = meta.expected_bytes();
        if data.len() as u64 != expected {
            return Err(GeoSliceError::Configuration {
                reason: format!(
                    "payload {} is {} bytes but metadata implies {expected}",
                    bin_path.display(),
                    data.len()
                ),
            });
        }

        // Access pattern is small scattered windows, not a sequential scan.
        // The advice is best-effort; a refusal changes nothing functionally.
        #[cfg(unix)]
        if let Err(e) = data.advise(memmap2::Advice::Random) {
            debug!("madvise(RANDOM) failed for {}: {e}", bin_path.display());
        }

        debug!(
            "mapped {} ({} bands, {}x{}, {} bytes)",
            bin_path.display(),
            meta.count,
            meta.width,
            meta.height,
            data.len()
        );

        Ok(Self { data, meta })
    }

    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        self.meta.width
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        self.meta.height
    }

    /// Number of bands.
    pub fn bands(&self) -> u32 {
        self.meta.count
    }

    /// The parsed dataset metadata.
    pub fn metadata(&self) -> &DatasetMetadata {
        &self.meta
    }

    /// Total mapped payload size in bytes.
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check whether a window lies fully inside the raster.
    ///
    /// True iff `x >= 0`, `y >= 0`, `width > 0`, `height > 0`,
    /// `x + width <= raster width` and `y + height <= raster height`.
    pub fn is_valid_window(&self, x: i64, y: i64, width: i64, height: i64) -> bool {
        if x < 0 || y < 0 || width <= 0 || height <= 0 {
            return false;
        }
        // Checked sums: footprint-derived sizes can be large enough that a
        // plain x + width wraps and sneaks past the bound
        x.checked_add(width)
            .is_some_and(|right| right <= self.meta.width as i64)
            && y.checked_add(height)
                .is_some_and(|bottom| bottom <= self.meta.height as i64)
    }

    /// Get a zero-copy band-major view of a rectangular window.
    ///
    /// The view's local `(0, 0)` is the window's top-left pixel; strides span
    /// the full raster so no bytes move. The view borrows the store and
    /// cannot outlive it.
    ///
    /// # Errors
    ///
    /// [`GeoSliceError::OutOfRange`] if the window fails
    /// [`Self::is_valid_window`]. The store stays usable afterwards.
    pub fn get_window(&self, x: i64, y: i64, width: i64, height: i64) -> Result<WindowView<'_>> {
        if !self.is_valid_window(x, y, width, height) {
            return Err(GeoSliceError::OutOfRange {
                x,
                y,
                width,
                height,
            });
        }

        let element_size = self.meta.dtype.element_size();
        let band_stride = self.meta.height as usize * self.meta.width as usize * element_size;
        let row_stride = self.meta.width as usize * element_size;
        let origin = y as usize * row_stride + x as usize * element_size;

        Ok(WindowView {
            data: &self.data[origin..],
            bands: self.meta.count,
            height: height as u32,
            width: width as u32,
            band_stride,
            row_stride,
            element_size,
        })
    }
}

impl std::fmt::Debug for RasterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterStore")
            .field("meta", &self.meta)
            .field("mapped_bytes", &self.data.len())
            .finish()
    }
}

/// A non-owning, read-only view of one raster window.
///
/// Band-major: element `(band, row, col)` lives at byte offset
/// `band * band_stride + row * row_stride + col * element_size` within the
/// backing slice, whose start is the window's top-left pixel. Adapters that
/// expose the view across a language boundary must keep the owning
/// [`RasterStore`] alive for as long as the exposed buffer is reachable and
/// must carry these strides through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct WindowView<'a> {
    /// Mapped bytes from the window origin to the end of the payload.
    data: &'a [u8],
    bands: u32,
    height: u32,
    width: u32,
    band_stride: usize,
    row_stride: usize,
    element_size: usize,
}

impl<'a> WindowView<'a> {
    /// Number of bands.
    pub fn bands(&self) -> u32 {
        self.bands
    }

    /// Window height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Window width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Byte stride between consecutive bands.
    pub fn band_stride(&self) -> usize {
        self.band_stride
    }

    /// Byte stride between consecutive rows.
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Size in bytes of one pixel element.
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Logical size of the window in bytes.
    pub fn len_bytes(&self) -> usize {
        self.bands as usize * self.height as usize * self.width as usize * self.element_size
    }

    /// The raw backing bytes, starting at the window origin.
    ///
    /// The slice extends past the window's logical extent (to the end of the
    /// mapping); address it through the strides.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// One row of the window within one band, `width * element_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `band` or `row` is out of range.
    pub fn row(&self, band: u32, row: u32) -> &'a [u8] {
        assert!(band < self.bands, "band {band} out of range");
        assert!(row < self.height, "row {row} out of range");
        let offset = band as usize * self.band_stride + row as usize * self.row_stride;
        &self.data[offset..offset + self.width as usize * self.element_size]
    }

    /// Read one typed element at `(band, row, col)`.
    ///
    /// `T` must match the dataset's element size; the read is unaligned-safe.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range or `size_of::<T>()` differs from
    /// the view's element size.
    pub fn value<T: bytemuck::AnyBitPattern>(&self, band: u32, row: u32, col: u32) -> T {
        assert_eq!(
            std::mem::size_of::<T>(),
            self.element_size,
            "element type size mismatch"
        );
        assert!(col < self.width, "col {col} out of range");
        let row_bytes = self.row(band, row);
        let start = col as usize * self.element_size;
        bytemuck::pod_read_unaligned(&row_bytes[start..start + self.element_size])
    }

    /// Materialize the window into one contiguous band-major buffer.
    ///
    /// This is the copy callers hand to [`crate::cache::WindowCache`].
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len_bytes());
        for band in 0..self.bands {
            for row in 0..self.height {
                out.extend_from_slice(self.row(band, row));
            }
        }
        out
    }
}

/// Append a literal extension to a base path without interpreting existing
/// dots in the file name.
fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut os = base.as_os_str().to_os_string();
    os.push(ext);
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const BANDS: u32 = 2;
    const HEIGHT: u32 = 8;
    const WIDTH: u32 = 10;

    /// Write a uint8 test dataset where element (band, row, col) equals
    /// band * 100 + row * 10 + col.
    fn create_test_dataset(dir: &Path, name: &str) -> PathBuf {
        let base = dir.join(name);

        let sidecar = format!(
            r#"{{
                "dtype": "uint8",
                "count": {BANDS},
                "height": {HEIGHT},
                "width": {WIDTH},
                "transform": [0.5, 0.0, 1000.0, 0.0, -0.5, 2000.0],
                "crs": "EPSG:32636"
            }}"#
        );
        std::fs::write(append_extension(&base, ".json"), sidecar).unwrap();

        let mut payload = Vec::with_capacity((BANDS * HEIGHT * WIDTH) as usize);
        for band in 0..BANDS {
            for row in 0..HEIGHT {
                for col in 0..WIDTH {
                    payload.push((band * 100 + row * 10 + col) as u8);
                }
            }
        }
        let mut file = std::fs::File::create(append_extension(&base, ".bin")).unwrap();
        file.write_all(&payload).unwrap();

        base
    }

    #[test]
    fn test_open_dataset() {
        let dir = TempDir::new().unwrap();
        let base = create_test_dataset(dir.path(), "map");

        let store = RasterStore::open(&base).unwrap();
        assert_eq!(store.width(), WIDTH);
        assert_eq!(store.height(), HEIGHT);
        assert_eq!(store.bands(), BANDS);
        assert_eq!(store.len_bytes(), (BANDS * HEIGHT * WIDTH) as usize);
        assert_eq!(store.metadata().crs.as_deref(), Some("EPSG:32636"));
    }

    #[test]
    fn test_missing_sidecar_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let result = RasterStore::open(dir.path().join("nope"));
        assert!(matches!(
            result,
            Err(GeoSliceError::Configuration { .. })
        ));
    }

    #[test]
    fn test_malformed_sidecar_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("map");
        std::fs::write(append_extension(&base, ".json"), "{not json").unwrap();
        std::fs::write(append_extension(&base, ".bin"), [0u8; 4]).unwrap();

        assert!(matches!(
            RasterStore::open(&base),
            Err(GeoSliceError::Configuration { .. })
        ));
    }

    #[test]
    fn test_missing_payload_is_mapping_error() {
        let dir = TempDir::new().unwrap();
        let base = create_test_dataset(dir.path(), "map");
        std::fs::remove_file(append_extension(&base, ".bin")).unwrap();

        assert!(matches!(
            RasterStore::open(&base),
            Err(GeoSliceError::Mapping { .. })
        ));
    }

    #[test]
    fn test_size_mismatch_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let base = create_test_dataset(dir.path(), "map");
        // Truncate the payload by one byte
        let bin = append_extension(&base, ".bin");
        let bytes = std::fs::read(&bin).unwrap();
        std::fs::write(&bin, &bytes[..bytes.len() - 1]).unwrap();

        assert!(matches!(
            RasterStore::open(&base),
            Err(GeoSliceError::Configuration { .. })
        ));
    }

    #[test]
    fn test_is_valid_window() {
        let dir = TempDir::new().unwrap();
        let base = create_test_dataset(dir.path(), "map");
        let store = RasterStore::open(&base).unwrap();

        assert!(store.is_valid_window(0, 0, WIDTH as i64, HEIGHT as i64));
        assert!(store.is_valid_window(2, 1, 4, 3));
        assert!(store.is_valid_window(9, 7, 1, 1));

        assert!(!store.is_valid_window(-1, 0, 4, 3));
        assert!(!store.is_valid_window(0, -1, 4, 3));
        assert!(!store.is_valid_window(0, 0, 0, 3));
        assert!(!store.is_valid_window(0, 0, 4, 0));
        assert!(!store.is_valid_window(7, 0, 4, 3)); // x + w = 11 > 10
        assert!(!store.is_valid_window(0, 6, 4, 3)); // y + h = 9 > 8
    }

    #[test]
    fn test_extreme_window_rejected_without_overflow() {
        let dir = TempDir::new().unwrap();
        let base = create_test_dataset(dir.path(), "map");
        let store = RasterStore::open(&base).unwrap();

        // Sums near i64::MAX must not wrap into acceptance
        assert!(!store.is_valid_window(1, 0, i64::MAX, 1));
        assert!(!store.is_valid_window(0, 1, 1, i64::MAX));
        assert!(!store.is_valid_window(i64::MAX, 0, 1, 1));
        assert!(!store.is_valid_window(i64::MAX, i64::MAX, i64::MAX, i64::MAX));

        assert!(matches!(
            store.get_window(1, 0, i64::MAX, 1),
            Err(GeoSliceError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_get_window_out_of_range() {
        let dir = TempDir::new().unwrap();
        let base = create_test_dataset(dir.path(), "map");
        let store = RasterStore::open(&base).unwrap();

        let result = store.get_window(8, 0, 4, 3);
        assert!(matches!(
            result,
            Err(GeoSliceError::OutOfRange {
                x: 8,
                y: 0,
                width: 4,
                height: 3
            })
        ));

        // The store stays usable after a rejected request
        assert!(store.get_window(0, 0, 4, 3).is_ok());
    }

    #[test]
    fn test_window_geometry_and_values() {
        let dir = TempDir::new().unwrap();
        let base = create_test_dataset(dir.path(), "map");
        let store = RasterStore::open(&base).unwrap();

        let view = store.get_window(2, 1, 4, 3).unwrap();
        assert_eq!(view.bands(), BANDS);
        assert_eq!(view.height(), 3);
        assert_eq!(view.width(), 4);
        assert_eq!(view.element_size(), 1);
        assert_eq!(view.band_stride(), (HEIGHT * WIDTH) as usize);
        assert_eq!(view.row_stride(), WIDTH as usize);
        assert_eq!(view.len_bytes(), (BANDS * 3 * 4) as usize);

        // Window local (0, 0) is raster pixel (2, 1): band 0 value 1*10+2
        assert_eq!(view.value::<u8>(0, 0, 0), 12);
        assert_eq!(view.value::<u8>(0, 2, 3), 35);
        assert_eq!(view.value::<u8>(1, 0, 0), 112);
        assert_eq!(view.row(0, 1), &[22, 23, 24, 25]);
    }

    #[test]
    fn test_full_raster_window() {
        let dir = TempDir::new().unwrap();
        let base = create_test_dataset(dir.path(), "map");
        let store = RasterStore::open(&base).unwrap();

        let view = store.get_window(0, 0, WIDTH as i64, HEIGHT as i64).unwrap();
        assert_eq!(view.len_bytes(), store.len_bytes());
        // Full-raster materialization reproduces the payload byte for byte
        let copied = view.to_vec();
        assert_eq!(copied.len(), store.len_bytes());
        assert_eq!(copied[0], 0);
        assert_eq!(copied[(HEIGHT * WIDTH) as usize], 100);
    }

    #[test]
    fn test_to_vec_is_band_major() {
        let dir = TempDir::new().unwrap();
        let base = create_test_dataset(dir.path(), "map");
        let store = RasterStore::open(&base).unwrap();

        let view = store.get_window(1, 2, 2, 2).unwrap();
        let bytes = view.to_vec();
        // band 0 rows 2..4 cols 1..3, then band 1 same rectangle
        assert_eq!(bytes, vec![21, 22, 31, 32, 121, 122, 131, 132]);
    }

    #[test]
    fn test_view_survives_store_move() {
        let dir = TempDir::new().unwrap();
        let base = create_test_dataset(dir.path(), "map");
        let store = RasterStore::open(&base).unwrap();

        // Moving the store into a box relocates ownership; views taken after
        // the move read the same mapping.
        let boxed = Box::new(store);
        let view = boxed.get_window(0, 0, 2, 2).unwrap();
        assert_eq!(view.value::<u8>(0, 1, 1), 11);
    }

    #[test]
    fn test_wide_element_dataset() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("f32map");

        let sidecar = r#"{
            "dtype": "float32",
            "count": 1,
            "height": 4,
            "width": 4,
            "transform": [1.0, 0.0, 0.0, 0.0, -1.0, 0.0],
            "crs": null
        }"#;
        std::fs::write(append_extension(&base, ".json"), sidecar).unwrap();

        let mut payload = Vec::new();
        for i in 0..16u32 {
            payload.extend_from_slice(&(i as f32).to_ne_bytes());
        }
        std::fs::write(append_extension(&base, ".bin"), &payload).unwrap();

        let store = RasterStore::open(&base).unwrap();
        let view = store.get_window(1, 1, 2, 2).unwrap();
        assert_eq!(view.element_size(), 4);
        assert_eq!(view.value::<f32>(0, 0, 0), 5.0);
        assert_eq!(view.value::<f32>(0, 1, 1), 10.0);
    }
}
