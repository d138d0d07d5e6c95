//! Flight-path utilities: waypoint generation and window extraction for a
//! moving nadir sensor.
//!
//! These helpers compose the three core pieces for the common consumer: a
//! [`GeoTransform`] turns each waypoint into a pixel window centered on the
//! sensor footprint, and a [`RasterStore`] materializes the imagery under it.

use crate::store::RasterStore;
use crate::transform::GeoTransform;

/// State of the sensor platform at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorState {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Altitude above ground in meters.
    pub altitude_m: f64,
    /// Heading in degrees clockwise from north.
    pub heading_deg: f64,
    /// Sensor field of view in degrees.
    pub fov_deg: f64,
    /// Ground speed in meters per second.
    pub speed_ms: f64,
    /// Time along the path, in seconds.
    pub timestamp: f64,
}

impl SensorState {
    /// Default field of view in degrees.
    pub const DEFAULT_FOV_DEG: f64 = 60.0;

    /// Create a state at a position and altitude; heading, speed, and
    /// timestamp start at zero with the default field of view.
    pub fn new(lat: f64, lon: f64, altitude_m: f64) -> Self {
        Self {
            lat,
            lon,
            altitude_m,
            heading_deg: 0.0,
            fov_deg: Self::DEFAULT_FOV_DEG,
            speed_ms: 0.0,
            timestamp: 0.0,
        }
    }
}

/// A pixel-space window rectangle.
///
/// Signed so footprints that fall off the raster edge are representable;
/// [`Self::is_valid`] decides whether extraction is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl WindowRect {
    /// Whether the rectangle lies fully inside a raster of the given size.
    pub fn is_valid(&self, map_width: u32, map_height: u32) -> bool {
        if self.x < 0 || self.y < 0 || self.width <= 0 || self.height <= 0 {
            return false;
        }
        self.x
            .checked_add(self.width)
            .is_some_and(|right| right <= map_width as i64)
            && self
                .y
                .checked_add(self.height)
                .is_some_and(|bottom| bottom <= map_height as i64)
    }
}

/// An ordered sequence of sensor waypoints.
#[derive(Debug, Clone)]
pub struct FlightPath {
    waypoints: Vec<SensorState>,
}

impl FlightPath {
    /// Wrap an explicit waypoint list.
    pub fn new(waypoints: Vec<SensorState>) -> Self {
        Self { waypoints }
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// True if the path has no waypoints.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// The waypoints in path order.
    pub fn waypoints(&self) -> &[SensorState] {
        &self.waypoints
    }

    /// Iterate over the waypoints.
    pub fn iter(&self) -> std::slice::Iter<'_, SensorState> {
        self.waypoints.iter()
    }

    /// An outward spiral around a center point.
    ///
    /// Waypoint `i` sits at radius `radius_deg * (i + 1)` on an evenly spaced
    /// bearing, cycling through `altitudes`.
    ///
    /// # Panics
    ///
    /// Panics if `altitudes` is empty.
    pub fn spiral(
        center_lat: f64,
        center_lon: f64,
        num_waypoints: usize,
        altitudes: &[f64],
        radius_deg: f64,
        fov_deg: f64,
    ) -> Self {
        assert!(!altitudes.is_empty(), "at least one altitude required");

        let step = 360.0 / num_waypoints as f64;
        let waypoints = (0..num_waypoints)
            .map(|i| {
                let heading = step * i as f64;
                let radius = radius_deg * (i + 1) as f64;
                let angle = heading.to_radians();
                SensorState {
                    lat: center_lat + radius * angle.cos(),
                    lon: center_lon + radius * angle.sin(),
                    altitude_m: altitudes[i % altitudes.len()],
                    heading_deg: heading,
                    fov_deg,
                    speed_ms: 0.0,
                    timestamp: i as f64,
                }
            })
            .collect();

        Self { waypoints }
    }

    /// A straight line between two points at constant altitude.
    pub fn linear(
        start: (f64, f64),
        end: (f64, f64),
        num_waypoints: usize,
        altitude_m: f64,
        fov_deg: f64,
    ) -> Self {
        let heading = (end.1 - start.1).atan2(end.0 - start.0).to_degrees();
        let last = (num_waypoints.max(2) - 1) as f64;

        let waypoints = (0..num_waypoints)
            .map(|i| {
                let t = i as f64 / last;
                SensorState {
                    lat: start.0 + (end.0 - start.0) * t,
                    lon: start.1 + (end.1 - start.1) * t,
                    altitude_m,
                    heading_deg: heading,
                    fov_deg,
                    speed_ms: 0.0,
                    timestamp: i as f64,
                }
            })
            .collect();

        Self { waypoints }
    }

    /// A serpentine survey grid over a lat/lon bounding box.
    ///
    /// Rows alternate west-to-east (heading 90°) and east-to-west (270°).
    pub fn grid(
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
        rows: usize,
        cols: usize,
        altitude_m: f64,
        fov_deg: f64,
    ) -> Self {
        let row_last = (rows.max(2) - 1) as f64;
        let col_last = (cols.max(2) - 1) as f64;

        let mut waypoints = Vec::with_capacity(rows * cols);
        let mut t = 0.0;
        for r in 0..rows {
            let lat = min_lat + (max_lat - min_lat) * r as f64 / row_last;
            let heading = if r % 2 == 0 { 90.0 } else { 270.0 };
            for c in 0..cols {
                let c = if r % 2 == 0 { c } else { cols - 1 - c };
                let lon = min_lon + (max_lon - min_lon) * c as f64 / col_last;
                waypoints.push(SensorState {
                    lat,
                    lon,
                    altitude_m,
                    heading_deg: heading,
                    fov_deg,
                    speed_ms: 0.0,
                    timestamp: t,
                });
                t += 1.0;
            }
        }

        Self { waypoints }
    }

    /// The pixel window for one sensor state: the footprint sized by
    /// altitude and field of view, centered on the projected position.
    pub fn state_to_window(state: &SensorState, geo: &GeoTransform) -> WindowRect {
        let (cx, cy) = geo.latlon_to_pixel(state.lat, state.lon);
        let (width, height) = geo.fov_to_pixels(state.altitude_m, state.fov_deg);
        WindowRect {
            x: cx - width / 2,
            y: cy - height / 2,
            width,
            height,
        }
    }

    /// Compute the window for every waypoint.
    pub fn compute_windows(&self, geo: &GeoTransform) -> Vec<WindowRect> {
        self.waypoints
            .iter()
            .map(|state| Self::state_to_window(state, geo))
            .collect()
    }
}

impl<'a> IntoIterator for &'a FlightPath {
    type Item = &'a SensorState;
    type IntoIter = std::slice::Iter<'a, SensorState>;

    fn into_iter(self) -> Self::IntoIter {
        self.waypoints.iter()
    }
}

impl std::ops::Index<usize> for FlightPath {
    type Output = SensorState;

    fn index(&self, idx: usize) -> &SensorState {
        &self.waypoints[idx]
    }
}

/// Fly a path over a store, materializing the window under each waypoint.
///
/// The transform is derived from the store's own affine metadata with the
/// default UTM zone. Waypoints whose footprint falls outside the raster yield
/// `None`. `on_frame` runs once per extracted window.
pub fn simulate_flight<F>(
    store: &RasterStore,
    path: &FlightPath,
    mut on_frame: F,
) -> Vec<Option<Vec<u8>>>
where
    F: FnMut(&SensorState, &[u8]),
{
    let geo = GeoTransform::new(store.metadata().transform);
    let windows = path.compute_windows(&geo);

    path.iter()
        .zip(windows)
        .map(|(state, win)| {
            if !win.is_valid(store.width(), store.height()) {
                return None;
            }
            // Validity was just checked, so extraction cannot fail
            let view = store.get_window(win.x, win.y, win.width, win.height).ok()?;
            let bytes = view.to_vec();
            on_frame(state, &bytes);
            Some(bytes)
        })
        .collect()
}
