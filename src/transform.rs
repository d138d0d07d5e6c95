//! Geographic ↔ pixel coordinate transforms.
//!
//! [`GeoTransform`] converts WGS84 latitude/longitude to raster pixel
//! coordinates through a UTM projection and the dataset's affine transform,
//! and sizes pixel windows from a nadir sensor's altitude and field of view.
//!
//! The projection is the standard sixth-order transverse-Mercator series on
//! the WGS84 ellipsoid, fixed to one caller-chosen UTM zone. All methods are
//! pure and infallible: coordinates far outside the zone still produce
//! well-defined numbers, they are just geographically meaningless.

/// WGS84 semi-major axis in meters.
const WGS84_A: f64 = 6378137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257223563;
/// UTM central-meridian scale factor.
const UTM_K0: f64 = 0.9996;
/// UTM false easting in meters.
const FALSE_EASTING: f64 = 500000.0;

/// Coordinate transform between WGS84 lat/lon and raster pixel space.
///
/// Built from a dataset's 6-value affine transform
/// `[pixel_size_x, 0, origin_x, 0, -pixel_size_y, origin_y]` and a UTM zone.
/// Immutable after construction; safe for unrestricted concurrent use.
#[derive(Debug, Clone, Copy)]
pub struct GeoTransform {
    pixel_size_x: f64,
    pixel_size_y: f64,
    origin_x: f64,
    origin_y: f64,
    utm_zone: u8,
    central_meridian: f64,
}

impl GeoTransform {
    /// Default UTM zone when none is given.
    pub const DEFAULT_ZONE: u8 = 36;

    /// Create a transform with the default UTM zone.
    pub fn new(transform: [f64; 6]) -> Self {
        Self::with_zone(transform, Self::DEFAULT_ZONE)
    }

    /// Create a transform for an explicit UTM zone (1–60).
    pub fn with_zone(transform: [f64; 6], utm_zone: u8) -> Self {
        Self {
            pixel_size_x: transform[0],
            pixel_size_y: transform[4].abs(),
            origin_x: transform[2],
            origin_y: transform[5],
            utm_zone,
            central_meridian: (utm_zone as f64 - 1.0) * 6.0 - 180.0 + 3.0,
        }
    }

    /// Pixel width in projected units (meters for UTM).
    pub fn pixel_size_x(&self) -> f64 {
        self.pixel_size_x
    }

    /// Pixel height in projected units.
    pub fn pixel_size_y(&self) -> f64 {
        self.pixel_size_y
    }

    /// The configured UTM zone.
    pub fn utm_zone(&self) -> u8 {
        self.utm_zone
    }

    /// Central meridian of the configured zone, in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.central_meridian
    }

    /// Convert WGS84 lat/lon (degrees) to integer pixel coordinates.
    ///
    /// Fractional pixel positions truncate toward zero. Inside the raster the
    /// operands are positive so this equals flooring; at the exact origin it
    /// keeps `latlon_to_pixel(pixel_to_latlon(0, 0)) == (0, 0)` despite the
    /// sub-millimeter reconstruction error of the projection series.
    pub fn latlon_to_pixel(&self, lat: f64, lon: f64) -> (i64, i64) {
        let (easting, northing) = self.latlon_to_utm(lat, lon);
        let px = ((easting - self.origin_x) / self.pixel_size_x) as i64;
        let py = ((self.origin_y - northing) / self.pixel_size_y) as i64;
        (px, py)
    }

    /// Convert pixel coordinates to WGS84 lat/lon (degrees).
    ///
    /// Inverts the affine relation to recover easting/northing, then applies
    /// the footpoint-latitude inverse series. Northing decreases as the pixel
    /// row increases: the affine origin is the raster's top-left corner.
    pub fn pixel_to_latlon(&self, px: i64, py: i64) -> (f64, f64) {
        let easting = self.origin_x + px as f64 * self.pixel_size_x;
        let northing = self.origin_y - py as f64 * self.pixel_size_y;
        self.utm_to_latlon(easting, northing)
    }

    /// Pixel dimensions of a nadir sensor footprint.
    ///
    /// Models the footprint as a single linear ground width
    /// `2 * altitude * tan(fov / 2)` and divides it independently by each
    /// pixel size. This deliberately assumes a square footprint and is exact
    /// only when `pixel_size_x ≈ pixel_size_y`.
    pub fn fov_to_pixels(&self, altitude_m: f64, fov_deg: f64) -> (i64, i64) {
        let ground_width = 2.0 * altitude_m * (fov_deg / 2.0).to_radians().tan();
        let width = (ground_width / self.pixel_size_x) as i64;
        let height = (ground_width / self.pixel_size_y) as i64;
        (width, height)
    }

    /// Forward UTM projection: lat/lon (degrees) to easting/northing (meters).
    fn latlon_to_utm(&self, lat: f64, lon: f64) -> (f64, f64) {
        let e2 = 2.0 * WGS84_F - WGS84_F * WGS84_F;
        let ep2 = e2 / (1.0 - e2);

        let lat_rad = lat.to_radians();
        let lon_rad = lon.to_radians();
        let lon0_rad = self.central_meridian.to_radians();

        let sin_lat = lat_rad.sin();
        let cos_lat = lat_rad.cos();
        let tan_lat = lat_rad.tan();

        let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = ep2 * cos_lat * cos_lat;
        let a = (lon_rad - lon0_rad) * cos_lat;

        // Meridional arc length
        let m = WGS84_A
            * ((1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0) * lat_rad
                - (3.0 * e2 / 8.0 + 3.0 * e2 * e2 / 32.0 + 45.0 * e2 * e2 * e2 / 1024.0)
                    * (2.0 * lat_rad).sin()
                + (15.0 * e2 * e2 / 256.0 + 45.0 * e2 * e2 * e2 / 1024.0) * (4.0 * lat_rad).sin()
                - (35.0 * e2 * e2 * e2 / 3072.0) * (6.0 * lat_rad).sin());

        let easting = UTM_K0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
            + FALSE_EASTING;
        let northing = UTM_K0
            * (m + n
                * tan_lat
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));

        (easting, northing)
    }

    /// Inverse UTM projection: easting/northing (meters) to lat/lon (degrees).
    fn utm_to_latlon(&self, easting: f64, northing: f64) -> (f64, f64) {
        let e2 = 2.0 * WGS84_F - WGS84_F * WGS84_F;
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
        let ep2 = e2 / (1.0 - e2);

        let x = easting - FALSE_EASTING;
        let m = northing / UTM_K0;
        let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));

        // Footpoint latitude
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let n1 = WGS84_A / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
        let t1 = tan_phi1 * tan_phi1;
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
        let d = x / (n1 * UTM_K0);

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let lon = self.central_meridian.to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        (lat.to_degrees(), lon.to_degrees())
    }
}
