//! Pure-Rust WGS84 ↔ UTM coordinate transforms (Snyder 1987, USGS formulas).
//!
//! Covers EPSG 326xx (UTM North) and 327xx (UTM South) against geographic
//! WGS84 (EPSG 4326), which spans the lidar and satellite DEM products this
//! library targets. No external C dependencies (no libproj).

use terrafuse_core::crs::Crs;
use terrafuse_core::error::{Error, Result};
use terrafuse_core::raster::Bounds;

// ── WGS84 ellipsoid constants ────────────────────────────────────────────

const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// A coordinate transform between two supported reference systems.
///
/// `apply` maps source coordinates to target coordinates; `inverse` builds
/// the opposite transform. The identity case covers same-CRS warps, which
/// are pure clip/resample operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordTransform {
    /// Source and target are equivalent; coordinates pass through
    Identity,
    /// WGS84 geographic to UTM zone
    ToUtm { zone: u32, north: bool },
    /// UTM zone to WGS84 geographic
    FromUtm { zone: u32, north: bool },
}

impl CoordTransform {
    /// Build the transform from `src` to `dst`.
    ///
    /// Fails with `Error::Reprojection` when either CRS lacks an EPSG code
    /// or the pair is outside the supported WGS84/UTM set.
    pub fn new(src: &Crs, dst: &Crs) -> Result<Self> {
        if src.is_equivalent(dst) {
            return Ok(Self::Identity);
        }

        let src_epsg = src.epsg().ok_or_else(|| {
            Error::Reprojection(format!("source CRS {} has no EPSG code", src.identifier()))
        })?;
        let dst_epsg = dst.epsg().ok_or_else(|| {
            Error::Reprojection(format!("target CRS {} has no EPSG code", dst.identifier()))
        })?;

        match (
            is_wgs84(src_epsg),
            parse_utm_epsg(src_epsg),
            is_wgs84(dst_epsg),
            parse_utm_epsg(dst_epsg),
        ) {
            (true, _, _, Some((zone, north))) => Ok(Self::ToUtm { zone, north }),
            (_, Some((zone, north)), true, _) => Ok(Self::FromUtm { zone, north }),
            _ => Err(Error::Reprojection(format!(
                "unsupported transform EPSG:{} -> EPSG:{} (only WGS84 <-> UTM)",
                src_epsg, dst_epsg
            ))),
        }
    }

    /// Transform a single point from source to target coordinates.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        match *self {
            Self::Identity => (x, y),
            Self::ToUtm { zone, north } => wgs84_to_utm(x, y, zone, north),
            Self::FromUtm { zone, north } => utm_to_wgs84(x, y, zone, north),
        }
    }

    /// The transform mapping target coordinates back to source coordinates.
    pub fn inverse(&self) -> Self {
        match *self {
            Self::Identity => Self::Identity,
            Self::ToUtm { zone, north } => Self::FromUtm { zone, north },
            Self::FromUtm { zone, north } => Self::ToUtm { zone, north },
        }
    }

    /// Transform a bounding box by projecting all four corners and taking
    /// the envelope. This handles the non-linear distortion of the UTM
    /// projection better than transforming only min/max.
    pub fn transform_bounds(&self, bounds: &Bounds) -> Bounds {
        if let Self::Identity = self {
            return *bounds;
        }

        let corners = [
            (bounds.min_x, bounds.min_y),
            (bounds.min_x, bounds.max_y),
            (bounds.max_x, bounds.min_y),
            (bounds.max_x, bounds.max_y),
        ];

        let mut out = Bounds::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for &(x, y) in &corners {
            let (tx, ty) = self.apply(x, y);
            out.min_x = out.min_x.min(tx);
            out.min_y = out.min_y.min(ty);
            out.max_x = out.max_x.max(tx);
            out.max_y = out.max_y.max(ty);
        }
        out
    }
}

/// Check if an EPSG code represents WGS84 geographic.
pub fn is_wgs84(epsg: u32) -> bool {
    epsg == 4326
}

/// Parse an EPSG code into UTM zone info: `Some((zone, is_north))`.
///
/// - EPSG 326xx → zone xx, North hemisphere
/// - EPSG 327xx → zone xx, South hemisphere
pub fn parse_utm_epsg(epsg: u32) -> Option<(u32, bool)> {
    if (32601..=32660).contains(&epsg) {
        Some((epsg - 32600, true))
    } else if (32701..=32760).contains(&epsg) {
        Some((epsg - 32700, false))
    } else {
        None
    }
}

// ── Core projection (Snyder 1987, USGS Prof. Paper 1395, pp. 61-64) ─────

/// Central meridian of a UTM zone, radians.
fn central_meridian(zone: u32) -> f64 {
    ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

/// Convert WGS84 (longitude, latitude) in degrees to UTM (easting, northing)
/// in metres for the given zone and hemisphere.
fn wgs84_to_utm(lon_deg: f64, lat_deg: f64, zone: u32, north: bool) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let lon0 = central_meridian(zone);

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * (lon - lon0);

    // Meridional arc length M (Snyder eq. 3-21)
    let m = meridional_arc(lat);

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Easting (Snyder eq. 8-9)
    let easting = K0 * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2)
                * a4
                * a_coeff
                / 120.0)
        + FALSE_EASTING;

    // Northing (Snyder eq. 8-10)
    let northing = K0
        * (m
            + n
                * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    let northing = if north {
        northing
    } else {
        northing + FALSE_NORTHING_SOUTH
    };

    (easting, northing)
}

/// Convert UTM (easting, northing) in metres back to WGS84
/// (longitude, latitude) in degrees. Snyder eqs. 8-17 to 8-25.
fn utm_to_wgs84(easting: f64, northing: f64, zone: u32, north: bool) -> (f64, f64) {
    let lon0 = central_meridian(zone);

    let x = easting - FALSE_EASTING;
    let y = if north {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };

    let e2 = E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    // Footpoint latitude (Snyder eqs. 7-19, 3-24)
    let m = y / K0;
    let mu = m / (A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let sqrt_1me2 = (1.0 - e2).sqrt();
    let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_2 * e1_2;

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let c1 = E_PRIME2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let n1 = A / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
    let r1 = A * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
    let d = x / (n1 * K0);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d2 * d2;
    let d5 = d4 * d;
    let d6 = d4 * d2;

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * E_PRIME2
                    - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                * d5
                / 120.0)
            / cos_phi1;

    (lon.to_degrees(), lat.to_degrees())
}

/// Meridional arc from equator to latitude `lat` (radians).
/// Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e2 = E2;
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    A * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

// ── Tests ────────────────────────────────────────────────────────────────
