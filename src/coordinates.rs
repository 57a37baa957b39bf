//! # Geodetic coordinate transforms
//!
//! Pure functions converting WGS84 geodetic positions into the local
//! **East-North-Up (ENU)** tangent-plane frame used by canonical runs, plus the inverse
//! transform, a spherical great-circle distance and compass bearings from planar tracks.
//!
//! ## Frames & conventions
//!
//! ```text
//! Geodetic (lat, lon, alt)  --(WGS84 closed form)-->  ECEF (X, Y, Z)
//!                           --(rotation at origin)-->  ENU (east, north, up)
//! ```
//!
//! - Latitudes/longitudes: **degrees**, altitude: **meters** above the ellipsoid.
//! - ECEF and ENU: **meters**.
//! - Headings: **degrees**, compass convention (0 = north, 90 = east), in `[0, 360)`.
//!
//! ## Invalid samples
//!
//! Transforms over slices never fail: a sample whose latitude or longitude is not finite
//! maps to `NaN` on all three ENU axes.
//!
//! See also
//! ------------
//! * [`gps_to_enu`] – Track conversion with default or overridden origin.
//! * [`enu_to_gps`] – Inverse conversion (fixed-iteration latitude recovery).
//! * [`crate::canonicalizer`] – Main consumer of these transforms.
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::{
    Degree, Meter, EARTH_MEAN_RADIUS, ENU_TO_GPS_ITERATIONS, WGS84_A, WGS84_E2,
};

/// Geodetic origin of a local ENU frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticOrigin {
    pub lat: Degree,
    pub lon: Degree,
    pub alt: Meter,
}

impl GeodeticOrigin {
    pub fn new(lat: Degree, lon: Degree, alt: Meter) -> Self {
        GeodeticOrigin { lat, lon, alt }
    }

    /// ECEF position of the origin, in meters.
    pub fn to_ecef(&self) -> Vector3<f64> {
        geodetic_to_ecef(self.lat, self.lon, self.alt)
    }
}

/// Externally supplied origin components, each independently optional.
///
/// A `None` component falls back to the automatically detected origin
/// (first sample with finite latitude and longitude).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OriginOverride {
    pub lat: Option<Degree>,
    pub lon: Option<Degree>,
    pub alt: Option<Meter>,
}

impl OriginOverride {
    pub fn new(lat: Option<Degree>, lon: Option<Degree>, alt: Option<Meter>) -> Self {
        OriginOverride { lat, lon, alt }
    }

    /// No override: the origin is detected from the data.
    pub fn auto() -> Self {
        Self::default()
    }

    /// True iff at least one component was supplied.
    pub fn is_manual(&self) -> bool {
        self.lat.is_some() || self.lon.is_some() || self.alt.is_some()
    }
}

/// Result of a track conversion into the local ENU frame.
#[derive(Debug, Clone)]
pub struct EnuTrack {
    pub east: Vec<Meter>,
    pub north: Vec<Meter>,
    pub up: Vec<Meter>,
    /// The origin effectively used (detected or overridden).
    pub origin: GeodeticOrigin,
}

/// Convert a geodetic position into ECEF coordinates.
///
/// Uses the WGS84 ellipsoid with the prime-vertical radius of curvature
/// `N = a / sqrt(1 − e²·sin²(lat))`.
///
/// Arguments
/// -----------------
/// * `lat`: geodetic latitude in **degrees**.
/// * `lon`: longitude in **degrees** (east positive).
/// * `alt`: height above the ellipsoid in **meters**.
///
/// Return
/// ----------
/// * ECEF vector `(X, Y, Z)` in **meters**. Non-finite inputs propagate as `NaN`.
pub fn geodetic_to_ecef(lat: Degree, lon: Degree, alt: Meter) -> Vector3<f64> {
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon.to_radians().sin_cos();

    let n = prime_vertical_radius(sin_lat);

    Vector3::new(
        (n + alt) * cos_lat * cos_lon,
        (n + alt) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + alt) * sin_lat,
    )
}

fn prime_vertical_radius(sin_lat: f64) -> f64 {
    WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt()
}

/// Rotation matrix taking an ECEF offset into the ENU frame at the given origin.
///
/// Rows are the east, north and up unit vectors expressed in ECEF; the transpose
/// maps ENU back to ECEF.
pub fn enu_rotation(origin_lat: Degree, origin_lon: Degree) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = origin_lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = origin_lon.to_radians().sin_cos();

    Matrix3::new(
        -sin_lon,
        cos_lon,
        0.0,
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        cos_lat * cos_lon,
        cos_lat * sin_lon,
        sin_lat,
    )
}

/// Rotate the offset `ecef − origin_ecef` into the ENU tangent plane at the origin.
///
/// Arguments
/// -----------------
/// * `ecef`: point in ECEF (**meters**).
/// * `origin_ecef`: origin in ECEF (**meters**).
/// * `origin_lat`, `origin_lon`: geodetic origin in **degrees**.
///
/// Return
/// ----------
/// * `(east, north, up)` in **meters**.
pub fn ecef_to_enu(
    ecef: &Vector3<f64>,
    origin_ecef: &Vector3<f64>,
    origin_lat: Degree,
    origin_lon: Degree,
) -> Vector3<f64> {
    enu_rotation(origin_lat, origin_lon) * (ecef - origin_ecef)
}

/// Convert a GPS track into the local ENU frame.
///
/// The default origin is the first sample where both latitude and longitude are finite;
/// its altitude defaults to that sample's altitude, or `0` when missing. Each component
/// of `origin` that is `Some` replaces the detected one. Samples with a non-finite
/// latitude or longitude map to `NaN` on all axes. A sample with a valid fix but a
/// non-finite altitude is placed at the origin altitude.
///
/// Arguments
/// -----------------
/// * `lat`, `lon`: per-sample geodetic coordinates in **degrees**.
/// * `alt`: optional per-sample altitude in **meters** (treated as all zeros when `None`).
/// * `origin`: independently optional origin components.
///
/// Return
/// ----------
/// * An [`EnuTrack`] whose arrays have the input length, plus the effective origin.
///   When no sample is valid and no override is given, the origin is `(0, 0, 0)`.
///
/// See also
/// ------------
/// * [`geodetic_to_ecef`], [`ecef_to_enu`] – Per-point building blocks.
pub fn gps_to_enu(
    lat: &[f64],
    lon: &[f64],
    alt: Option<&[f64]>,
    origin: &OriginOverride,
) -> EnuTrack {
    let altitude_at = |i: usize| alt.and_then(|a| a.get(i).copied()).unwrap_or(0.0);

    let first_valid = lat
        .iter()
        .zip(lon)
        .position(|(la, lo)| la.is_finite() && lo.is_finite());

    let detected = match first_valid {
        Some(i) => {
            let a = altitude_at(i);
            GeodeticOrigin::new(lat[i], lon[i], if a.is_finite() { a } else { 0.0 })
        }
        None => GeodeticOrigin::new(0.0, 0.0, 0.0),
    };

    let effective = GeodeticOrigin::new(
        origin.lat.unwrap_or(detected.lat),
        origin.lon.unwrap_or(detected.lon),
        origin.alt.unwrap_or(detected.alt),
    );

    let n = lat.len().min(lon.len());
    let mut east = Vec::with_capacity(n);
    let mut north = Vec::with_capacity(n);
    let mut up = Vec::with_capacity(n);

    let rotation = enu_rotation(effective.lat, effective.lon);
    let origin_ecef = effective.to_ecef();

    for i in 0..n {
        if !(lat[i].is_finite() && lon[i].is_finite()) {
            east.push(f64::NAN);
            north.push(f64::NAN);
            up.push(f64::NAN);
            continue;
        }
        let a = altitude_at(i);
        let a = if a.is_finite() { a } else { effective.alt };
        let enu = rotation * (geodetic_to_ecef(lat[i], lon[i], a) - origin_ecef);
        east.push(enu.x);
        north.push(enu.y);
        up.push(enu.z);
    }

    EnuTrack {
        east,
        north,
        up,
        origin: effective,
    }
}

/// Convert a single ENU position back to geodetic coordinates.
///
/// Latitude is recovered with a fixed number of fixed-point refinements
/// ([`ENU_TO_GPS_ITERATIONS`]), recomputing `N` from the current estimate each time.
/// There is no convergence check: accurate near typical driving latitudes, not
/// guaranteed near the poles.
///
/// Return
/// ----------
/// * `(lat, lon, alt)` in **degrees**, **degrees**, **meters**.
pub fn enu_to_geodetic(enu: &Vector3<f64>, origin: &GeodeticOrigin) -> (Degree, Degree, Meter) {
    let ecef = origin.to_ecef() + enu_rotation(origin.lat, origin.lon).transpose() * enu;

    let lon = ecef.y.atan2(ecef.x);
    let p = ecef.x.hypot(ecef.y);

    let mut lat = ecef.z.atan2(p * (1.0 - WGS84_E2));
    for _ in 0..ENU_TO_GPS_ITERATIONS {
        let sin_lat = lat.sin();
        let n = prime_vertical_radius(sin_lat);
        lat = (ecef.z + WGS84_E2 * n * sin_lat).atan2(p);
    }

    let n = prime_vertical_radius(lat.sin());
    let alt = p / lat.cos() - n;

    (lat.to_degrees(), lon.to_degrees(), alt)
}

/// Slice form of [`enu_to_geodetic`].
///
/// Return
/// ----------
/// * `(lat, lon, alt)` vectors with the length of the shortest input.
pub fn enu_to_gps(
    east: &[f64],
    north: &[f64],
    up: &[f64],
    origin: &GeodeticOrigin,
) -> (Vec<Degree>, Vec<Degree>, Vec<Meter>) {
    let mut lat = Vec::with_capacity(east.len());
    let mut lon = Vec::with_capacity(east.len());
    let mut alt = Vec::with_capacity(east.len());

    for ((e, n), u) in east.iter().zip(north).zip(up) {
        let (la, lo, al) = enu_to_geodetic(&Vector3::new(*e, *n, *u), origin);
        lat.push(la);
        lon.push(lo);
        alt.push(al);
    }

    (lat, lon, alt)
}

/// Great-circle distance between two points on a spherical Earth.
///
/// Uses the mean radius [`EARTH_MEAN_RADIUS`]; meant for human-facing distances only,
/// canonical positions always go through the ellipsoidal ENU transform.
///
/// Return
/// ----------
/// * Distance in **meters**.
pub fn haversine_distance(lat1: Degree, lon1: Degree, lat2: Degree, lon2: Degree) -> Meter {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_MEAN_RADIUS * c
}

/// Wrap an angle into `[0, 360)` degrees.
///
/// `NaN` stays `NaN`.
pub fn wrap_360(angle: Degree) -> Degree {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Compass heading of each step of a planar track.
///
/// Step `i` uses `atan2(x[i] − x[i−1], y[i] − y[i−1])`, wrapped into `[0, 360)`.
/// The first sample has no direction of its own and copies the second sample's heading.
///
/// Arguments
/// -----------------
/// * `x`: east positions (**meters**).
/// * `y`: north positions (**meters**).
///
/// Return
/// ----------
/// * Headings in **degrees**; `NaN` where either endpoint of the step is `NaN`.
pub fn heading_from_positions(x: &[f64], y: &[f64]) -> Vec<Degree> {
    let n = x.len().min(y.len());
    let mut heading: Vec<Degree> = (0..n)
        .map(|i| {
            let (dx, dy) = if i == 0 {
                (0.0, 0.0)
            } else {
                (x[i] - x[i - 1], y[i] - y[i - 1])
            };
            wrap_360(dx.atan2(dy).to_degrees())
        })
        .collect();

    if n > 1 {
        heading[0] = heading[1];
    }
    heading
}
