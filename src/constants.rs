//! # Constants and type definitions for telecanon
//!
//! This module centralizes the **geodetic constants**, **unit conversion factors**, and
//! **common type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - WGS84 ellipsoid parameters used by the coordinate transforms
//! - Unit conversions (mph/kph → m/s, rad/s → deg/s, ms → s)
//! - Canonicalization defaults (G ceiling, launch threshold, canonical version tag)
//! - Type aliases documenting the unit carried by a plain `f64`

// -------------------------------------------------------------------------------------------------
// Geodesy
// -------------------------------------------------------------------------------------------------

/// WGS84 semi-major axis (equatorial radius) in meters
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS84 semi-minor axis (polar radius) in meters
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = 1.0 - (WGS84_B * WGS84_B) / (WGS84_A * WGS84_A);

/// Mean Earth radius in meters, spherical approximation used by the haversine distance
pub const EARTH_MEAN_RADIUS: f64 = 6_371_000.0;

/// Number of fixed-point iterations used to recover geodetic latitude from ECEF
pub const ENU_TO_GPS_ITERATIONS: usize = 5;

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// Miles per hour → meters per second
pub const MPH_TO_MS: f64 = 0.44704;

/// Kilometers per hour → meters per second
pub const KPH_TO_MS: f64 = 0.277778;

/// Milliseconds per second
pub const MS_PER_S: f64 = 1000.0;

// -------------------------------------------------------------------------------------------------
// Time-unit magnitude heuristics
// -------------------------------------------------------------------------------------------------

/// Above this magnitude a time value is read as epoch milliseconds
pub const EPOCH_MS_THRESHOLD: f64 = 1.0e11;

/// Above this magnitude (and up to [`EPOCH_MS_THRESHOLD`]) a time value is read as epoch seconds
pub const EPOCH_S_THRESHOLD: f64 = 1.0e7;

/// Above this magnitude (and up to [`EPOCH_S_THRESHOLD`]) a time value is read as a millisecond duration
pub const DURATION_MS_THRESHOLD: f64 = 1.0e5;

// -------------------------------------------------------------------------------------------------
// Canonicalization
// -------------------------------------------------------------------------------------------------

/// Sanity ceiling on the magnitude of a body-frame acceleration sample (G)
pub const MAX_ABS_G: f64 = 4.5;

/// Default total-G launch threshold used by the idle trim (G)
pub const DEFAULT_LAUNCH_THRESHOLD_G: f64 = 0.25;

/// Version tag of the canonical representation
pub const CANONICAL_VERSION: &str = "v1";

/// Floor applied to the run duration when computing the sample rate (s)
pub const MIN_RATE_DURATION: f64 = 0.001;

/// Number of hexadecimal characters kept from the identity digest
pub const RUN_ID_LEN: usize = 16;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Distance in meters
pub type Meter = f64;
/// Duration or timestamp in seconds
pub type Second = f64;
/// Acceleration in multiples of standard gravity
pub type GForce = f64;
/// Speed in meters per second
pub type MeterPerSecond = f64;

/// Stable identity of a canonical run (truncated SHA-256 hex digest)
pub type RunId = String;
