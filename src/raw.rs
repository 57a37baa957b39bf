//! # Raw telemetry (source units, unnormalized)
//!
//! Adapters load a source file into a [`RawTelemetry`] before canonicalization.
//! Values keep the units of the source; the unit of each channel that has more than one
//! possible unit is carried alongside it and only resolved by the
//! [`canonicalizer`](crate::canonicalizer).
//!
//! A [`RawTelemetry`] is transient: built once per parse and consumed immediately.
use std::time::UNIX_EPOCH;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDateTime;
use sha2::{Digest, Sha256};

use crate::constants::{RunId, RUN_ID_LEN};
use crate::telemetry_errors::TelemetryError;

/// Unit of the timestamp column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    /// Not declared by the source: resolved from the magnitude of the values.
    #[default]
    Auto,
}

/// Unit of the measured speed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedUnit {
    MetersPerSecond,
    Mph,
    Kph,
}

impl SpeedUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::Mph => "mph",
            SpeedUnit::Kph => "kph",
        }
    }
}

/// Unit of the measured yaw-rate column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YawRateUnit {
    DegPerSec,
    RadPerSec,
}

/// Identity inputs of a source file, captured when the file is read.
///
/// The run identity is a truncated SHA-256 over the file name, byte size and
/// modification time: stable while the file is untouched, changed by any touch.
/// It is a fingerprint of the file, not a hash of its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFingerprint {
    pub file_name: String,
    pub size: u64,
    /// Modification time rendered as `seconds.nanoseconds` since the Unix epoch.
    pub modified: String,
}

impl FileFingerprint {
    pub fn new(file_name: impl Into<String>, size: u64, modified: impl Into<String>) -> Self {
        FileFingerprint {
            file_name: file_name.into(),
            size,
            modified: modified.into(),
        }
    }

    /// Stat `path` and capture its fingerprint.
    ///
    /// Errors
    /// ----------
    /// * [`TelemetryError::IoFailure`] if the file cannot be stat'ed.
    pub fn from_path(path: &Utf8Path) -> Result<Self, TelemetryError> {
        let meta = std::fs::metadata(path)?;
        let since_epoch = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        Ok(FileFingerprint {
            file_name: path.file_name().unwrap_or(path.as_str()).to_string(),
            size: meta.len(),
            modified: format!(
                "{}.{:09}",
                since_epoch.as_secs(),
                since_epoch.subsec_nanos()
            ),
        })
    }

    /// Truncated hex digest identifying the run built from this file.
    pub fn run_id(&self) -> RunId {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}_{}_{}", self.file_name, self.size, self.modified).as_bytes());
        let mut id = hex::encode(hasher.finalize());
        id.truncate(RUN_ID_LEN);
        id
    }
}

/// Raw telemetry extracted from a source file.
///
/// Every per-sample vector has the length of `timestamps`. Optional channels that the
/// source does not provide are either `None` or filled with `NaN`.
#[derive(Debug, Clone)]
pub struct RawTelemetry {
    /// Name of the adapter that produced this value.
    pub source: String,
    pub source_file: Utf8PathBuf,
    pub fingerprint: FileFingerprint,
    pub name: String,

    pub timestamps: Vec<f64>,
    pub time_unit: TimeUnit,

    /// Degrees.
    pub latitude: Vec<f64>,
    /// Degrees.
    pub longitude: Vec<f64>,
    /// Meters.
    pub altitude: Vec<f64>,

    pub speed: Vec<f64>,
    pub speed_unit: Option<SpeedUnit>,

    /// Longitudinal acceleration, G.
    pub accel_x: Option<Vec<f64>>,
    /// Lateral acceleration, G.
    pub accel_y: Option<Vec<f64>>,

    pub yaw_rate: Option<Vec<f64>>,
    pub yaw_rate_unit: Option<YawRateUnit>,

    /// Degrees.
    pub heading: Option<Vec<f64>>,

    pub gps_accuracy: Option<Vec<f64>>,
    pub gps_update: Option<Vec<bool>>,

    pub lap_number: Option<Vec<i32>>,
    pub recorded_at: Option<NaiveDateTime>,
}

impl RawTelemetry {
    /// Build a raw value with only timestamps and GPS; every other channel is absent.
    ///
    /// Useful for in-memory producers; adapters fill the remaining fields directly.
    pub fn new(
        source: impl Into<String>,
        source_file: Utf8PathBuf,
        fingerprint: FileFingerprint,
        timestamps: Vec<f64>,
        latitude: Vec<f64>,
        longitude: Vec<f64>,
    ) -> Self {
        let n = timestamps.len();
        let name = source_file.file_stem().unwrap_or_default().to_string();
        RawTelemetry {
            source: source.into(),
            source_file,
            fingerprint,
            name,
            timestamps,
            time_unit: TimeUnit::Seconds,
            latitude,
            longitude,
            altitude: vec![f64::NAN; n],
            speed: vec![f64::NAN; n],
            speed_unit: None,
            accel_x: None,
            accel_y: None,
            yaw_rate: None,
            yaw_rate_unit: None,
            heading: None,
            gps_accuracy: None,
            gps_update: None,
            lap_number: None,
            recorded_at: None,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[cfg(test)]
mod raw_test {
    use super::*;

    #[test]
    fn test_run_id_is_stable_and_truncated() {
        let fp = FileFingerprint::new("run.csv", 1024, "1700000000.000000000");
        let id = fp.run_id();
        assert_eq!(id.len(), RUN_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, fp.clone().run_id());
    }

    #[test]
    fn test_run_id_changes_with_mtime() {
        let a = FileFingerprint::new("run.csv", 1024, "1700000000.000000000");
        let b = FileFingerprint::new("run.csv", 1024, "1700000001.000000000");
        let c = FileFingerprint::new("run.csv", 1025, "1700000000.000000000");
        assert_ne!(a.run_id(), b.run_id());
        assert_ne!(a.run_id(), c.run_id());
    }

    #[test]
    fn test_new_fills_missing_channels() {
        let raw = RawTelemetry::new(
            "test",
            Utf8PathBuf::from("/tmp/2024-05-01_lap.csv"),
            FileFingerprint::new("2024-05-01_lap.csv", 0, "0.000000000"),
            vec![0.0, 0.1],
            vec![45.0, 45.0],
            vec![7.0, 7.0],
        );
        assert_eq!(raw.name, "2024-05-01_lap");
        assert_eq!(raw.len(), 2);
        assert!(raw.speed.iter().all(|v| v.is_nan()));
        assert!(raw.accel_x.is_none());
    }
}
