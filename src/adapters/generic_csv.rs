//! # Generic canonical-name CSV adapter
//!
//! Reads files that already use the crate's own column names:
//!
//! | column          | unit    |
//! |-----------------|---------|
//! | `time` / `timestamp` | s, ms or epoch |
//! | `latitude`, `longitude` | deg |
//! | `altitude`      | m       |
//! | `speed_ms`      | m/s     |
//! | `accel_x`, `accel_y` | g  |
//! | `yaw_rate`      | deg/s   |
//! | `heading`       | deg     |
//! | `gps_accuracy`  | m       |
//!
//! Names are matched regardless of ASCII case. Numeric times go through the usual magnitude
//! heuristic, so epoch or duration milliseconds are accepted as well as seconds.
//! There is no lap column and every sample counts as a GPS update.
use camino::Utf8Path;

use super::csv_table::CsvTable;
use super::read_time_column;
use crate::raw::{FileFingerprint, RawTelemetry, SpeedUnit, YawRateUnit};
use crate::telemetry_errors::TelemetryError;
use crate::time::recorded_at_from_stem;

pub const NAME: &str = "generic_csv";

/// Accepts a table with a `time` or `timestamp` header cell, in any case.
pub fn can_parse(table: &CsvTable) -> bool {
    table
        .headers()
        .iter()
        .map(|h| h.trim().to_lowercase())
        .any(|h| h == "time" || h == "timestamp")
}

pub fn parse(path: &Utf8Path, table: &CsvTable) -> Result<RawTelemetry, TelemetryError> {
    let has_values = |index: usize| table.cells(index).any(|c| !c.trim().is_empty());

    let time_index = ["time", "timestamp"]
        .into_iter()
        .filter_map(|name| table.column_index_ignore_case(name))
        .find(|i| has_values(*i))
        .or_else(|| {
            ["time", "timestamp"]
                .into_iter()
                .find_map(|name| table.column_index_ignore_case(name))
        })
        .ok_or_else(|| {
            TelemetryError::MalformedHeader(format!("{path}: no `time` or `timestamp` column"))
        })?;
    let time_header = &table.headers()[time_index];

    let (timestamps, time_unit) = read_time_column(table, time_index, time_header)?;
    let n = timestamps.len();

    let column = |name: &str| -> Vec<f64> {
        table
            .column_index_ignore_case(name)
            .map_or_else(|| vec![f64::NAN; n], |i| table.numeric_column(i))
    };

    let fingerprint = FileFingerprint::from_path(path)?;
    let name = path.file_stem().unwrap_or_default().to_string();

    Ok(RawTelemetry {
        source: NAME.to_string(),
        source_file: path.to_path_buf(),
        fingerprint,
        recorded_at: recorded_at_from_stem(&name),
        name,
        timestamps,
        time_unit,
        latitude: column("latitude"),
        longitude: column("longitude"),
        altitude: column("altitude"),
        speed: column("speed_ms"),
        speed_unit: Some(SpeedUnit::MetersPerSecond),
        accel_x: Some(column("accel_x")),
        accel_y: Some(column("accel_y")),
        yaw_rate: Some(column("yaw_rate")),
        yaw_rate_unit: Some(YawRateUnit::DegPerSec),
        heading: Some(column("heading")),
        gps_accuracy: Some(column("gps_accuracy")),
        gps_update: Some(vec![true; n]),
        lap_number: None,
    })
}

#[cfg(test)]
mod generic_csv_test {
    use super::*;
    use crate::canonicalizer::{canonicalize_raw_with_params, CanonicalizeParams};
    use crate::coordinates::OriginOverride;
    use crate::raw::TimeUnit;
    use approx::assert_abs_diff_eq;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn parse_text(file_name: &str, text: &str) -> (TempDir, RawTelemetry) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join(file_name)).unwrap();
        std::fs::write(&path, text).unwrap();
        let table = CsvTable::from_text(text).unwrap();
        let raw = parse(&path, &table).unwrap();
        (dir, raw)
    }

    fn canonical_times(raw: RawTelemetry) -> Vec<f64> {
        let params = CanonicalizeParams::builder()
            .launch_threshold_g(0.0)
            .build()
            .unwrap();
        canonicalize_raw_with_params(raw, &OriginOverride::auto(), &params)
            .timestamps()
            .to_vec()
    }

    #[test]
    fn test_can_parse_is_case_insensitive() {
        let table = CsvTable::from_text("TimeStamp,foo\n0,1\n").unwrap();
        assert!(can_parse(&table));
        let table = CsvTable::from_text("t,foo\n0,1\n").unwrap();
        assert!(!can_parse(&table));
    }

    #[test]
    fn test_upper_case_headers() {
        let (_dir, raw) = parse_text("upper.csv", "TIME,Accel_X,SPEED_MS\n0.0,0.1,5\n0.5,0.2,6\n");
        assert_eq!(raw.timestamps, vec![0.0, 0.5]);
        assert_eq!(raw.accel_x, Some(vec![0.1, 0.2]));
        assert_eq!(raw.speed, vec![5.0, 6.0]);
        assert!(raw.latitude.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_seconds_stay_seconds() {
        let (_dir, raw) = parse_text("secs.csv", "time,accel_x\n0.0,0\n0.5,0\n1.0,0\n");
        assert_eq!(raw.time_unit, TimeUnit::Auto);
        assert_eq!(canonical_times(raw), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_epoch_milliseconds() {
        let text = "timestamp,accel_x,accel_y\n\
                    1717236900000,0,0\n\
                    1717236900500,0,0\n\
                    1717236901000,0,0\n";
        let (_dir, raw) = parse_text("epoch_ms.csv", text);
        let t = canonical_times(raw);
        assert_eq!(t.len(), 3);
        assert_abs_diff_eq!(t[1], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(t[2], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_duration_milliseconds() {
        let (_dir, raw) = parse_text("dur_ms.csv", "time,accel_x\n0,0\n250000,0\n500000,0\n");
        assert_eq!(canonical_times(raw), vec![0.0, 250.0, 500.0]);
    }
}
