//! # TrackAddict / RaceRender / RaceChrono adapter
//!
//! Heuristic adapter for logger exports whose column names vary between apps and
//! versions. Every channel is located through the [`COLUMN_ALIASES`](super::columns::COLUMN_ALIASES)
//! table, so the same code reads a RaceRender export (`Time, Latitude, MPH, X, Y, …`) and a
//! RaceChrono export (`timestamp, latitude, speed, lateral_acc, …`).
//!
//! Values keep their source units; the speed and yaw-rate units are recorded on the
//! [`RawTelemetry`] for the canonicalizer.
use camino::Utf8Path;
use tracing::debug;

use super::columns::{ColumnMap, SourceChannel};
use super::csv_table::CsvTable;
use super::read_time_column;
use crate::raw::{FileFingerprint, RawTelemetry, SpeedUnit, YawRateUnit};
use crate::telemetry_errors::TelemetryError;
use crate::time::recorded_at_from_stem;

pub const NAME: &str = "trackaddict";

/// Accepts a table whose header resolves a latitude, longitude or speed column.
pub fn can_parse(table: &CsvTable) -> bool {
    ColumnMap::resolve(table.headers()).contains_any(&[
        SourceChannel::Latitude,
        SourceChannel::Longitude,
        SourceChannel::SpeedMs,
        SourceChannel::SpeedMph,
        SourceChannel::SpeedKph,
    ])
}

/// Build a [`RawTelemetry`] from an already read table.
///
/// Arguments
/// -----------------
/// * `path`: the source file, used for identity, display name and recorded-at.
/// * `table`: the table read from `path`.
///
/// Return
/// ----------
/// * The raw telemetry, or:
///   - [`TelemetryError::MalformedHeader`] when no time column resolves,
///   - [`TelemetryError::UnsupportedTimeFormat`] on an unreadable time cell,
///   - [`TelemetryError::IoFailure`] when the file cannot be stat'ed.
pub fn parse(path: &Utf8Path, table: &CsvTable) -> Result<RawTelemetry, TelemetryError> {
    let columns = ColumnMap::resolve(table.headers());
    debug!(%path, columns = ?columns, "resolved columns");

    let time = columns.get(SourceChannel::Time).ok_or_else(|| {
        TelemetryError::MalformedHeader(format!("{path}: no time column in header"))
    })?;
    let (timestamps, time_unit) = read_time_column(table, time.index, &time.header)?;
    let n = timestamps.len();

    let numeric = |channel: SourceChannel| -> Option<Vec<f64>> {
        columns.index(channel).map(|i| table.numeric_column(i))
    };
    let numeric_or_nan = |channel: SourceChannel| numeric(channel).unwrap_or_else(|| vec![f64::NAN; n]);

    let (speed, speed_unit) = [
        (SourceChannel::SpeedMs, SpeedUnit::MetersPerSecond),
        (SourceChannel::SpeedMph, SpeedUnit::Mph),
        (SourceChannel::SpeedKph, SpeedUnit::Kph),
    ]
    .into_iter()
    .find_map(|(channel, unit)| {
        numeric(channel)
            .filter(|values| values.iter().any(|v| !v.is_nan()))
            .map(|values| (values, Some(unit)))
    })
    .unwrap_or_else(|| (vec![f64::NAN; n], None));

    let yaw_rate_unit = columns.header(SourceChannel::YawRate).map(|header| {
        if header.to_lowercase().contains("rad") {
            YawRateUnit::RadPerSec
        } else {
            YawRateUnit::DegPerSec
        }
    });

    let gps_update = columns
        .index(SourceChannel::GpsUpdate)
        .map(|i| table.cells(i).map(parse_gps_update).collect());

    let lap_number = columns
        .index(SourceChannel::Lap)
        .map(|i| forward_fill_laps(table.cells(i)));

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
        latitude: numeric_or_nan(SourceChannel::Latitude),
        longitude: numeric_or_nan(SourceChannel::Longitude),
        altitude: numeric_or_nan(SourceChannel::Altitude),
        speed,
        speed_unit,
        accel_x: numeric(SourceChannel::AccelX),
        accel_y: numeric(SourceChannel::AccelY),
        yaw_rate: numeric(SourceChannel::YawRate),
        yaw_rate_unit,
        heading: numeric(SourceChannel::Heading),
        gps_accuracy: numeric(SourceChannel::GpsAccuracy),
        gps_update,
        lap_number,
    })
}

/// A GPS-update cell is set when it is a non-zero number or `true`/`yes`.
fn parse_gps_update(cell: &str) -> bool {
    let cell = cell.trim();
    match cell.parse::<f64>() {
        Ok(v) => v != 0.0 && !v.is_nan(),
        Err(_) => matches!(cell.to_lowercase().as_str(), "true" | "yes"),
    }
}

/// Forward-fill a sparse lap column; rows before the first lap value get lap `0`.
fn forward_fill_laps<'a>(cells: impl Iterator<Item = &'a str>) -> Vec<i32> {
    let mut current = 0;
    cells
        .map(|cell| {
            let cell = cell.trim();
            let parsed = cell.parse::<i32>().ok().or_else(|| {
                cell.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| v as i32)
            });
            if let Some(lap) = parsed {
                current = lap;
            }
            current
        })
        .collect()
}
