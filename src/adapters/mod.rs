//! # Adapter layer: from logger exports to raw telemetry
//!
//! An [`Adapter`] is a pure `(predicate, parse)` pair. Adapters are evaluated in the fixed
//! priority order of [`ADAPTERS`]; the first whose extension list and predicate accept a
//! file parses it into a [`RawTelemetry`].
//!
//! Modules
//! -----------------
//! * [`columns`] – Static alias table and header resolution.
//! * [`csv_table`] – Dialect detection and tabular reading.
//! * [`trackaddict`] – Heuristic adapter for TrackAddict, RaceRender and RaceChrono exports.
//! * [`generic_csv`] – Adapter for files already using canonical column names.
//!
//! Selection
//! -----------------
//! 1. The file extension is checked first; a file no adapter claims fails with
//!    [`TelemetryError::AdapterNotFound`] without being read.
//! 2. The file is read once into a [`CsvTable`].
//! 3. Predicates run in order on that table; the first match wins.
//!
//! Entry points
//! -----------------
//! * [`parse_raw_file`] – Select and run an adapter.
//! * [`parse_telemetry_file`] / [`parse_telemetry_file_with_params`] – Parse and canonicalize.
//! * [`parse_telemetry_files`] – Batch variant; one failing file never aborts the others.
//!
//! Example
//! -----------------
//! ```rust,no_run
//! use camino::Utf8Path;
//! use telecanon::adapters::parse_telemetry_file;
//! use telecanon::coordinates::OriginOverride;
//!
//! # fn run() -> Result<(), telecanon::telemetry_errors::TelemetryError> {
//! let run = parse_telemetry_file(Utf8Path::new("session.csv"), &OriginOverride::auto())?;
//! println!("{} samples over {:.1} s", run.len(), run.metadata().duration_s);
//! # Ok(()) }
//! ```
pub mod columns;
pub mod csv_table;
pub mod generic_csv;
pub mod trackaddict;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::canonicalizer::{canonicalize_raw_with_params, CanonicalizeParams};
use crate::coordinates::OriginOverride;
use crate::raw::{RawTelemetry, TimeUnit};
use crate::run::TelemetryRun;
use crate::telemetry_errors::TelemetryError;
use crate::time::parse_time_cell;

use self::csv_table::CsvTable;

/// A source format: accepted extensions, a capability predicate and a parser.
#[derive(Debug, Clone, Copy)]
pub struct Adapter {
    pub name: &'static str,
    /// Lower-case extensions, without the dot.
    pub extensions: &'static [&'static str],
    pub can_parse: fn(&CsvTable) -> bool,
    pub parse: fn(&Utf8Path, &CsvTable) -> Result<RawTelemetry, TelemetryError>,
}

impl Adapter {
    /// True if `path` carries one of the adapter's extensions (case-insensitive).
    pub fn accepts_extension(&self, path: &Utf8Path) -> bool {
        path.extension()
            .map(str::to_lowercase)
            .is_some_and(|ext| self.extensions.contains(&ext.as_str()))
    }

    /// Extension and predicate check combined.
    pub fn accepts(&self, path: &Utf8Path, table: &CsvTable) -> bool {
        self.accepts_extension(path) && (self.can_parse)(table)
    }
}

/// Registered adapters, in priority order.
pub static ADAPTERS: &[Adapter] = &[
    Adapter {
        name: trackaddict::NAME,
        extensions: &["csv"],
        can_parse: trackaddict::can_parse,
        parse: trackaddict::parse,
    },
    Adapter {
        name: generic_csv::NAME,
        extensions: &["csv"],
        can_parse: generic_csv::can_parse,
        parse: generic_csv::parse,
    },
];

/// Pick the first adapter of [`ADAPTERS`] accepting `path` and its table.
///
/// Errors
/// ----------
/// * [`TelemetryError::AdapterNotFound`] if no adapter accepts the file.
pub fn select_adapter(
    path: &Utf8Path,
    table: &CsvTable,
) -> Result<&'static Adapter, TelemetryError> {
    let adapter = ADAPTERS
        .iter()
        .find(|adapter| adapter.accepts(path, table))
        .ok_or_else(|| TelemetryError::AdapterNotFound(path.to_string()))?;
    debug!(adapter = adapter.name, %path, "selected adapter");
    Ok(adapter)
}

/// Read `path` and parse it with the first matching adapter.
///
/// Return
/// ----------
/// * The unnormalized [`RawTelemetry`], or the first error among
///   [`TelemetryError::AdapterNotFound`], [`TelemetryError::IoFailure`],
///   [`TelemetryError::MalformedHeader`] and [`TelemetryError::UnsupportedTimeFormat`].
pub fn parse_raw_file(path: &Utf8Path) -> Result<RawTelemetry, TelemetryError> {
    if !ADAPTERS.iter().any(|a| a.accepts_extension(path)) {
        return Err(TelemetryError::AdapterNotFound(path.to_string()));
    }
    let table = CsvTable::from_path(path)?;
    let adapter = select_adapter(path, &table)?;
    (adapter.parse)(path, &table)
}

/// Parse and canonicalize a file with default [`CanonicalizeParams`].
///
/// See also
/// ------------
/// * [`parse_telemetry_file_with_params`] – Same, with explicit parameters.
pub fn parse_telemetry_file(
    path: &Utf8Path,
    origin: &OriginOverride,
) -> Result<TelemetryRun, TelemetryError> {
    parse_telemetry_file_with_params(path, origin, &CanonicalizeParams::default())
}

/// Parse and canonicalize a file.
///
/// Arguments
/// -----------------
/// * `path`: the source file.
/// * `origin`: optional origin components; `None` components are detected from the data.
/// * `params`: canonicalization parameters.
pub fn parse_telemetry_file_with_params(
    path: &Utf8Path,
    origin: &OriginOverride,
    params: &CanonicalizeParams,
) -> Result<TelemetryRun, TelemetryError> {
    let raw = parse_raw_file(path)?;
    Ok(canonicalize_raw_with_params(raw, origin, params))
}

/// Parse many files, isolating per-file failures.
///
/// Return
/// ----------
/// * One `(path, result)` pair per input, in input order.
pub fn parse_telemetry_files(
    paths: &[Utf8PathBuf],
    origin: &OriginOverride,
) -> Vec<(Utf8PathBuf, Result<TelemetryRun, TelemetryError>)> {
    paths
        .iter()
        .map(|path| {
            let result = parse_telemetry_file(path, origin);
            if let Err(e) = &result {
                warn!(%path, error = %e, "failed to parse telemetry file");
            }
            (path.clone(), result)
        })
        .collect()
}

/// Read a time column and the unit it declares.
///
/// `GPS Time` style headers declare milliseconds, clock strings declare seconds,
/// anything else is left to the magnitude heuristic.
pub(crate) fn read_time_column(
    table: &CsvTable,
    index: usize,
    header: &str,
) -> Result<(Vec<f64>, TimeUnit), TelemetryError> {
    let values = table
        .cells(index)
        .map(parse_time_cell)
        .collect::<Result<Vec<_>, _>>()?;

    let key = header.to_lowercase().replace(' ', "");
    let unit = if key == "gpstime" || key == "gps_time" {
        TimeUnit::Milliseconds
    } else if table.cells(index).any(|c| c.contains(':')) {
        TimeUnit::Seconds
    } else {
        TimeUnit::Auto
    };

    Ok((values, unit))
}

#[cfg(test)]
mod adapters_test {
    use super::*;

    #[test]
    fn test_priority_order() {
        let names: Vec<_> = ADAPTERS.iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["trackaddict", "generic_csv"]);
    }

    #[test]
    fn test_select_adapter() {
        let path = Utf8Path::new("run.CSV");

        let table = CsvTable::from_text("Time,Latitude,Longitude\n0,45,7\n").unwrap();
        assert_eq!(select_adapter(path, &table).unwrap().name, "trackaddict");

        let table = CsvTable::from_text("time,accel_x\n0,0.1\n").unwrap();
        assert_eq!(select_adapter(path, &table).unwrap().name, "generic_csv");

        let table = CsvTable::from_text("foo,bar\n0,1\n").unwrap();
        assert!(matches!(
            select_adapter(path, &table),
            Err(TelemetryError::AdapterNotFound(_))
        ));

        let table = CsvTable::from_text("Time,Latitude\n0,45\n").unwrap();
        assert!(matches!(
            select_adapter(Utf8Path::new("run.txt"), &table),
            Err(TelemetryError::AdapterNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_extension_is_rejected_before_reading() {
        let err = parse_raw_file(Utf8Path::new("/definitely/missing/run.txt")).unwrap_err();
        assert!(matches!(err, TelemetryError::AdapterNotFound(_)));
    }

    #[test]
    fn test_read_time_column_units() {
        let table = CsvTable::from_text("GPS Time,MPH\n1000,1\n1100,2\n").unwrap();
        let (values, unit) = read_time_column(&table, 0, "GPS Time").unwrap();
        assert_eq!(values, vec![1000.0, 1100.0]);
        assert_eq!(unit, TimeUnit::Milliseconds);

        let table = CsvTable::from_text("Time\n00:00:01.5\n00:00:02\n").unwrap();
        let (values, unit) = read_time_column(&table, 0, "Time").unwrap();
        assert_eq!(values, vec![1.5, 2.0]);
        assert_eq!(unit, TimeUnit::Seconds);

        let table = CsvTable::from_text("Time\n0.0\nnoon\n").unwrap();
        assert_eq!(
            read_time_column(&table, 0, "Time"),
            Err(TelemetryError::UnsupportedTimeFormat("noon".into()))
        );
    }
}
