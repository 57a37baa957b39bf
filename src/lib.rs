//! # Telecanon
//!
//! Ingestion of vehicle telemetry logs into a single canonical run model.
//!
//! Data-logging apps write CSV files with their own headers, units, time formats and metadata
//! preambles. Telecanon reads them through a small set of adapters, canonicalizes the result
//! into fixed units and frames, and serves the runs of a data folder through a cached
//! repository.
//!
//! Pipeline
//! -----------------
//! ```text
//! file.csv ──► adapters ──► RawTelemetry ──► canonicalizer ──► TelemetryRun ──► sampling
//!                                                                  ▲
//!                                                       repository (index + cache)
//! ```
//!
//! Modules
//! -----------------
//! * [`adapters`] – Format detection and parsing of CSV logs into [`raw::RawTelemetry`].
//! * [`canonicalizer`] – Units, frames, validity, idle trim and anchoring.
//! * [`run`] – The canonical [`TelemetryRun`], its sampling queries and summaries.
//! * [`coordinates`] – WGS84 geodetic ↔ ECEF ↔ local ENU transforms.
//! * [`time`] – Time column parsing, unit resolution and file-name dates.
//! * [`repository`] – Folder index and single-flight run cache.
//! * [`telemetry_errors`] – The crate error type.
//!
//! Example
//! -----------------
//! ```rust,no_run
//! use camino::Utf8Path;
//! use telecanon::{parse_telemetry_file, OriginOverride};
//!
//! # fn run() -> Result<(), telecanon::TelemetryError> {
//! let run = parse_telemetry_file(Utf8Path::new("session_20240601_101500.csv"), &OriginOverride::auto())?;
//! println!("{} samples over {:.1} s", run.len(), run.metadata().duration_s);
//!
//! let mid = run.sample_at_time(run.metadata().duration_s / 2.0);
//! println!("speed at half-time: {:.1} m/s", mid.speed);
//! # Ok(()) }
//! ```
pub mod adapters;
pub mod canonicalizer;
pub mod constants;
pub mod coordinates;
pub mod raw;
pub mod repository;
pub mod run;
pub mod telemetry_errors;
pub mod time;

pub use adapters::{parse_raw_file, parse_telemetry_file, parse_telemetry_files};
pub use canonicalizer::{canonicalize_raw, canonicalize_raw_with_params, CanonicalizeParams};
pub use coordinates::{GeodeticOrigin, OriginOverride};
pub use raw::RawTelemetry;
pub use repository::RunRepository;
pub use run::sampling::{BoundingBox, Sample};
pub use run::summary::RunSummary;
pub use run::{Channel, TelemetryRun};
pub use telemetry_errors::TelemetryError;
