//! Lightweight per-run summaries for listings.
use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::TelemetryRun;
use crate::constants::RunId;

/// What a listing needs to know about a run without its sample arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: RunId,
    pub name: String,
    /// File name of the source, without its directory.
    pub source_file: String,
    pub recorded_at: Option<NaiveDateTime>,
    pub duration_s: f64,
    pub sample_count: usize,
    pub has_gps: bool,
    pub has_imu: bool,
}

impl RunSummary {
    pub fn from_run(run: &TelemetryRun) -> Self {
        let meta = run.metadata();
        RunSummary {
            id: meta.id.clone(),
            name: meta.name.clone(),
            source_file: meta
                .source_file
                .file_name()
                .unwrap_or(meta.source_file.as_str())
                .to_string(),
            recorded_at: meta.recorded_at,
            duration_s: meta.duration_s,
            sample_count: meta.sample_count,
            has_gps: meta.has_gps,
            has_imu: meta.has_imu,
        }
    }

    /// Listing order: most recent first, then name descending; undated runs last.
    pub fn listing_order(a: &RunSummary, b: &RunSummary) -> Ordering {
        b.recorded_at
            .cmp(&a.recorded_at)
            .then_with(|| b.name.cmp(&a.name))
    }
}

impl From<&TelemetryRun> for RunSummary {
    fn from(run: &TelemetryRun) -> Self {
        RunSummary::from_run(run)
    }
}

/// Sort summaries in [`RunSummary::listing_order`].
pub fn sort_summaries(summaries: &mut [RunSummary]) {
    summaries.sort_by(RunSummary::listing_order);
}
