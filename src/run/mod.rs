//! # Canonical run model
//!
//! A [`TelemetryRun`] is the fixed-unit, fixed-frame representation every consumer works on.
//! It is built once by the [`canonicalizer`](crate::canonicalizer) and never mutated afterwards.
//!
//! Units & frames
//! -----------------
//! | channel    | unit  | frame  |
//! |------------|-------|--------|
//! | `x`, `y`, `z` | m  | global ENU (east, north, up) |
//! | `speed`    | m/s   | –      |
//! | `heading`  | deg   | compass, `[0, 360)` |
//! | `ax`, `ay` | g     | body (longitudinal, lateral) |
//! | `yaw_rate` | deg/s | body   |
//! | `total_g`  | g     | body   |
//!
//! Invariants
//! -----------------
//! * Every per-sample array, validity masks included, has `metadata.sample_count` entries.
//! * Timestamps are non-decreasing and start at `0` (when non-empty).
//! * Every [`Channel`] has exactly one [`ChannelInfo`] and therefore one [`Provenance`].
//! * `total_g` is valid exactly where both `ax` and `ay` are valid.
//!
//! Modules
//! -----------------
//! * [`sampling`] – Bounding box, time range, interpolated samples and playback.
//! * [`summary`] – Lightweight per-run summaries for listings.
pub mod sampling;
pub mod summary;

use std::collections::BTreeMap;
use std::fmt;

use camino::Utf8PathBuf;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constants::RunId;
use crate::coordinates::GeodeticOrigin;

/// Channels carrying a validity mask and a [`ChannelInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    X,
    Y,
    Speed,
    Heading,
    Ax,
    Ay,
    YawRate,
    TotalG,
}

impl Channel {
    pub const ALL: [Channel; 8] = [
        Channel::X,
        Channel::Y,
        Channel::Speed,
        Channel::Heading,
        Channel::Ax,
        Channel::Ay,
        Channel::YawRate,
        Channel::TotalG,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::Speed => "speed",
            Channel::Heading => "heading",
            Channel::Ax => "ax",
            Channel::Ay => "ay",
            Channel::YawRate => "yaw_rate",
            Channel::TotalG => "total_g",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a channel was read from the source or computed from other channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Measured,
    Derived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceFrame {
    /// Vehicle body frame.
    Body,
    /// Local ENU frame anchored at the run origin.
    Global,
}

/// Unit, provenance and frame of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub unit: String,
    pub provenance: Provenance,
    pub frame: Option<ReferenceFrame>,
}

impl ChannelInfo {
    pub fn new(
        unit: impl Into<String>,
        provenance: Provenance,
        frame: Option<ReferenceFrame>,
    ) -> Self {
        ChannelInfo {
            unit: unit.into(),
            provenance,
            frame,
        }
    }
}

/// Descriptive metadata of a canonical run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub id: RunId,
    pub source_file: Utf8PathBuf,
    pub name: String,
    pub recorded_at: Option<NaiveDateTime>,
    pub duration_s: f64,
    pub sample_count: usize,
    pub sample_rate_hz: f64,
    pub has_gps: bool,
    pub has_imu: bool,
    pub has_speed: bool,
    /// Version tag of the canonical representation.
    pub version: String,
}

/// Geodetic origin of the run's ENU frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginConfig {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    /// True iff at least one origin component was supplied by the caller.
    pub manual_override: bool,
}

impl OriginConfig {
    pub fn from_geodetic(origin: GeodeticOrigin, manual_override: bool) -> Self {
        OriginConfig {
            lat: origin.lat,
            lon: origin.lon,
            alt: origin.alt,
            manual_override,
        }
    }

    pub fn as_geodetic(&self) -> GeodeticOrigin {
        GeodeticOrigin::new(self.lat, self.lon, self.alt)
    }
}

/// A canonical telemetry run.
///
/// Invalid samples of `speed`, `heading`, `yaw_rate`, `ax_body`, `ay_body` and `total_g`
/// hold `NaN`; always consult the validity mask rather than testing values.
#[derive(Debug, Clone)]
pub struct TelemetryRun {
    pub(crate) metadata: RunMetadata,
    pub(crate) origin: OriginConfig,
    pub(crate) timestamps: Vec<f64>,
    pub(crate) x: Vec<f64>,
    pub(crate) y: Vec<f64>,
    pub(crate) z: Vec<f64>,
    pub(crate) speed: Vec<f64>,
    pub(crate) heading: Vec<f64>,
    pub(crate) yaw_rate: Vec<f64>,
    pub(crate) ax_body: Vec<f64>,
    pub(crate) ay_body: Vec<f64>,
    pub(crate) total_g: Vec<f64>,
    pub(crate) gps_accuracy: Vec<f64>,
    pub(crate) gps_update: Vec<bool>,
    pub(crate) lap_number: Option<Vec<i32>>,
    pub(crate) validity: BTreeMap<Channel, Vec<bool>>,
    pub(crate) channel_info: BTreeMap<Channel, ChannelInfo>,
}

impl TelemetryRun {
    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn origin(&self) -> &OriginConfig {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Seconds from the first retained sample.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// East, meters.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// North, meters.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Up, meters.
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn speed(&self) -> &[f64] {
        &self.speed
    }

    pub fn heading(&self) -> &[f64] {
        &self.heading
    }

    pub fn yaw_rate(&self) -> &[f64] {
        &self.yaw_rate
    }

    pub fn ax_body(&self) -> &[f64] {
        &self.ax_body
    }

    pub fn ay_body(&self) -> &[f64] {
        &self.ay_body
    }

    /// Longitudinal acceleration (body x), g.
    pub fn longitudinal_g(&self) -> &[f64] {
        &self.ax_body
    }

    /// Lateral acceleration (body y), g.
    pub fn lateral_g(&self) -> &[f64] {
        &self.ay_body
    }

    pub fn total_g(&self) -> &[f64] {
        &self.total_g
    }

    pub fn gps_accuracy(&self) -> &[f64] {
        &self.gps_accuracy
    }

    pub fn gps_update(&self) -> &[bool] {
        &self.gps_update
    }

    pub fn lap_number(&self) -> Option<&[i32]> {
        self.lap_number.as_deref()
    }

    /// Values of a masked channel.
    pub fn values(&self, channel: Channel) -> &[f64] {
        match channel {
            Channel::X => &self.x,
            Channel::Y => &self.y,
            Channel::Speed => &self.speed,
            Channel::Heading => &self.heading,
            Channel::Ax => &self.ax_body,
            Channel::Ay => &self.ay_body,
            Channel::YawRate => &self.yaw_rate,
            Channel::TotalG => &self.total_g,
        }
    }

    /// Validity mask of `channel` (empty only for an empty run).
    pub fn validity(&self, channel: Channel) -> &[bool] {
        self.validity.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn validity_masks(&self) -> &BTreeMap<Channel, Vec<bool>> {
        &self.validity
    }

    pub fn channel_info(&self, channel: Channel) -> Option<&ChannelInfo> {
        self.channel_info.get(&channel)
    }

    pub fn channel_infos(&self) -> &BTreeMap<Channel, ChannelInfo> {
        &self.channel_info
    }

    /// True if `channel` is valid at sample `index`.
    pub fn is_valid(&self, channel: Channel, index: usize) -> bool {
        self.validity(channel).get(index).copied().unwrap_or(false)
    }
}
