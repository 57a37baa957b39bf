//! # Canonicalizer
//!
//! Turns a [`RawTelemetry`] into a [`TelemetryRun`]: fixed units, fixed frames, per-sample
//! validity and provenance for every channel.
//!
//! Pipeline
//! -----------------
//! 1. **Time** – order rows by time, resolve the unit, convert to seconds, re-base to `0`.
//! 2. **Position** – GPS validity (finite lat/lon), geodetic → local ENU.
//! 3. **Speed** – measured (unit-converted) or derived from ENU finite differences.
//! 4. **Heading** – measured (wrapped into `[0, 360)`) or derived from the ENU track.
//! 5. **Acceleration** – valid iff finite and `|a| ≤ max_abs_g`.
//! 6. **Yaw rate** – rad/s → deg/s when declared.
//! 7. **Total G** – `hypot(ax, ay)`, valid where both components are.
//! 8. **Idle trim** – drop samples before total G first reaches the launch threshold.
//! 9. **Start anchoring** – shift `x`/`y` so the first valid position is `(0, 0)`.
//! 10. **Flags & metadata** – availability flags, duration, rate, identity.
//!
//! No stage fails: missing channels and numeric degeneracies end up as `NaN` behind a
//! `false` validity bit, and an empty input yields an empty run.
//!
//! Configuration
//! -----------------
//! [`CanonicalizeParams`] controls the launch threshold, the anchoring and the G ceiling.
//! Build a validated value with [`CanonicalizeParams::builder`].
use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use tracing::debug;

use crate::constants::{
    CANONICAL_VERSION, DEFAULT_LAUNCH_THRESHOLD_G, KPH_TO_MS, MAX_ABS_G, MIN_RATE_DURATION,
    MPH_TO_MS,
};
use crate::coordinates::{gps_to_enu, heading_from_positions, wrap_360, GeodeticOrigin, OriginOverride};
use crate::raw::{RawTelemetry, SpeedUnit, YawRateUnit};
use crate::run::{
    Channel, ChannelInfo, OriginConfig, Provenance, ReferenceFrame, RunMetadata, TelemetryRun,
};
use crate::telemetry_errors::TelemetryError;
use crate::time::normalize_timestamps;

/// Parameters of the canonicalization pipeline.
///
/// Defaults
/// -----------------
/// * `launch_threshold_g`: 0.25 g (idle trim disabled when `≤ 0`)
/// * `anchor_start`: `true`
/// * `max_abs_g`: 4.5 g
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalizeParams {
    /// Total-G level marking the end of the idle lead-in.
    pub launch_threshold_g: f64,
    /// Move the first valid position to `(0, 0)`.
    pub anchor_start: bool,
    /// Sanity ceiling on `|ax|` and `|ay|`.
    pub max_abs_g: f64,
}

impl CanonicalizeParams {
    /// Equivalent to [`CanonicalizeParams::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent builder with validation.
    ///
    /// ```rust
    /// use telecanon::canonicalizer::CanonicalizeParams;
    ///
    /// let params = CanonicalizeParams::builder()
    ///     .launch_threshold_g(0.0)
    ///     .anchor_start(false)
    ///     .build()
    ///     .unwrap();
    /// assert!(!params.anchor_start);
    /// ```
    pub fn builder() -> CanonicalizeParamsBuilder {
        CanonicalizeParamsBuilder::new()
    }

    /// True when the idle trim runs.
    pub fn trims_idle(&self) -> bool {
        self.launch_threshold_g > 0.0
    }
}

impl Default for CanonicalizeParams {
    fn default() -> Self {
        CanonicalizeParams {
            launch_threshold_g: DEFAULT_LAUNCH_THRESHOLD_G,
            anchor_start: true,
            max_abs_g: MAX_ABS_G,
        }
    }
}

impl fmt::Display for CanonicalizeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "launch threshold: {} g, anchor start: {}, max |a|: {} g",
            self.launch_threshold_g, self.anchor_start, self.max_abs_g
        )
    }
}

/// Builder for [`CanonicalizeParams`].
#[derive(Debug, Clone)]
pub struct CanonicalizeParamsBuilder {
    params: CanonicalizeParams,
}

impl Default for CanonicalizeParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalizeParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: CanonicalizeParams::default(),
        }
    }

    pub fn launch_threshold_g(mut self, v: f64) -> Self {
        self.params.launch_threshold_g = v;
        self
    }

    pub fn anchor_start(mut self, v: bool) -> Self {
        self.params.anchor_start = v;
        self
    }

    pub fn max_abs_g(mut self, v: f64) -> Self {
        self.params.max_abs_g = v;
        self
    }

    /// Validate and produce the parameters.
    ///
    /// Validation rules
    /// -----------------
    /// * `max_abs_g` finite and `> 0`.
    /// * `launch_threshold_g` not `NaN`.
    ///
    /// Returns
    /// -----------------
    /// * [`TelemetryError::InvalidParameter`] on the first failing rule.
    pub fn build(self) -> Result<CanonicalizeParams, TelemetryError> {
        let p = &self.params;
        if !(p.max_abs_g.is_finite() && p.max_abs_g > 0.0) {
            return Err(TelemetryError::InvalidParameter(format!(
                "max_abs_g must be finite and > 0, got {}",
                p.max_abs_g
            )));
        }
        if p.launch_threshold_g.is_nan() {
            return Err(TelemetryError::InvalidParameter(
                "launch_threshold_g must not be NaN".into(),
            ));
        }
        Ok(self.params)
    }
}

/// Canonicalize with default [`CanonicalizeParams`].
pub fn canonicalize_raw(raw: RawTelemetry, origin: &OriginOverride) -> TelemetryRun {
    canonicalize_raw_with_params(raw, origin, &CanonicalizeParams::default())
}

/// Resize a channel to `n` samples, padding with `NaN`; an absent channel is all `NaN`.
fn fit(values: Option<Vec<f64>>, n: usize) -> Vec<f64> {
    let mut values = values.unwrap_or_default();
    values.resize(n, f64::NAN);
    values
}

fn any_present(values: &[f64]) -> bool {
    values.iter().any(|v| !v.is_nan())
}

fn mask_invalid(values: &mut [f64], valid: &[bool]) {
    for (v, ok) in values.iter_mut().zip(valid) {
        if !ok {
            *v = f64::NAN;
        }
    }
}

/// Speed from ENU finite differences; non-positive time steps give `NaN`.
fn derive_speed(timestamps: &[f64], x: &[f64], y: &[f64]) -> Vec<f64> {
    let steps = timestamps
        .iter()
        .zip(x.iter().zip(y))
        .tuple_windows()
        .map(|((t0, (x0, y0)), (t1, (x1, y1)))| {
            let dt = t1 - t0;
            if dt <= 0.0 {
                f64::NAN
            } else {
                (x1 - x0).hypot(y1 - y0) / dt
            }
        });

    let mut speed: Vec<f64> = std::iter::once(f64::NAN).chain(steps).collect();
    speed.truncate(timestamps.len());
    if speed.len() > 1 {
        speed[0] = speed[1];
    }
    speed
}

/// Gather `values` in `order`, padding indices past the end with `fill`.
fn permute<T: Clone>(values: &[T], order: &[usize], fill: T) -> Vec<T> {
    order
        .iter()
        .map(|&i| values.get(i).cloned().unwrap_or_else(|| fill.clone()))
        .collect()
}

/// Stable-sort every per-sample array of `raw` by timestamp.
///
/// Rows logged out of order would otherwise re-base to negative, decreasing times.
/// Already sorted input is returned untouched.
fn sort_by_time(mut raw: RawTelemetry) -> RawTelemetry {
    let ts = &raw.timestamps;
    if ts.windows(2).all(|w| w[0] <= w[1]) {
        return raw;
    }

    let order: Vec<usize> = (0..ts.len())
        .sorted_by(|&a, &b| ts[a].total_cmp(&ts[b]))
        .collect();
    debug!(source_file = %raw.source_file, "rows out of time order, sorted");

    let nan = f64::NAN;
    raw.timestamps = permute(&raw.timestamps, &order, nan);
    raw.latitude = permute(&raw.latitude, &order, nan);
    raw.longitude = permute(&raw.longitude, &order, nan);
    raw.altitude = permute(&raw.altitude, &order, nan);
    raw.speed = permute(&raw.speed, &order, nan);
    for channel in [
        &mut raw.accel_x,
        &mut raw.accel_y,
        &mut raw.yaw_rate,
        &mut raw.heading,
        &mut raw.gps_accuracy,
    ] {
        if let Some(values) = channel.as_mut() {
            *values = permute(values, &order, nan);
        }
    }
    if let Some(flags) = raw.gps_update.as_mut() {
        *flags = permute(flags, &order, true);
    }
    if let Some(laps) = raw.lap_number.as_mut() {
        *laps = permute(laps, &order, 0);
    }
    raw
}

/// Per-sample arrays sliced together by the idle trim.
struct Columns {
    timestamps: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    speed: Vec<f64>,
    heading: Vec<f64>,
    yaw_rate: Vec<f64>,
    ax: Vec<f64>,
    ay: Vec<f64>,
    total_g: Vec<f64>,
    gps_accuracy: Vec<f64>,
    gps_update: Vec<bool>,
    lap_number: Option<Vec<i32>>,
    validity: BTreeMap<Channel, Vec<bool>>,
}

impl Columns {
    /// Drop the first `k` samples of every array and re-base time to `0`.
    fn drop_leading(&mut self, k: usize) {
        for values in [
            &mut self.timestamps,
            &mut self.x,
            &mut self.y,
            &mut self.z,
            &mut self.speed,
            &mut self.heading,
            &mut self.yaw_rate,
            &mut self.ax,
            &mut self.ay,
            &mut self.total_g,
            &mut self.gps_accuracy,
        ] {
            values.drain(..k);
        }
        self.gps_update.drain(..k);
        if let Some(laps) = self.lap_number.as_mut() {
            laps.drain(..k);
        }
        for mask in self.validity.values_mut() {
            mask.drain(..k);
        }

        if let Some(&t0) = self.timestamps.first() {
            for t in self.timestamps.iter_mut() {
                *t -= t0;
            }
        }
    }

    fn mask(&self, channel: Channel) -> &[bool] {
        self.validity.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }

    fn any_valid(&self, channel: Channel) -> bool {
        self.mask(channel).iter().any(|v| *v)
    }
}

/// Canonicalize a raw value.
///
/// Arguments
/// -----------------
/// * `raw`: adapter output, consumed.
/// * `origin`: optional origin components; `None` components are detected from the data.
///   Ignored when the file holds no valid fix, the run origin is then `(0, 0, 0)`.
/// * `params`: pipeline parameters.
///
/// Return
/// ----------
/// * The canonical run. This never fails.
///
/// See also
/// ------------
/// * [`crate::coordinates::gps_to_enu`] – Position stage.
/// * [`TelemetryRun::sample_at_time`] – Querying the result.
pub fn canonicalize_raw_with_params(
    raw: RawTelemetry,
    origin: &OriginOverride,
    params: &CanonicalizeParams,
) -> TelemetryRun {
    let raw = sort_by_time(raw);
    let RawTelemetry {
        source,
        source_file,
        fingerprint,
        name,
        timestamps,
        time_unit,
        latitude,
        longitude,
        altitude,
        speed,
        speed_unit,
        accel_x,
        accel_y,
        yaw_rate,
        yaw_rate_unit,
        heading,
        gps_accuracy,
        gps_update,
        lap_number,
        recorded_at,
    } = raw;

    // Time
    let timestamps = normalize_timestamps(&timestamps, time_unit);
    let n = timestamps.len();

    // Position
    let latitude = fit(Some(latitude), n);
    let longitude = fit(Some(longitude), n);
    let mut altitude = fit(Some(altitude), n);
    if !any_present(&altitude) {
        altitude = vec![0.0; n];
    }

    let gps_valid: Vec<bool> = latitude
        .iter()
        .zip(&longitude)
        .map(|(la, lo)| la.is_finite() && lo.is_finite())
        .collect();

    let has_fix = gps_valid.iter().any(|v| *v);
    // without a single fix the override has nothing to anchor and is ignored
    let manual_origin = has_fix && origin.is_manual();
    let (x, y, z, effective_origin) = if has_fix {
        let track = gps_to_enu(&latitude, &longitude, Some(&altitude), origin);
        (track.east, track.north, track.up, track.origin)
    } else {
        (
            vec![f64::NAN; n],
            vec![f64::NAN; n],
            vec![f64::NAN; n],
            GeodeticOrigin::new(0.0, 0.0, 0.0),
        )
    };

    // Speed
    let measured_speed = fit(Some(speed), n);
    let (mut speed, speed_provenance) = if any_present(&measured_speed) {
        let factor = match speed_unit {
            Some(SpeedUnit::Mph) => MPH_TO_MS,
            Some(SpeedUnit::Kph) => KPH_TO_MS,
            Some(SpeedUnit::MetersPerSecond) | None => 1.0,
        };
        (
            measured_speed.iter().map(|v| v * factor).collect::<Vec<_>>(),
            Provenance::Measured,
        )
    } else {
        (derive_speed(&timestamps, &x, &y), Provenance::Derived)
    };
    let valid_speed: Vec<bool> = speed.iter().map(|v| v.is_finite() && *v >= 0.0).collect();
    mask_invalid(&mut speed, &valid_speed);

    // Heading
    let measured_heading = fit(heading, n);
    let (mut heading, heading_provenance) = if any_present(&measured_heading) {
        (
            measured_heading.iter().map(|h| wrap_360(*h)).collect::<Vec<_>>(),
            Provenance::Measured,
        )
    } else {
        (heading_from_positions(&x, &y), Provenance::Derived)
    };
    let valid_heading: Vec<bool> = heading.iter().map(|h| h.is_finite()).collect();
    mask_invalid(&mut heading, &valid_heading);

    // Acceleration
    let mut ax = fit(accel_x, n);
    let mut ay = fit(accel_y, n);
    let accel_provenance = if any_present(&ax) || any_present(&ay) {
        Provenance::Measured
    } else {
        Provenance::Derived
    };
    let g_valid = |v: &f64| v.is_finite() && v.abs() <= params.max_abs_g;
    let valid_ax: Vec<bool> = ax.iter().map(g_valid).collect();
    let valid_ay: Vec<bool> = ay.iter().map(g_valid).collect();
    mask_invalid(&mut ax, &valid_ax);
    mask_invalid(&mut ay, &valid_ay);

    // Yaw rate
    let mut yaw_rate = fit(yaw_rate, n);
    if yaw_rate_unit == Some(YawRateUnit::RadPerSec) {
        yaw_rate.iter_mut().for_each(|v| *v = v.to_degrees());
    }
    // nothing derives a yaw rate, yet an absent channel is still tagged DERIVED
    let yaw_provenance = if any_present(&yaw_rate) {
        Provenance::Measured
    } else {
        Provenance::Derived
    };
    let valid_yaw: Vec<bool> = yaw_rate.iter().map(|v| v.is_finite()).collect();
    mask_invalid(&mut yaw_rate, &valid_yaw);

    // Total G
    let valid_total: Vec<bool> = valid_ax.iter().zip(&valid_ay).map(|(a, b)| *a && *b).collect();
    let total_g: Vec<f64> = ax
        .iter()
        .zip(&ay)
        .zip(&valid_total)
        .map(|((a, b), ok)| if *ok { a.hypot(*b) } else { f64::NAN })
        .collect();

    let valid_x: Vec<bool> = gps_valid.iter().zip(&x).map(|(g, v)| *g && v.is_finite()).collect();
    let valid_y: Vec<bool> = gps_valid.iter().zip(&y).map(|(g, v)| *g && v.is_finite()).collect();

    let validity = BTreeMap::from([
        (Channel::X, valid_x),
        (Channel::Y, valid_y),
        (Channel::Speed, valid_speed),
        (Channel::Heading, valid_heading),
        (Channel::Ax, valid_ax),
        (Channel::Ay, valid_ay),
        (Channel::YawRate, valid_yaw),
        (Channel::TotalG, valid_total),
    ]);

    let mut gps_update = gps_update.unwrap_or_default();
    gps_update.resize(n, true);
    let lap_number = lap_number.map(|mut laps| {
        laps.resize(n, 0);
        laps
    });

    let mut columns = Columns {
        timestamps,
        x,
        y,
        z,
        speed,
        heading,
        yaw_rate,
        ax,
        ay,
        total_g,
        gps_accuracy: fit(gps_accuracy, n),
        gps_update,
        lap_number,
        validity,
    };

    // Idle trim
    if params.trims_idle() {
        let launch = columns
            .total_g
            .iter()
            .position(|g| g.is_finite() && *g >= params.launch_threshold_g);
        match launch {
            Some(k) if k > 0 => {
                debug!(%source_file, trimmed = k, "idle lead-in trimmed");
                columns.drop_leading(k);
            }
            Some(_) => {}
            None => debug!(%source_file, "launch threshold never reached, no trim"),
        }
    }

    // Start anchoring
    if params.anchor_start {
        let first_valid = columns
            .mask(Channel::X)
            .iter()
            .zip(columns.mask(Channel::Y))
            .position(|(vx, vy)| *vx && *vy);
        if let Some(i) = first_valid {
            let (dx, dy) = (columns.x[i], columns.y[i]);
            columns.x.iter_mut().for_each(|v| *v -= dx);
            columns.y.iter_mut().for_each(|v| *v -= dy);
            debug!(%source_file, dx, dy, "start anchored");
        }
    }

    // Flags & metadata
    let has_gps = columns
        .mask(Channel::X)
        .iter()
        .zip(columns.mask(Channel::Y))
        .any(|(vx, vy)| *vx && *vy);
    let has_imu = columns.any_valid(Channel::Ax)
        || columns.any_valid(Channel::Ay)
        || columns.any_valid(Channel::YawRate);
    let has_speed = columns.any_valid(Channel::Speed);

    let sample_count = columns.timestamps.len();
    let duration_s = match (columns.timestamps.first(), columns.timestamps.last()) {
        (Some(first), Some(last)) if sample_count > 1 => last - first,
        _ => 0.0,
    };
    let sample_rate_hz = sample_count as f64 / duration_s.max(MIN_RATE_DURATION);

    let channel_info = channel_table(
        speed_provenance,
        heading_provenance,
        accel_provenance,
        yaw_provenance,
    );

    let metadata = RunMetadata {
        id: fingerprint.run_id(),
        source_file,
        name,
        recorded_at,
        duration_s,
        sample_count,
        sample_rate_hz,
        has_gps,
        has_imu,
        has_speed,
        version: CANONICAL_VERSION.to_string(),
    };
    debug!(
        id = %metadata.id,
        source = %source,
        samples = sample_count,
        has_gps,
        has_imu,
        "canonicalized run"
    );

    TelemetryRun {
        metadata,
        origin: OriginConfig::from_geodetic(effective_origin, manual_origin),
        timestamps: columns.timestamps,
        x: columns.x,
        y: columns.y,
        z: columns.z,
        speed: columns.speed,
        heading: columns.heading,
        yaw_rate: columns.yaw_rate,
        ax_body: columns.ax,
        ay_body: columns.ay,
        total_g: columns.total_g,
        gps_accuracy: columns.gps_accuracy,
        gps_update: columns.gps_update,
        lap_number: columns.lap_number,
        validity: columns.validity,
        channel_info,
    }
}

fn channel_table(
    speed: Provenance,
    heading: Provenance,
    accel: Provenance,
    yaw_rate: Provenance,
) -> BTreeMap<Channel, ChannelInfo> {
    use ReferenceFrame::{Body, Global};

    BTreeMap::from([
        (Channel::X, ChannelInfo::new("m", Provenance::Derived, Some(Global))),
        (Channel::Y, ChannelInfo::new("m", Provenance::Derived, Some(Global))),
        (Channel::Speed, ChannelInfo::new("m/s", speed, None)),
        (Channel::Heading, ChannelInfo::new("deg", heading, None)),
        (Channel::Ax, ChannelInfo::new("g", accel, Some(Body))),
        (Channel::Ay, ChannelInfo::new("g", accel, Some(Body))),
        (Channel::YawRate, ChannelInfo::new("deg/s", yaw_rate, Some(Body))),
        (Channel::TotalG, ChannelInfo::new("g", Provenance::Derived, Some(Body))),
    ])
}
