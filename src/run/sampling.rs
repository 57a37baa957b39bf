//! # Time-based sampling of a canonical run
//!
//! Queries over a [`TelemetryRun`]: planar extent, time range, a validity-aware interpolated
//! [`Sample`] at any instant, and fixed-rate playback resampling.
//!
//! Interpolation rules
//! -----------------
//! Between the bracketing samples `i-1` and `i`, with `α = (t − tᵢ₋₁) / (tᵢ − tᵢ₋₁)`:
//!
//! * both endpoints valid → linear blend, valid;
//! * exactly one valid → that endpoint's value, valid (no extrapolation);
//! * neither valid → `NaN`, invalid.
//!
//! Heading is blended along the shortest arc and wrapped into `[0, 360)`. Total G is
//! recomputed from the interpolated `ax`/`ay` and is valid only when both are.
use serde::{Deserialize, Serialize};

use super::{Channel, TelemetryRun};
use crate::constants::{Degree, Second};
use crate::coordinates::wrap_360;
use crate::telemetry_errors::TelemetryError;

/// Planar extent of the valid positions of a run, meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Collapse an optional box into the all-zero box used when no position is valid.
    pub fn or_zero(bbox: Option<BoundingBox>) -> BoundingBox {
        bbox.unwrap_or_default()
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Per-channel validity of a [`Sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SampleValidity {
    pub x: bool,
    pub y: bool,
    pub speed: bool,
    pub heading: bool,
    pub ax: bool,
    pub ay: bool,
    pub yaw_rate: bool,
    pub total_g: bool,
}

impl SampleValidity {
    pub fn get(&self, channel: Channel) -> bool {
        match channel {
            Channel::X => self.x,
            Channel::Y => self.y,
            Channel::Speed => self.speed,
            Channel::Heading => self.heading,
            Channel::Ax => self.ax,
            Channel::Ay => self.ay,
            Channel::YawRate => self.yaw_rate,
            Channel::TotalG => self.total_g,
        }
    }
}

/// State of a run at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: Second,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub heading: Degree,
    pub ax: f64,
    pub ay: f64,
    pub yaw_rate: f64,
    pub total_g: f64,
    pub valid: SampleValidity,
}

impl Sample {
    /// Sample of a run without data: every value `NaN`, every channel invalid.
    pub fn empty() -> Self {
        Sample {
            time: 0.0,
            x: f64::NAN,
            y: f64::NAN,
            speed: f64::NAN,
            heading: f64::NAN,
            ax: f64::NAN,
            ay: f64::NAN,
            yaw_rate: f64::NAN,
            total_g: f64::NAN,
            valid: SampleValidity::default(),
        }
    }
}

/// Linear blend honoring validity.
fn blend(a: f64, valid_a: bool, b: f64, valid_b: bool, alpha: f64) -> (f64, bool) {
    match (valid_a, valid_b) {
        (true, true) => (a + alpha * (b - a), true),
        (true, false) => (a, true),
        (false, true) => (b, true),
        (false, false) => (f64::NAN, false),
    }
}

/// Shortest-arc blend of two headings, result in `[0, 360)`.
fn blend_heading(a: Degree, valid_a: bool, b: Degree, valid_b: bool, alpha: f64) -> (Degree, bool) {
    match (valid_a, valid_b) {
        (true, true) => {
            let mut diff = (b - a).rem_euclid(360.0);
            if diff > 180.0 {
                diff -= 360.0;
            }
            (wrap_360(a + alpha * diff), true)
        }
        _ => blend(a, valid_a, b, valid_b, alpha),
    }
}

fn total_g_of(ax: f64, ay: f64, valid_ax: bool, valid_ay: bool) -> (f64, bool) {
    if valid_ax && valid_ay {
        (ax.hypot(ay), true)
    } else {
        (f64::NAN, false)
    }
}

impl TelemetryRun {
    /// Extent of the samples where both `x` and `y` are valid.
    ///
    /// Return
    /// ----------
    /// * `None` when no sample has a valid position. Use [`BoundingBox::or_zero`] where an
    ///   all-zero box is expected instead.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let valid_x = self.validity(Channel::X);
        let valid_y = self.validity(Channel::Y);

        self.x
            .iter()
            .zip(&self.y)
            .zip(valid_x.iter().zip(valid_y))
            .filter(|(_, (vx, vy))| **vx && **vy)
            .map(|((x, y), _)| (*x, *y))
            .fold(None, |acc: Option<BoundingBox>, (x, y)| {
                Some(match acc {
                    None => BoundingBox {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                    },
                    Some(b) => BoundingBox {
                        min_x: b.min_x.min(x),
                        min_y: b.min_y.min(y),
                        max_x: b.max_x.max(x),
                        max_y: b.max_y.max(y),
                    },
                })
            })
    }

    /// First and last timestamps, `(0, 0)` for an empty run.
    pub fn time_range(&self) -> (Second, Second) {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => (0.0, 0.0),
        }
    }

    /// The stored sample at `index`, unmodified.
    ///
    /// Return
    /// ----------
    /// * `None` if `index` is out of range.
    pub fn sample_at_index(&self, index: usize) -> Option<Sample> {
        let time = *self.timestamps.get(index)?;
        let valid_at = |channel: Channel| self.is_valid(channel, index);

        let valid_ax = valid_at(Channel::Ax);
        let valid_ay = valid_at(Channel::Ay);
        let valid_total = valid_ax && valid_ay;

        Some(Sample {
            time,
            x: self.x[index],
            y: self.y[index],
            speed: self.speed[index],
            heading: self.heading[index],
            ax: self.ax_body[index],
            ay: self.ay_body[index],
            yaw_rate: self.yaw_rate[index],
            total_g: if valid_total {
                self.total_g[index]
            } else {
                f64::NAN
            },
            valid: SampleValidity {
                x: valid_at(Channel::X),
                y: valid_at(Channel::Y),
                speed: valid_at(Channel::Speed),
                heading: valid_at(Channel::Heading),
                ax: valid_ax,
                ay: valid_ay,
                yaw_rate: valid_at(Channel::YawRate),
                total_g: valid_total,
            },
        })
    }

    /// Interpolated state of the run at time `t`.
    ///
    /// Arguments
    /// -----------------
    /// * `t`: seconds from the start of the run.
    ///
    /// Return
    /// ----------
    /// * The first sample verbatim when `t` is at or before the first timestamp, the last
    ///   sample verbatim when `t` is at or after the last, an interpolated sample otherwise.
    ///   An empty run yields [`Sample::empty`].
    pub fn sample_at_time(&self, t: Second) -> Sample {
        let n = self.timestamps.len();
        let (Some(&first), Some(&last)) = (self.timestamps.first(), self.timestamps.last()) else {
            return Sample::empty();
        };

        // NaN lands here too
        if !(t > first) {
            return self.sample_at_index(0).unwrap_or_else(Sample::empty);
        }
        if t >= last {
            return self.sample_at_index(n - 1).unwrap_or_else(Sample::empty);
        }

        let hi = self.timestamps.partition_point(|&v| v < t);
        let lo = hi - 1;
        let (t0, t1) = (self.timestamps[lo], self.timestamps[hi]);
        let alpha = if t1 != t0 { (t - t0) / (t1 - t0) } else { 0.0 };

        let lerp = |values: &[f64], channel: Channel| {
            blend(
                values[lo],
                self.is_valid(channel, lo),
                values[hi],
                self.is_valid(channel, hi),
                alpha,
            )
        };

        let (x, valid_x) = lerp(&self.x, Channel::X);
        let (y, valid_y) = lerp(&self.y, Channel::Y);
        let (speed, valid_speed) = lerp(&self.speed, Channel::Speed);
        let (ax, valid_ax) = lerp(&self.ax_body, Channel::Ax);
        let (ay, valid_ay) = lerp(&self.ay_body, Channel::Ay);
        let (yaw_rate, valid_yaw) = lerp(&self.yaw_rate, Channel::YawRate);
        let (heading, valid_heading) = blend_heading(
            self.heading[lo],
            self.is_valid(Channel::Heading, lo),
            self.heading[hi],
            self.is_valid(Channel::Heading, hi),
            alpha,
        );
        let (total_g, valid_total) = total_g_of(ax, ay, valid_ax, valid_ay);

        Sample {
            time: t,
            x,
            y,
            speed,
            heading,
            ax,
            ay,
            yaw_rate,
            total_g,
            valid: SampleValidity {
                x: valid_x,
                y: valid_y,
                speed: valid_speed,
                heading: valid_heading,
                ax: valid_ax,
                ay: valid_ay,
                yaw_rate: valid_yaw,
                total_g: valid_total,
            },
        }
    }

    /// Resample a time window at a fixed rate for playback.
    ///
    /// The window is clamped to [`time_range`](Self::time_range). With
    /// `d = end − start`, `floor(d · rate) + 1` instants are spread evenly over the window,
    /// both ends included, and each is sampled with [`sample_at_time`](Self::sample_at_time).
    ///
    /// Arguments
    /// -----------------
    /// * `start`: window start, seconds.
    /// * `end`: window end, seconds; `None` for the end of the run.
    /// * `target_rate_hz`: output rate, within `[1, 100]` Hz.
    ///
    /// Return
    /// ----------
    /// * The resampled frames, or [`TelemetryError::InvalidParameter`] when the rate is out of
    ///   range or the clamped window is empty or inverted.
    pub fn playback(
        &self,
        start: Second,
        end: Option<Second>,
        target_rate_hz: f64,
    ) -> Result<Vec<Sample>, TelemetryError> {
        if !(1.0..=100.0).contains(&target_rate_hz) {
            return Err(TelemetryError::InvalidParameter(format!(
                "playback rate must be within [1, 100] Hz, got {target_rate_hz}"
            )));
        }

        let (run_start, run_end) = self.time_range();
        let start = start.max(run_start);
        let end = end.map_or(run_end, |e| e.min(run_end));
        if !(start < end) {
            return Err(TelemetryError::InvalidParameter(format!(
                "invalid playback window [{start}, {end}]"
            )));
        }

        let duration = end - start;
        let count = (duration * target_rate_hz).floor() as usize + 1;
        let step = if count > 1 {
            duration / (count - 1) as f64
        } else {
            0.0
        };

        Ok((0..count)
            .map(|i| {
                let t = if i + 1 == count {
                    end
                } else {
                    start + step * i as f64
                };
                self.sample_at_time(t)
            })
            .collect())
    }
}
