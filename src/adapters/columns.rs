//! # Column alias table
//!
//! Loggers name the same quantity in many ways (`Latitude`, `lat`, `LAT`, …). This module
//! holds a **static, declarative** mapping from each source channel to the ordered list of
//! header spellings accepted for it, and resolves a header row against that table.
//!
//! Resolution rules
//! -----------------
//! * Aliases are scanned in declared order; the first spelling present in the header wins.
//! * Matching is an **exact, case-sensitive** comparison against whitespace-trimmed header
//!   cells (the BOM is already stripped by [`CsvTable`](crate::adapters::csv_table::CsvTable)).
//! * A channel with no matching header is simply unresolved, never an error.
use std::collections::BTreeMap;

/// Channels an adapter may look for in a source header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceChannel {
    Time,
    Latitude,
    Longitude,
    Altitude,
    GpsUpdate,
    GpsAccuracy,
    SpeedMph,
    SpeedKph,
    SpeedMs,
    /// Longitudinal acceleration.
    AccelX,
    /// Lateral acceleration.
    AccelY,
    YawRate,
    Heading,
    Lap,
}

/// Canonical channel → accepted header spellings, in priority order.
pub static COLUMN_ALIASES: &[(SourceChannel, &[&str])] = &[
    (
        SourceChannel::Time,
        &["Time", "time", "TIME", "GPS Time", "gps_time", "Timestamp", "timestamp"],
    ),
    (
        SourceChannel::Latitude,
        &["Latitude", "latitude", "LATITUDE", "Lat", "lat", "LAT"],
    ),
    (
        SourceChannel::Longitude,
        &["Longitude", "longitude", "LONGITUDE", "Lon", "lon", "LON", "Long", "long"],
    ),
    (
        SourceChannel::Altitude,
        &["Altitude", "altitude", "ALTITUDE", "Alt", "alt", "Elevation", "elevation"],
    ),
    (
        SourceChannel::GpsUpdate,
        &["GPS_Update", "gps_update", "GPS Update", "GPSUpdate"],
    ),
    (
        SourceChannel::GpsAccuracy,
        &["Accuracy", "accuracy", "GPS_Accuracy", "gps_accuracy"],
    ),
    (
        SourceChannel::SpeedMph,
        &["MPH", "mph", "Speed (MPH)", "speed_mph"],
    ),
    (
        SourceChannel::SpeedKph,
        &["KPH", "kph", "Speed (KPH)", "speed_kph", "Speed (km/h)"],
    ),
    (
        SourceChannel::SpeedMs,
        &["Speed (m/s)", "speed_ms", "Speed", "speed"],
    ),
    (
        SourceChannel::AccelX,
        &[
            "Accel_X",
            "accel_x",
            "AccelX",
            "Accelerometer X",
            "X",
            // RaceChrono
            "longitudinal_acc",
            "x_acc",
        ],
    ),
    (
        SourceChannel::AccelY,
        &[
            "Accel_Y",
            "accel_y",
            "AccelY",
            "Accelerometer Y",
            "Y",
            // RaceChrono
            "lateral_acc",
            "y_acc",
        ],
    ),
    (
        SourceChannel::YawRate,
        &[
            "YawRate",
            "Yaw Rate",
            "yaw_rate",
            "GyroZ",
            "Gyro Z",
            "Gyro Z (deg/s)",
            "Gyro Z (rad/s)",
            // RaceChrono
            "z_rate_of_rotation",
        ],
    ),
    (
        SourceChannel::Heading,
        &["Heading", "heading", "HEADING", "Bearing", "bearing"],
    ),
    (
        SourceChannel::Lap,
        &["Lap", "lap", "LAP", "Lap Number", "lap_number"],
    ),
];

impl SourceChannel {
    /// Accepted header spellings for this channel, in priority order.
    pub fn aliases(self) -> &'static [&'static str] {
        COLUMN_ALIASES
            .iter()
            .find(|(channel, _)| *channel == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }
}

/// A resolved header column: its position in the row and the spelling that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub index: usize,
    pub header: String,
}

/// Mapping from source channels to the header columns that carry them.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    resolved: BTreeMap<SourceChannel, ResolvedColumn>,
}

impl ColumnMap {
    /// Resolve every channel of [`COLUMN_ALIASES`] against a header row.
    ///
    /// Arguments
    /// -----------------
    /// * `headers`: header cells, in file order.
    ///
    /// Return
    /// ----------
    /// * A [`ColumnMap`] holding, for each channel, the first alias present in `headers`.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let trimmed: Vec<&str> = headers.iter().map(|h| h.as_ref().trim()).collect();

        let resolved = COLUMN_ALIASES
            .iter()
            .filter_map(|(channel, aliases)| {
                aliases.iter().find_map(|alias| {
                    trimmed
                        .iter()
                        .position(|h| h == alias)
                        .map(|index| {
                            (
                                *channel,
                                ResolvedColumn {
                                    index,
                                    header: (*alias).to_string(),
                                },
                            )
                        })
                })
            })
            .collect();

        ColumnMap { resolved }
    }

    pub fn get(&self, channel: SourceChannel) -> Option<&ResolvedColumn> {
        self.resolved.get(&channel)
    }

    pub fn index(&self, channel: SourceChannel) -> Option<usize> {
        self.get(channel).map(|c| c.index)
    }

    pub fn header(&self, channel: SourceChannel) -> Option<&str> {
        self.get(channel).map(|c| c.header.as_str())
    }

    pub fn contains(&self, channel: SourceChannel) -> bool {
        self.resolved.contains_key(&channel)
    }

    /// True if at least one of `channels` is resolved.
    pub fn contains_any(&self, channels: &[SourceChannel]) -> bool {
        channels.iter().any(|c| self.contains(*c))
    }
}
