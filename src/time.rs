use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{
    Second, DURATION_MS_THRESHOLD, EPOCH_MS_THRESHOLD, EPOCH_S_THRESHOLD, MS_PER_S,
};
use crate::raw::TimeUnit;
use crate::telemetry_errors::TelemetryError;

/// Parse a clock string `H:M:S` or `M:S` (fractional seconds allowed) into elapsed seconds.
///
/// Argument
/// --------
/// * `cell`: the trimmed cell content
///
/// Return
/// ------
/// * elapsed seconds, or `None` if the cell is not a two- or three-field clock string
pub fn parse_clock(cell: &str) -> Option<Second> {
    let parts: Vec<&str> = cell.split(':').collect();
    let fields: Vec<f64> = parts
        .iter()
        .map(|p| p.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<_>>>()?;

    match fields.as_slice() {
        [h, m, s] => Some(h * 3600.0 + m * 60.0 + s),
        [m, s] => Some(m * 60.0 + s),
        _ => None,
    }
}

/// Parse one time cell, either a clock string or a bare finite number.
///
/// Errors
/// ------
/// * [`TelemetryError::UnsupportedTimeFormat`] if the cell is neither
pub fn parse_time_cell(cell: &str) -> Result<f64, TelemetryError> {
    let cell = cell.trim();
    let parsed = if cell.contains(':') {
        parse_clock(cell)
    } else {
        cell.parse::<f64>().ok().filter(|v| v.is_finite())
    };
    parsed.ok_or_else(|| TelemetryError::UnsupportedTimeFormat(cell.to_string()))
}

/// Resolve the effective unit of a time column.
///
/// A declared unit wins. Otherwise the largest finite magnitude decides:
/// above 1e11 epoch milliseconds, 1e7–1e11 epoch seconds, 1e5–1e7 a millisecond
/// duration, anything else seconds.
///
/// Return
/// ------
/// * [`TimeUnit::Seconds`] or [`TimeUnit::Milliseconds`], never `Auto`
pub fn resolve_time_unit(values: &[f64], declared: TimeUnit) -> TimeUnit {
    match declared {
        TimeUnit::Seconds | TimeUnit::Milliseconds => declared,
        TimeUnit::Auto => {
            let max = values
                .iter()
                .filter(|v| v.is_finite())
                .fold(0.0_f64, |acc, v| acc.max(v.abs()));

            if max > EPOCH_MS_THRESHOLD {
                TimeUnit::Milliseconds
            } else if max > EPOCH_S_THRESHOLD {
                TimeUnit::Seconds
            } else if max > DURATION_MS_THRESHOLD {
                TimeUnit::Milliseconds
            } else {
                TimeUnit::Seconds
            }
        }
    }
}

/// Convert a time column to seconds and re-base it so the first sample is `0`.
///
/// Argument
/// --------
/// * `values`: raw time values
/// * `declared`: unit declared by the source, or [`TimeUnit::Auto`]
///
/// Return
/// ------
/// * timestamps in seconds from the first sample (empty input gives an empty vector)
pub fn normalize_timestamps(values: &[f64], declared: TimeUnit) -> Vec<Second> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };

    let divisor = match resolve_time_unit(values, declared) {
        TimeUnit::Milliseconds => MS_PER_S,
        _ => 1.0,
    };

    values.iter().map(|v| (v - first) / divisor).collect()
}

static RECORDED_AT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(\d{4})-(\d{2})-(\d{2})_(\d{2})(\d{2})(\d{2})",
        r"(\d{4})(\d{2})(\d{2})_(\d{2})(\d{2})(\d{2})",
        r"(\d{4})-(\d{2})-(\d{2})",
        r"(\d{4})(\d{2})(\d{2})",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Extract the recording date and time from a file stem.
///
/// Patterns are tried in order: `YYYY-MM-DD_HHMMSS`, `YYYYMMDD_HHMMSS`, `YYYY-MM-DD`,
/// `YYYYMMDD`. A match that is not a valid calendar date is skipped.
///
/// Argument
/// --------
/// * `stem`: file name without extension
///
/// Return
/// ------
/// * the recording instant (midnight for date-only patterns), or `None`
pub fn recorded_at_from_stem(stem: &str) -> Option<NaiveDateTime> {
    RECORDED_AT_PATTERNS.iter().find_map(|re| {
        let caps = re.captures(stem)?;
        let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

        let year = i32::try_from(field(1)?).ok()?;
        let date = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?;
        if caps.len() > 4 {
            date.and_hms_opt(field(4)?, field(5)?, field(6)?)
        } else {
            date.and_hms_opt(0, 0, 0)
        }
    })
}

#[cfg(test)]
mod time_test {
    use super::*;

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("01:02:03.5"), Some(3723.5));
        assert_eq!(parse_clock("2:30.25"), Some(150.25));
        assert_eq!(parse_clock("1:2:3:4"), None);
        assert_eq!(parse_clock("a:b"), None);
    }

    #[test]
    fn test_parse_time_cell() {
        assert_eq!(parse_time_cell(" 0.250 "), Ok(0.25));
        assert_eq!(parse_time_cell("00:01:00"), Ok(60.0));
        assert_eq!(
            parse_time_cell("noon"),
            Err(TelemetryError::UnsupportedTimeFormat("noon".into()))
        );
        assert!(parse_time_cell("").is_err());
        assert!(parse_time_cell("NaN").is_err());
    }

    #[test]
    fn test_resolve_time_unit_heuristics() {
        assert_eq!(
            resolve_time_unit(&[1.7e12, 1.7e12 + 100.0], TimeUnit::Auto),
            TimeUnit::Milliseconds
        );
        assert_eq!(
            resolve_time_unit(&[1.7e9, 1.7e9 + 1.0], TimeUnit::Auto),
            TimeUnit::Seconds
        );
        assert_eq!(
            resolve_time_unit(&[0.0, 250_000.0], TimeUnit::Auto),
            TimeUnit::Milliseconds
        );
        assert_eq!(
            resolve_time_unit(&[0.0, 90.0], TimeUnit::Auto),
            TimeUnit::Seconds
        );
        assert_eq!(
            resolve_time_unit(&[0.0, 90.0], TimeUnit::Milliseconds),
            TimeUnit::Milliseconds
        );
    }

    #[test]
    fn test_normalize_timestamps() {
        assert_eq!(
            normalize_timestamps(&[10.0, 10.5, 11.0], TimeUnit::Auto),
            vec![0.0, 0.5, 1.0]
        );
        assert_eq!(
            normalize_timestamps(&[1_700_000_000_000.0, 1_700_000_000_500.0], TimeUnit::Auto),
            vec![0.0, 0.5]
        );
        assert_eq!(
            normalize_timestamps(&[200.0, 300.0], TimeUnit::Milliseconds),
            vec![0.0, 0.1]
        );
        assert!(normalize_timestamps(&[], TimeUnit::Auto).is_empty());
    }

    #[test]
    fn test_recorded_at_from_stem() {
        let dt = recorded_at_from_stem("Log-2024-06-15_134502-autocross").unwrap();
        assert_eq!(dt.to_string(), "2024-06-15 13:45:02");

        let dt = recorded_at_from_stem("20230301_080000").unwrap();
        assert_eq!(dt.to_string(), "2023-03-01 08:00:00");

        let dt = recorded_at_from_stem("session_2022-11-05").unwrap();
        assert_eq!(dt.to_string(), "2022-11-05 00:00:00");

        assert_eq!(recorded_at_from_stem("test_run"), None);
        assert_eq!(recorded_at_from_stem("2024-13-45"), None);
    }
}
