//! # Tabular reading with dialect detection
//!
//! Logger exports are "CSV" only loosely: some prepend a comment block, some scatter
//! descriptive lines between a metadata preamble and the real data. [`CsvTable`] locates
//! the header line, skips the noise and hands the remaining rows to the `csv` crate.
//!
//! Dialects (tried in order)
//! -----------------
//! 1. [`Dialect::CommentedMetadata`] – the first line starts with `#`; the header is the
//!    first line that does not.
//! 2. [`Dialect::ScatteredMetadata`] – some later line's first field is a known time label
//!    (`timestamp`, `time`, `gps time`, `gps_time`, `gpstime`); that line is the header and
//!    data resumes at the next line whose first field is a bare number.
//! 3. [`Dialect::Plain`] – the first line is the header.
//!
//! Blank lines in the data region are skipped. Numeric cells that fail to parse are read
//! as `NaN`.
use camino::Utf8Path;
use csv::{ReaderBuilder, Trim};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::telemetry_errors::TelemetryError;

const BOM: char = '\u{feff}';

static TIME_LABELS: &[&str] = &["timestamp", "time", "gps time", "gps_time", "gpstime"];

static BARE_NUMBER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").ok());

fn is_bare_number(field: &str) -> bool {
    BARE_NUMBER.as_ref().is_some_and(|re| re.is_match(field))
}

/// Layout detected for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    CommentedMetadata,
    ScatteredMetadata,
    Plain,
}

/// Position of the header and of the first data line inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub dialect: Dialect,
    pub header_line: usize,
    pub data_start: usize,
}

/// A header row plus its data rows, all cells trimmed.
#[derive(Debug, Clone)]
pub struct CsvTable {
    dialect: Dialect,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn first_field(line: &str) -> &str {
    line.split(',').next().unwrap_or("").trim()
}

fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Locate the header and data region of a file.
///
/// Arguments
/// -----------------
/// * `lines`: the file content split into lines, BOM already removed.
///
/// Return
/// ----------
/// * The detected [`Layout`], or `None` if the file has no non-blank line.
pub fn detect_layout(lines: &[&str]) -> Option<Layout> {
    let first_line = lines.iter().position(|l| !l.trim().is_empty())?;

    if lines[first_line].trim_start().starts_with('#') {
        let header_line = lines
            .iter()
            .skip(first_line)
            .position(|l| !is_skippable(l))
            .map(|i| i + first_line)?;
        return Some(Layout {
            dialect: Dialect::CommentedMetadata,
            header_line,
            data_start: header_line + 1,
        });
    }

    let time_header = lines.iter().enumerate().find_map(|(i, line)| {
        if is_skippable(line) {
            return None;
        }
        let field = first_field(line).to_lowercase();
        TIME_LABELS.contains(&field.as_str()).then_some(i)
    });

    if let Some(header_line) = time_header.filter(|&i| i > first_line) {
        let data_start = lines
            .iter()
            .enumerate()
            .skip(header_line + 1)
            .find(|(_, line)| is_bare_number(first_field(line)))
            .map_or(header_line + 1, |(i, _)| i);
        return Some(Layout {
            dialect: Dialect::ScatteredMetadata,
            header_line,
            data_start,
        });
    }

    Some(Layout {
        dialect: Dialect::Plain,
        header_line: first_line,
        data_start: first_line + 1,
    })
}

impl CsvTable {
    /// Read and parse a file from disk.
    ///
    /// Errors
    /// ----------
    /// * [`TelemetryError::IoFailure`] if the file cannot be read.
    /// * [`TelemetryError::MalformedHeader`] if no header line exists or the `csv` reader fails.
    pub fn from_path(path: &Utf8Path) -> Result<Self, TelemetryError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_text(&text).map_err(|e| match e {
            TelemetryError::MalformedHeader(msg) => {
                TelemetryError::MalformedHeader(format!("{path}: {msg}"))
            }
            other => other,
        })
    }

    /// Parse in-memory CSV text.
    pub fn from_text(text: &str) -> Result<Self, TelemetryError> {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let lines: Vec<&str> = text.lines().collect();

        let layout = detect_layout(&lines)
            .ok_or_else(|| TelemetryError::MalformedHeader("empty file".into()))?;
        debug!(
            dialect = ?layout.dialect,
            header_line = layout.header_line,
            data_start = layout.data_start,
            "detected CSV layout"
        );

        let mut cleaned = String::with_capacity(text.len());
        cleaned.push_str(lines[layout.header_line]);
        cleaned.push('\n');
        for line in lines.iter().skip(layout.data_start) {
            if line.trim().is_empty() {
                continue;
            }
            cleaned.push_str(line);
            cleaned.push('\n');
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(cleaned.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| TelemetryError::MalformedHeader(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let rows = reader
            .records()
            .map(|record| {
                record
                    .map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
                    .map_err(|e| TelemetryError::MalformedHeader(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CsvTable {
            dialect: layout.dialect,
            headers,
            rows,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the header cell exactly equal to `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Position of the first header cell equal to `name` up to ASCII case.
    pub fn column_index_ignore_case(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Cells of column `index`, one per row; short rows yield an empty cell.
    pub fn cells(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).map_or("", String::as_str))
    }

    /// Column `index` coerced to numbers, unparseable cells become `NaN`.
    pub fn numeric_column(&self, index: usize) -> Vec<f64> {
        self.cells(index).map(parse_numeric).collect()
    }
}

/// Coerce a cell to a number, `NaN` when it does not parse.
pub fn parse_numeric(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(f64::NAN)
}
