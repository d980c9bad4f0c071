//! Header contract for raw minute-bar files.
//!
//! Headers are matched case-insensitively after trimming, so `DATETIME`,
//! `Close ` and `volume` all resolve. `timestamp`, `close` and `volume` are
//! required; `open`, `high` and `low` are carried through when present.

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;

use crate::error::DataIngestionError;
use crate::observation::Observation;

pub const REQUIRED_COLUMNS: [&str; 3] = ["timestamp", "close", "volume"];

const TIMESTAMP_ALIASES: [&str; 3] = ["timestamp", "datetime", "date"];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const MISSING_MARKERS: [&str; 3] = ["nan", "null", "na"];

/// Column positions resolved from a header record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub timestamp: usize,
    pub open: Option<usize>,
    pub high: Option<usize>,
    pub low: Option<usize>,
    pub close: usize,
    pub volume: usize,
}

impl ColumnMap {
    pub fn from_headers(headers: &StringRecord, origin: &str) -> Result<Self, DataIngestionError> {
        let find = |names: &[&str]| {
            headers.iter().position(|header| {
                let header = header.trim().to_ascii_lowercase();
                names.iter().any(|name| header == *name)
            })
        };
        let require = |names: &[&str], column: &'static str| {
            find(names).ok_or_else(|| DataIngestionError::MissingColumn {
                origin: origin.to_string(),
                column,
            })
        };

        let [timestamp, close, volume] = REQUIRED_COLUMNS;
        Ok(Self {
            timestamp: require(&TIMESTAMP_ALIASES, timestamp)?,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            close: require(&[close], close)?,
            volume: require(&[volume], volume)?,
        })
    }

    /// `record` is the 1-based data record number, used in error messages.
    pub fn parse_record(
        &self,
        row: &StringRecord,
        record: usize,
        origin: &str,
    ) -> Result<Observation, DataIngestionError> {
        let raw_ts = row.get(self.timestamp).unwrap_or_default();
        let timestamp =
            parse_timestamp(raw_ts).ok_or_else(|| DataIngestionError::InvalidTimestamp {
                origin: origin.to_string(),
                record,
                value: raw_ts.to_string(),
            })?;

        let number = |index: Option<usize>, column: &'static str| {
            let Some(raw) = index.and_then(|i| row.get(i)) else {
                return Ok(None);
            };
            parse_number(raw).map_err(|_| DataIngestionError::InvalidNumber {
                origin: origin.to_string(),
                record,
                column,
                value: raw.to_string(),
            })
        };

        Ok(Observation {
            timestamp,
            open: number(self.open, "open")?,
            high: number(self.high, "high")?,
            low: number(self.low, "low")?,
            close: number(Some(self.close), "close")?,
            volume: number(Some(self.volume), "volume")?,
        })
    }
}

/// Parses RFC 3339 or offset-qualified timestamps (converted to UTC) and
/// naive timestamps (taken as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Some(ts.with_timezone(&Utc));
        }
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Empty cells and NaN/null markers are missing values, not errors.
fn parse_number(raw: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let raw = raw.trim();
    if raw.is_empty() || MISSING_MARKERS.contains(&raw.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    let value: f64 = raw.parse()?;
    Ok((!value.is_nan()).then_some(value))
}
