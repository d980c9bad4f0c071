use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trailing rows (current one included) feeding `rolling_avg_10` and
/// `volume_sum_10`.
pub const WINDOW_SIZE: usize = 10;
/// Rows ahead used for `future_close_5`.
pub const LOOKAHEAD: usize = 5;
/// Shortest series that yields at least one row.
pub const MIN_SERIES_LEN: usize = WINDOW_SIZE + LOOKAHEAD;

/// Column order of the persisted feature table.
pub const FEATURE_TABLE_COLUMNS: [&str; 10] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "stock",
    "rolling_avg_10",
    "volume_sum_10",
    "target",
];

/// A bar for which both rolling features and the label are defined.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: f64,
    pub rolling_avg_10: f64,
    pub volume_sum_10: f64,
    pub future_close_5: f64,
    pub target: u8,
}

/// Why a bar produced no feature row. Variants are listed in the order they
/// are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExclusionReason {
    /// The bar's own `close` or `volume` is missing.
    MissingField,
    /// Fewer than `WINDOW_SIZE - 1` bars precede it.
    WindowEdge,
    /// Fewer than `LOOKAHEAD` bars follow it.
    LabelEdge,
    /// An earlier bar in the trailing window is missing `close` or `volume`.
    IncompleteWindow,
    /// The bar `LOOKAHEAD` rows ahead has no `close`.
    MissingFutureClose,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MissingField => "missing field",
            Self::WindowEdge => "window edge",
            Self::LabelEdge => "label edge",
            Self::IncompleteWindow => "incomplete window",
            Self::MissingFutureClose => "missing future close",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    /// Position in the timestamp-sorted series.
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub reason: ExclusionReason,
}

/// Builder output for one instrument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub rows: Vec<FeatureRow>,
    pub exclusions: Vec<Exclusion>,
}

impl FeatureSet {
    pub fn exclusion_counts(&self) -> BTreeMap<ExclusionReason, usize> {
        let mut counts = BTreeMap::new();
        for exclusion in &self.exclusions {
            *counts.entry(exclusion.reason).or_insert(0) += 1;
        }
        counts
    }

    pub fn targets(&self) -> Vec<u8> {
        self.rows.iter().map(|row| row.target).collect()
    }
}

/// One row of the persisted table: a feature row tagged with its instrument.
/// Field order is the on-disk column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: f64,
    pub stock: String,
    pub rolling_avg_10: f64,
    pub volume_sum_10: f64,
    pub target: u8,
}

impl FeatureRecord {
    pub fn from_row(stock: &str, row: &FeatureRow) -> Self {
        Self {
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            stock: stock.to_string(),
            rolling_avg_10: row.rolling_avg_10,
            volume_sum_10: row.volume_sum_10,
            target: row.target,
        }
    }
}

/// Concatenated feature rows across instruments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub records: Vec<FeatureRecord>,
}

impl FeatureTable {
    pub fn new(records: Vec<FeatureRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn extend(&mut self, other: FeatureTable) {
        self.records.extend(other.records);
    }

    pub fn concat(tables: impl IntoIterator<Item = FeatureTable>) -> Self {
        let mut combined = Self::default();
        for table in tables {
            combined.extend(table);
        }
        combined
    }

    /// Distinct instrument ids in first-seen order.
    pub fn stocks(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.stock.as_str()) {
                seen.push(&record.stock);
            }
        }
        seen
    }
}
