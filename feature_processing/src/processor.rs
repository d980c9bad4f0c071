use std::collections::VecDeque;
use std::io::Read;

use data_ingestion::{Observation, read_observations};
use log::debug;

use crate::error::FeatureError;
use crate::types::{
    Exclusion, ExclusionReason, FeatureRow, FeatureSet, LOOKAHEAD, MIN_SERIES_LEN, WINDOW_SIZE,
};

/// Trailing `(close, volume)` window, at most `WINDOW_SIZE` bars long.
struct TrailingWindow {
    data: VecDeque<(Option<f64>, Option<f64>)>,
}

impl TrailingWindow {
    fn init() -> Self {
        Self {
            data: VecDeque::with_capacity(WINDOW_SIZE),
        }
    }

    fn insert(&mut self, bar: &Observation) {
        if self.data.len() == WINDOW_SIZE {
            self.data.pop_front();
        }
        self.data.push_back((bar.close, bar.volume));
    }

    fn is_full(&self) -> bool {
        self.data.len() == WINDOW_SIZE
    }

    /// Mean close and total volume, or `None` if any bar in the window has a gap.
    fn aggregate(&self) -> Option<(f64, f64)> {
        let mut close_sum = 0.0;
        let mut volume_sum = 0.0;
        for &(close, volume) in &self.data {
            close_sum += close?;
            volume_sum += volume?;
        }
        Some((close_sum / WINDOW_SIZE as f64, volume_sum))
    }
}

/// Computes `rolling_avg_10`, `volume_sum_10` and the 5-bar direction label
/// for one instrument.
///
/// Bars are stably sorted by timestamp first, so input order does not matter
/// except among equal timestamps, which keep their relative order. Windows
/// and lookahead count rows, not minutes. Every bar that yields no row is
/// listed in [`FeatureSet::exclusions`] with the first reason that applies.
///
/// With no gaps in the data a series of `n` bars yields `n - 14` rows
/// (none when `n < 15`).
pub fn build_features_and_target(series: &[Observation]) -> FeatureSet {
    let mut sorted: Vec<&Observation> = series.iter().collect();
    sorted.sort_by_key(|bar| bar.timestamp);

    let mut window = TrailingWindow::init();
    let mut set = FeatureSet {
        rows: Vec::with_capacity(sorted.len().saturating_sub(MIN_SERIES_LEN - 1)),
        exclusions: Vec::new(),
    };

    for (index, bar) in sorted.iter().enumerate() {
        window.insert(bar);
        match label_bar(&sorted, index, &window) {
            Ok(row) => set.rows.push(row),
            Err(reason) => set.exclusions.push(Exclusion {
                index,
                timestamp: bar.timestamp,
                reason,
            }),
        }
    }

    debug!(
        "Built {} feature rows from {} bars ({} excluded)",
        set.rows.len(),
        sorted.len(),
        set.exclusions.len()
    );
    set
}

fn label_bar(
    sorted: &[&Observation],
    index: usize,
    window: &TrailingWindow,
) -> Result<FeatureRow, ExclusionReason> {
    let bar = sorted[index];
    let (Some(close), Some(volume)) = (bar.close, bar.volume) else {
        return Err(ExclusionReason::MissingField);
    };
    if !window.is_full() {
        return Err(ExclusionReason::WindowEdge);
    }
    let Some(ahead) = sorted.get(index + LOOKAHEAD) else {
        return Err(ExclusionReason::LabelEdge);
    };
    let (rolling_avg_10, volume_sum_10) =
        window.aggregate().ok_or(ExclusionReason::IncompleteWindow)?;
    let future_close_5 = ahead.close.ok_or(ExclusionReason::MissingFutureClose)?;

    Ok(FeatureRow {
        timestamp: bar.timestamp,
        open: bar.open,
        high: bar.high,
        low: bar.low,
        close,
        volume,
        rolling_avg_10,
        volume_sum_10,
        future_close_5,
        target: u8::from(future_close_5 > close),
    })
}

/// Reads a headed CSV source and builds its features. A source without the
/// `timestamp`, `close` or `volume` column is rejected before any row is
/// computed.
pub fn build_from_csv_reader<R: Read>(reader: R, origin: &str) -> Result<FeatureSet, FeatureError> {
    let observations = read_observations(reader, origin)?;
    Ok(build_features_and_target(&observations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use data_ingestion::DataIngestionError;

    fn minute(i: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(i as i64)
    }

    fn series(closes: &[f64]) -> Vec<Observation> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Observation::new(minute(i), close, 1000.0))
            .collect()
    }

    fn rising_then(tail: &[f64]) -> Vec<f64> {
        let mut closes: Vec<f64> = (100..=110).map(f64::from).collect();
        closes.extend_from_slice(tail);
        closes
    }

    #[test]
    fn test_flat_tail_labels_down() {
        let set = build_features_and_target(&series(&rising_then(&[100.0; 5])));

        assert_eq!(set.rows.len(), 2);
        let first = &set.rows[0];
        assert_eq!(first.timestamp, minute(9));
        assert_eq!(first.close, 109.0);
        assert_eq!(first.future_close_5, 100.0);
        assert_eq!(first.target, 0);
        assert_relative_eq!(first.rolling_avg_10, 104.5, epsilon = 1e-9);
        assert_relative_eq!(first.volume_sum_10, 10_000.0, epsilon = 1e-9);

        let second = &set.rows[1];
        assert_eq!(second.close, 110.0);
        assert_eq!(second.future_close_5, 100.0);
        assert_eq!(second.target, 0);
        assert_relative_eq!(second.rolling_avg_10, 105.5, epsilon = 1e-9);
    }

    #[test]
    fn test_falling_tail_labels_follow_formula() {
        let closes = rising_then(&[109.0, 108.0, 107.0, 106.0, 105.0]);
        let set = build_features_and_target(&series(&closes));

        assert_eq!(set.rows.len(), closes.len() - 14);
        for (offset, row) in set.rows.iter().enumerate() {
            let i = offset + 9;
            let expected = u8::from(closes[i + 5] > closes[i]);
            assert_eq!(row.close, closes[i]);
            assert_eq!(row.future_close_5, closes[i + 5]);
            assert_eq!(row.target, expected);
        }
        assert_eq!(set.targets(), vec![0, 0]);
    }

    #[test]
    fn test_rising_series_labels_up() {
        let closes: Vec<f64> = (0..20).map(|i| 50.0 + i as f64).collect();
        let set = build_features_and_target(&series(&closes));
        assert_eq!(set.rows.len(), 6);
        assert!(set.rows.iter().all(|row| row.target == 1));
    }

    #[test]
    fn test_row_count_by_length() {
        for n in 0..40usize {
            let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i % 7) as f64).collect();
            let set = build_features_and_target(&series(&closes));
            assert_eq!(set.rows.len(), n.saturating_sub(14), "length {n}");
            assert_eq!(set.rows.len() + set.exclusions.len(), n);
            assert!(set.rows.iter().all(|row| row.target <= 1));
        }
    }

    #[test]
    fn test_input_order_is_not_trusted() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + ((i * 37) % 11) as f64).collect();
        let ordered = series(&closes);
        let mut shuffled = ordered.clone();
        shuffled.reverse();
        shuffled.swap(3, 17);

        let expected = build_features_and_target(&ordered);
        assert_eq!(build_features_and_target(&shuffled), expected);
        // pure: a second run gives the same answer
        assert_eq!(build_features_and_target(&ordered), expected);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let mut bars = series(&[100.0; 16]);
        // two bars share minute 9; the one listed first must be labelled first
        bars[10].timestamp = minute(9);
        bars[9].close = Some(90.0);
        bars[10].close = Some(95.0);

        let set = build_features_and_target(&bars);
        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0].close, 90.0);
        assert_eq!(set.rows[1].close, 95.0);
    }

    #[test]
    fn test_gap_in_close_is_reported() {
        let mut bars = series(&[100.0; 20]);
        bars[12].close = None;

        let set = build_features_and_target(&bars);
        let emitted: Vec<DateTime<Utc>> = set.rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(emitted, vec![minute(9), minute(10), minute(11)]);

        let counts = set.exclusion_counts();
        assert_eq!(counts[&ExclusionReason::WindowEdge], 9);
        assert_eq!(counts[&ExclusionReason::LabelEdge], 5);
        assert_eq!(counts[&ExclusionReason::MissingField], 1);
        assert_eq!(counts[&ExclusionReason::IncompleteWindow], 2);
        assert!(!counts.contains_key(&ExclusionReason::MissingFutureClose));

        let gap = set.exclusions.iter().find(|e| e.index == 12).unwrap();
        assert_eq!(gap.reason, ExclusionReason::MissingField);
    }

    #[test]
    fn test_gap_in_future_close_is_reported() {
        let mut bars = series(&[100.0; 20]);
        bars[17].close = None;

        let set = build_features_and_target(&bars);
        assert_eq!(set.rows.len(), 5);
        let reason_at = |index: usize| {
            set.exclusions
                .iter()
                .find(|e| e.index == index)
                .map(|e| e.reason)
        };
        assert_eq!(reason_at(12), Some(ExclusionReason::MissingFutureClose));
        assert_eq!(reason_at(17), Some(ExclusionReason::MissingField));
        assert_eq!(reason_at(16), Some(ExclusionReason::LabelEdge));
    }

    #[test]
    fn test_gap_in_volume_blocks_window() {
        let mut bars = series(&[100.0; 16]);
        bars[0].volume = None;

        let set = build_features_and_target(&bars);
        assert_eq!(set.rows.len(), 1);
        assert_eq!(set.rows[0].timestamp, minute(10));
        let first = set.exclusions.iter().find(|e| e.index == 9).unwrap();
        assert_eq!(first.reason, ExclusionReason::IncompleteWindow);

        bars[10].volume = None;
        let set = build_features_and_target(&bars);
        assert!(set.rows.is_empty());
        let second = set.exclusions.iter().find(|e| e.index == 10).unwrap();
        assert_eq!(second.reason, ExclusionReason::MissingField);
    }

    #[test]
    fn test_csv_source_end_to_end() {
        let mut body = String::from("timestamp,open,high,low,close,volume\n");
        for (i, close) in rising_then(&[100.0; 5]).iter().enumerate().rev() {
            body.push_str(&format!(
                "{},100,102,99,{close},1000\n",
                minute(i).format("%Y-%m-%d %H:%M:%S")
            ));
        }

        let set = build_from_csv_reader(body.as_bytes(), "scenario").unwrap();
        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0].open, Some(100.0));
        assert_eq!(set.rows[0].high, Some(102.0));
        assert_eq!(set.targets(), vec![0, 0]);
    }

    #[test]
    fn test_missing_close_column_is_schema_error() {
        let mut body = String::from("timestamp,open,volume\n");
        for i in 0..20 {
            body.push_str(&format!("{},100,1000\n", minute(i).format("%Y-%m-%d %H:%M:%S")));
        }

        let err = build_from_csv_reader(body.as_bytes(), "no_close").unwrap_err();
        assert!(matches!(
            err,
            FeatureError::Ingestion(DataIngestionError::MissingColumn { column: "close", .. })
        ));
    }
}
