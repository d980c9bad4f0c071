use data_ingestion::InstrumentSeries;
use log::info;
use rayon::prelude::*;

use crate::processor::build_features_and_target;
use crate::types::{FeatureRecord, FeatureTable, MIN_SERIES_LEN};

/// Runs the builder on every instrument and concatenates the tagged rows in
/// instrument order. Instruments are processed in parallel; the
/// order-preserving collect keeps the output reproducible.
pub fn build_batch(instruments: &[InstrumentSeries]) -> FeatureTable {
    let per_instrument: Vec<Vec<FeatureRecord>> = instruments
        .par_iter()
        .map(|series| {
            let set = build_features_and_target(&series.observations);
            if series.len() < MIN_SERIES_LEN {
                info!(
                    "{}: {} bars is shorter than {MIN_SERIES_LEN}, no rows emitted",
                    series.stock,
                    series.len()
                );
            } else {
                let tally: Vec<String> = set
                    .exclusion_counts()
                    .iter()
                    .map(|(reason, count)| format!("{reason}={count}"))
                    .collect();
                info!(
                    "{}: {} rows from {} bars (excluded: {})",
                    series.stock,
                    set.rows.len(),
                    series.len(),
                    tally.join(", ")
                );
            }
            set.rows
                .iter()
                .map(|row| FeatureRecord::from_row(&series.stock, row))
                .collect()
        })
        .collect();

    FeatureTable::new(per_instrument.into_iter().flatten().collect())
}
