use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

/// One minute bar of a single instrument.
///
/// Price and volume cells may be absent in the source file; they are kept as
/// `None` so downstream consumers can decide how to treat the gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl Observation {
    /// A bar carrying only the fields the feature builder needs.
    pub fn new(timestamp: DateTime<Utc>, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open: None,
            high: None,
            low: None,
            close: Some(close),
            volume: Some(volume),
        }
    }

    #[cfg(test)]
    pub fn with_ohlc(mut self, open: f64, high: f64, low: f64) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self
    }
}

/// All bars read for one instrument, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstrumentSeries {
    pub stock: String,
    pub observations: Vec<Observation>,
}

impl InstrumentSeries {
    pub fn new(stock: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            stock: stock.into(),
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Flags bars with negative prices or volume. The bar is not rejected.
pub fn validate_observation(data: &Observation) -> bool {
    let mut is_valid = true;
    if data.volume.is_some_and(|v| v < 0.0) {
        debug!("Invalid volume data at {}", data.timestamp);
        is_valid = false;
    }

    let prices = [
        ("open", data.open),
        ("high", data.high),
        ("low", data.low),
        ("close", data.close),
    ];
    for (name, value) in prices {
        if value.is_some_and(|v| v < 0.0) {
            debug!("{name} cannot be negative at {}", data.timestamp);
            is_valid = false;
        }
    }

    is_valid
}
