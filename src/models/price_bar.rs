use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One closed (or in-progress) bar of a ticker's price history
///
/// Evaluators only read `date` and `close`; the remaining fields are kept so
/// the on-disk cache holds what the provider returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Calendar date of the bar (week start for weekly bars)
    pub date: NaiveDate,

    /// Opening price
    pub open: f64,

    /// Highest price
    pub high: f64,

    /// Lowest price
    pub low: f64,

    /// Closing price
    pub close: f64,

    /// Trading volume
    pub volume: u64,
}

impl PriceBar {
    /// Create a new bar with full OHLCV
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Create a bar that only knows its close (open/high/low mirror the close)
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self::new(date, close, close, close, close, 0)
    }

    /// A bar is usable when its close is a finite number
    pub fn is_valid(&self) -> bool {
        self.close.is_finite()
    }
}

/// Closing prices of a series, oldest first
pub fn closes(series: &[PriceBar]) -> Vec<f64> {
    series.iter().map(|bar| bar.close).collect()
}
