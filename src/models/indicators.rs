//! Technical indicators and calculations for price series
//!
//! # Sequential counters
//! The DeMark-style exhaustion count is built from two run-length counters
//! comparing each close with the close [`SEQUENTIAL_LOOKBACK`] bars earlier:
//! - `up[i]` grows while `close[i] > close[i-4]`, else resets to 0
//! - `down[i]` grows while `close[i] < close[i-4]`, else resets to 0
//!
//! The counters are then re-based against their most recent reset point
//! ([`value_when_reset`]) to give the 1–13 count the signal logic inspects.
//!
//! All functions take closes oldest first and are positional: gaps in the
//! calendar do not matter.

use crate::constants::SEQUENTIAL_LOOKBACK;

/// Up/down run-length counters for one series
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequentialCounts {
    pub up: Vec<i64>,
    pub down: Vec<i64>,
}

/// Calculate the TD/TS sequential counters
///
/// # Arguments
/// * `closes` - Closing prices, oldest first
///
/// # Returns
/// * Counters of the same length as `closes`; the first 4 entries are 0
///   (no bar 4 periods back). Empty input gives empty counters.
pub fn sequential_counts(closes: &[f64]) -> SequentialCounts {
    let n = closes.len();
    let mut up = vec![0i64; n];
    let mut down = vec![0i64; n];

    for i in SEQUENTIAL_LOOKBACK..n {
        let reference = closes[i - SEQUENTIAL_LOOKBACK];
        up[i] = if closes[i] > reference { up[i - 1] + 1 } else { 0 };
        down[i] = if closes[i] < reference { down[i - 1] + 1 } else { 0 };
    }

    SequentialCounts { up, down }
}

/// Value of a counter at its most recent reset before `idx`
///
/// Scans backward from `idx - 1` down to 1 and returns the first `arr[j]`
/// with `arr[j] < arr[j - 1]`. Equal neighbours are not a reset. Returns 0
/// when no reset is found.
pub fn value_when_reset(arr: &[i64], idx: usize) -> i64 {
    let end = idx.min(arr.len());
    for j in (1..end).rev() {
        if arr[j] < arr[j - 1] {
            return arr[j];
        }
    }
    0
}

/// Re-base a counter against its last reset: `arr[i] - value_when_reset(arr, i)`
pub fn rebased_counts(arr: &[i64]) -> Vec<i64> {
    (0..arr.len())
        .map(|i| arr[i] - value_when_reset(arr, i))
        .collect()
}

/// Calculate percentage change: ((current - previous) / previous) * 100
///
/// Returns `None` when `previous` is zero (change undefined).
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some(((current - previous) / previous) * 100.0)
    }
}

/// Highest value of a slice (`None` for an empty slice)
pub fn max_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}
