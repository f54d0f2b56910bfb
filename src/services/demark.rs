//! DeMark sequential exhaustion evaluator
//!
//! Classifies the final bar of a series as a 9 or 13 count top (up-count)
//! or bottom (down-count). Only the most recent bar is inspected; the
//! evaluator is re-run per ticker on every scan.

use crate::constants::{DEMARK_COUNTDOWN_COUNT, DEMARK_MIN_BARS, DEMARK_SETUP_COUNT};
use crate::models::indicators::{rebased_counts, sequential_counts};
use crate::models::DeMarkFlags;

/// Evaluate the DeMark flags for the last bar of `closes`
///
/// Series shorter than [`DEMARK_MIN_BARS`] report no signal.
pub fn evaluate(closes: &[f64]) -> DeMarkFlags {
    if closes.len() < DEMARK_MIN_BARS {
        return DeMarkFlags::none();
    }

    let (td_up, td_down) = final_counts(closes);

    DeMarkFlags {
        dm9_top: td_up == DEMARK_SETUP_COUNT,
        dm13_top: td_up == DEMARK_COUNTDOWN_COUNT,
        dm9_bot: td_down == DEMARK_SETUP_COUNT,
        dm13_bot: td_down == DEMARK_COUNTDOWN_COUNT,
    }
}

/// Re-based up and down counts at the last bar (0 for an empty series)
pub fn final_counts(closes: &[f64]) -> (i64, i64) {
    let counts = sequential_counts(closes);
    let td_up = rebased_counts(&counts.up);
    let td_down = rebased_counts(&counts.down);

    (
        td_up.last().copied().unwrap_or(0),
        td_down.last().copied().unwrap_or(0),
    )
}
