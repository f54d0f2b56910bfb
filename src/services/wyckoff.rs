//! Wyckoff "sign of strength" evaluator
//!
//! A series passes when its final close breaks above the highest close of
//! the prior 30 bars AND each of the last 5 bars closed above the bar
//! before it. Binary pass/fail, no graduated score.

use crate::constants::{
    WYCKOFF_BREAKOUT_WINDOW, WYCKOFF_MIN_BARS, WYCKOFF_STREAK_BARS, WYCKOFF_STREAK_THRESHOLD,
};
use crate::models::indicators::{max_value, percent_change};
use crate::models::SkipReason;

/// Whether the final bar passes both the breakout and momentum tests
///
/// Series shorter than [`WYCKOFF_MIN_BARS`] never pass.
pub fn evaluate(closes: &[f64]) -> bool {
    if closes.len() < WYCKOFF_MIN_BARS {
        return false;
    }

    is_breakout(closes) && is_momentum_streak(closes)
}

/// Final close strictly above the max of the preceding window (current bar excluded)
pub fn is_breakout(closes: &[f64]) -> bool {
    let n = closes.len();
    if n <= WYCKOFF_BREAKOUT_WINDOW {
        return false;
    }

    let last = n - 1;
    match max_value(&closes[last - WYCKOFF_BREAKOUT_WINDOW..last]) {
        Some(prior_high) => closes[last] > prior_high,
        None => false,
    }
}

/// More than 4 up-closes among the last 5 bars
pub fn is_momentum_streak(closes: &[f64]) -> bool {
    let n = closes.len();
    if n <= WYCKOFF_STREAK_BARS {
        return false;
    }

    let up_closes = (n - WYCKOFF_STREAK_BARS..n)
        .filter(|&i| closes[i] > closes[i - 1])
        .count();

    up_closes > WYCKOFF_STREAK_THRESHOLD
}

/// Evaluate and, on a pass, return the final bar's percent change
///
/// A pass whose prior close is zero has no defined change and is reported as
/// a data-quality skip.
pub fn sign_of_strength(closes: &[f64]) -> Result<Option<f64>, SkipReason> {
    if !evaluate(closes) {
        return Ok(None);
    }

    let n = closes.len();
    percent_change(closes[n - 1], closes[n - 2])
        .map(Some)
        .ok_or(SkipReason::ZeroPriorClose)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 35 bars ranging 95..110 (high of 110 at index 20), then a 5-bar rally
    fn breakout_series(rally: [f64; 5]) -> Vec<f64> {
        let mut closes: Vec<f64> = (0..35)
            .map(|i| if i == 20 { 110.0 } else { 95.0 + (i % 5) as f64 })
            .collect();
        closes[34] = 100.0;
        closes.extend(rally);
        closes
    }

    #[test]
    fn test_short_series_never_passes() {
        for len in 0..WYCKOFF_MIN_BARS {
            let closes: Vec<f64> = (0..len).map(|i| i as f64 + 1.0).collect();
            assert!(!evaluate(&closes));
        }
    }

    #[test]
    fn test_breakout_with_streak_passes() {
        let closes = breakout_series([101.0, 102.0, 103.0, 104.0, 111.0]);
        assert_eq!(closes.len(), 40);
        assert!(is_breakout(&closes));
        assert!(is_momentum_streak(&closes));
        assert!(evaluate(&closes));
    }

    #[test]
    fn test_flat_day_breaks_streak() {
        let closes = breakout_series([101.0, 102.0, 102.0, 104.0, 111.0]);
        assert!(is_breakout(&closes));
        assert!(!is_momentum_streak(&closes));
        assert!(!evaluate(&closes));
    }

    #[test]
    fn test_equal_to_prior_high_is_not_breakout() {
        let closes = breakout_series([101.0, 102.0, 103.0, 104.0, 110.0]);
        assert!(is_momentum_streak(&closes));
        assert!(!is_breakout(&closes));
        assert!(!evaluate(&closes));
    }

    #[test]
    fn test_high_outside_window_is_ignored() {
        // a spike 31 bars before the last bar is outside the 30-bar window
        let mut closes = breakout_series([101.0, 102.0, 103.0, 104.0, 111.0]);
        closes[8] = 500.0;
        assert!(evaluate(&closes));

        closes[9] = 500.0;
        assert!(!evaluate(&closes));
    }

    #[test]
    fn test_sign_of_strength_percent_change() {
        let closes = breakout_series([101.0, 102.0, 103.0, 104.0, 114.4]);
        let change = sign_of_strength(&closes).unwrap().unwrap();
        assert!((change - 10.0).abs() < 1e-9);
        assert!(change > 0.0);

        let no_signal = breakout_series([101.0, 100.0, 103.0, 104.0, 111.0]);
        assert_eq!(sign_of_strength(&no_signal), Ok(None));
    }

    #[test]
    fn test_percent_change_sign_follows_direction() {
        assert!(percent_change(105.0, 100.0).unwrap() > 0.0);
        assert!(percent_change(95.0, 100.0).unwrap() < 0.0);
        assert_eq!(percent_change(100.0, 100.0), Some(0.0));
    }

    #[test]
    fn test_zero_prior_close_is_skipped() {
        // all-negative history so a rally through 0 can still break out
        let mut closes: Vec<f64> = vec![-50.0; 35];
        closes.extend([-4.0, -3.0, -2.0, 0.0, 1.0]);
        assert!(evaluate(&closes));
        assert_eq!(sign_of_strength(&closes), Err(SkipReason::ZeroPriorClose));
    }
}
