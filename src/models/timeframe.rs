use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{DAILY_CACHE_KEY, SECTOR_LABEL};

/// Bar interval requested from the price provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    /// Daily candles
    Daily,
    /// Weekly candles
    Weekly,
}

impl Interval {
    /// Convert to provider interval string ("1d", "1wk")
    pub fn to_provider_format(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
        }
    }

    /// History window fetched for this interval
    pub fn default_period(&self) -> &'static str {
        match self {
            Interval::Daily => "6mo",
            Interval::Weekly => "2y",
        }
    }
}

impl FromStr for Interval {
    type Err = String;

    /// Parse from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" | "daily" => Ok(Interval::Daily),
            "1wk" | "1w" | "weekly" => Ok(Interval::Weekly),
            _ => Err(format!("Invalid interval: {}. Valid options: 1d, 1wk", s)),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_provider_format())
    }
}

/// A labelled (interval, period) window scanned as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeframe {
    /// Human label shown in reports ("1D", "1W", "Sector")
    pub label: String,

    /// Provider bar interval
    pub interval: Interval,

    /// Provider history window ("6mo", "2y")
    pub period: String,
}

impl Timeframe {
    pub fn new(label: impl Into<String>, interval: Interval, period: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            interval,
            period: period.into(),
        }
    }

    /// Daily equity scan ("1D", 6 months)
    pub fn daily() -> Self {
        Self::new(DAILY_CACHE_KEY, Interval::Daily, Interval::Daily.default_period())
    }

    /// Weekly equity scan ("1W", 2 years)
    pub fn weekly() -> Self {
        Self::new("1W", Interval::Weekly, Interval::Weekly.default_period())
    }

    /// Daily sector ETF scan
    pub fn sector() -> Self {
        Self::new(SECTOR_LABEL, Interval::Daily, Interval::Daily.default_period())
    }

    /// Cache entry identifier: the uppercased label
    pub fn cache_key(&self) -> String {
        self.label.to_uppercase()
    }

    /// Whether the industry column should show the sector instead
    pub fn is_sector_scan(&self) -> bool {
        self.label.eq_ignore_ascii_case(SECTOR_LABEL)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.label, self.interval, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_str() {
        assert_eq!("1d".parse::<Interval>().unwrap(), Interval::Daily);
        assert_eq!("DAILY".parse::<Interval>().unwrap(), Interval::Daily);
        assert_eq!("1wk".parse::<Interval>().unwrap(), Interval::Weekly);
        assert_eq!(" Weekly ".parse::<Interval>().unwrap(), Interval::Weekly);
        assert!("1h".parse::<Interval>().is_err());

        // round-trips through Display
        for interval in [Interval::Daily, Interval::Weekly] {
            assert_eq!(interval.to_string().parse::<Interval>().unwrap(), interval);
        }
    }

    #[test]
    fn test_cache_keys_are_uppercased() {
        assert_eq!(Timeframe::daily().cache_key(), "1D");
        assert_eq!(Timeframe::weekly().cache_key(), "1W");
        assert_eq!(Timeframe::sector().cache_key(), "SECTOR");
        assert_eq!(Timeframe::new("1d", Interval::Daily, "6mo").cache_key(), "1D");
    }

    #[test]
    fn test_default_windows() {
        assert_eq!(Timeframe::daily().period, "6mo");
        assert_eq!(Timeframe::weekly().period, "2y");
        assert_eq!(Timeframe::weekly().interval, Interval::Weekly);
        assert!(Timeframe::sector().is_sector_scan());
        assert!(!Timeframe::daily().is_sector_scan());
    }
}
