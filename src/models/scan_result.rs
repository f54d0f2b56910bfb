use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::signal::{Bucket, SignalMatch, WyckoffMatch};

/// Matching tickers per sector for one bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorTally {
    counts: BTreeMap<String, usize>,
}

impl SectorTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, sector: &str) {
        *self.counts.entry(sector.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, sector: &str) -> usize {
        self.counts.get(sector).copied().unwrap_or(0)
    }

    /// Sum of all sector counts
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Sectors with their counts, sorted by sector name
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(sector, count)| (sector.as_str(), *count))
    }

    pub fn sectors(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Why a ticker was left out of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkipReason {
    /// Provider returned no bars
    EmptySeries,
    /// A bar has a non-finite close
    MalformedBar,
    /// Percent change undefined (prior close is zero)
    ZeroPriorClose,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::EmptySeries => "empty series",
            SkipReason::MalformedBar => "malformed bar",
            SkipReason::ZeroPriorClose => "zero prior close",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping for one scan, surfaced alongside the matches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Tickers in the universe
    pub tickers_requested: usize,
    /// Tickers whose series reached an evaluator
    pub tickers_evaluated: usize,
    /// Universe tickers with no series in the fetched data
    pub missing_data: usize,
    /// Tickers skipped for data quality, per reason
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl ScanStats {
    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Outcome of the DeMark scan for one timeframe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Timeframe label the scan ran on
    pub label: String,
    /// Top matches, ordered by ticker
    pub tops: Vec<SignalMatch>,
    /// Bottom matches, ordered by ticker
    pub bottoms: Vec<SignalMatch>,
    pub top_sectors: SectorTally,
    pub bottom_sectors: SectorTally,
    /// Date of the most recent bar observed across the universe
    pub candle_date: NaiveDate,
    pub stats: ScanStats,
}

impl ScanResult {
    /// Result with no matches (total fetch/cache outage)
    pub fn empty(label: impl Into<String>, candle_date: NaiveDate) -> Self {
        Self {
            label: label.into(),
            tops: Vec::new(),
            bottoms: Vec::new(),
            top_sectors: SectorTally::new(),
            bottom_sectors: SectorTally::new(),
            candle_date,
            stats: ScanStats::default(),
        }
    }

    pub fn matches(&self, bucket: Bucket) -> &[SignalMatch] {
        match bucket {
            Bucket::Tops => &self.tops,
            Bucket::Bottoms => &self.bottoms,
        }
    }

    pub fn sectors(&self, bucket: Bucket) -> &SectorTally {
        match bucket {
            Bucket::Tops => &self.top_sectors,
            Bucket::Bottoms => &self.bottom_sectors,
        }
    }

    pub fn total_matches(&self) -> usize {
        self.tops.len() + self.bottoms.len()
    }
}

/// Outcome of the Wyckoff scan over the daily cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WyckoffResult {
    /// Matches ordered by sector, then ticker
    pub matches: Vec<WyckoffMatch>,
    pub stats: ScanStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_tally() {
        let mut tally = SectorTally::new();
        tally.increment("Energy");
        tally.increment("Technology");
        tally.increment("Energy");

        assert_eq!(tally.get("Energy"), 2);
        assert_eq!(tally.get("Utilities"), 0);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.sectors().collect::<Vec<_>>(), vec!["Energy", "Technology"]);
    }

    #[test]
    fn test_skip_counts() {
        let mut stats = ScanStats::default();
        stats.record_skip(SkipReason::EmptySeries);
        stats.record_skip(SkipReason::EmptySeries);
        stats.record_skip(SkipReason::ZeroPriorClose);

        assert_eq!(stats.skipped.get(&SkipReason::EmptySeries), Some(&2));
        assert_eq!(stats.skipped_total(), 3);
    }
}
