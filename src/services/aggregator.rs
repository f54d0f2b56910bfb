use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::debug;

use crate::models::{Bucket, ScanResult, ScanStats, SectorTally, SignalMatch, WyckoffMatch};

/// Collects DeMark matches for one scan and tallies them by sector
///
/// Every recorded match increments exactly one sector count in its bucket,
/// so each bucket's tally always sums to the bucket's match count.
#[derive(Debug, Default)]
pub struct SignalAggregator {
    tops: Vec<SignalMatch>,
    bottoms: Vec<SignalMatch>,
    top_sectors: SectorTally,
    bottom_sectors: SectorTally,
}

impl SignalAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a match under the bucket of its label
    pub fn record(&mut self, signal_match: SignalMatch, sector: &str) {
        match signal_match.signal.bucket() {
            Bucket::Tops => {
                self.top_sectors.increment(sector);
                self.tops.push(signal_match);
            }
            Bucket::Bottoms => {
                self.bottom_sectors.increment(sector);
                self.bottoms.push(signal_match);
            }
        }
    }

    /// Sort both buckets by ticker and produce the scan result
    pub fn finish(mut self, label: &str, candle_date: NaiveDate, stats: ScanStats) -> ScanResult {
        sort_by_ticker(&mut self.tops);
        sort_by_ticker(&mut self.bottoms);

        debug!(
            label = label,
            tops = self.tops.len(),
            bottoms = self.bottoms.len(),
            "Aggregated scan matches"
        );

        ScanResult {
            label: label.to_string(),
            tops: self.tops,
            bottoms: self.bottoms,
            top_sectors: self.top_sectors,
            bottom_sectors: self.bottom_sectors,
            candle_date,
            stats,
        }
    }
}

/// Stable ascending sort by ticker symbol
pub fn sort_by_ticker(matches: &mut [SignalMatch]) {
    matches.sort_by(|a, b| a.ticker.cmp(&b.ticker));
}

/// Order Wyckoff matches by sector, then ticker
pub fn sort_wyckoff(matches: &mut [WyckoffMatch]) {
    matches.sort_by(|a, b| a.sector.cmp(&b.sector).then_with(|| a.ticker.cmp(&b.ticker)));
}

/// Combined tops + bottoms count of one sector on two timeframes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorTrend {
    pub sector: String,
    pub daily: usize,
    pub weekly: usize,
}

/// Per-sector signal counts, daily vs weekly, sorted by sector name
pub fn sector_trends(daily: &ScanResult, weekly: &ScanResult) -> Vec<SectorTrend> {
    let sectors: BTreeSet<&str> = [
        &daily.top_sectors,
        &daily.bottom_sectors,
        &weekly.top_sectors,
        &weekly.bottom_sectors,
    ]
    .into_iter()
    .flat_map(|tally| tally.sectors())
    .collect();

    sectors
        .into_iter()
        .map(|sector| SectorTrend {
            sector: sector.to_string(),
            daily: daily.top_sectors.get(sector) + daily.bottom_sectors.get(sector),
            weekly: weekly.top_sectors.get(sector) + weekly.bottom_sectors.get(sector),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalLabel;

    fn signal(ticker: &str, label: SignalLabel) -> SignalMatch {
        SignalMatch {
            ticker: ticker.to_string(),
            last_close: 10.0,
            signal: label,
            industry: "Unknown".to_string(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 13).unwrap()
    }

    #[test]
    fn test_tally_sums_to_bucket_length() {
        let mut aggregator = SignalAggregator::new();
        aggregator.record(signal("XOM", SignalLabel::Dm9Top), "Energy");
        aggregator.record(signal("CVX", SignalLabel::Dm13Top), "Energy");
        aggregator.record(signal("AAPL", SignalLabel::Dm9Top), "Technology");
        aggregator.record(signal("PFE", SignalLabel::Dm9Bot), "Unknown");
        let result = aggregator.finish("1D", date(), ScanStats::default());
        assert_eq!(result.total_matches(), 4);
        assert_eq!(result.top_sectors.total(), result.tops.len());
        assert_eq!(result.bottom_sectors.total(), result.bottoms.len());
        assert_eq!(result.top_sectors.get("Energy"), 2);
        assert_eq!(result.bottom_sectors.get("Unknown"), 1);
    }

    #[test]
    fn test_buckets_sorted_by_ticker() {
        let mut aggregator = SignalAggregator::new();
        for ticker in ["MSFT", "AAPL", "NVDA", "AMD"] {
            aggregator.record(signal(ticker, SignalLabel::Dm9Bot), "Technology");
        }

        let result = aggregator.finish("1W", date(), ScanStats::default());
        let tickers: Vec<&str> = result.bottoms.iter().map(|m| m.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "AMD", "MSFT", "NVDA"]);
        assert!(result.tops.is_empty());
    }

    #[test]
    fn test_sort_wyckoff_by_sector_then_ticker() {
        let wyckoff = |ticker: &str, sector: &str| WyckoffMatch {
            ticker: ticker.to_string(),
            last_close: 1.0,
            sector: sector.to_string(),
            industry: "Unknown".to_string(),
            percent_change: 1.0,
        };
        let mut matches = vec![
            wyckoff("ZZZ", "Energy"),
            wyckoff("AAA", "Technology"),
            wyckoff("BBB", "Energy"),
        ];

        sort_wyckoff(&mut matches);
        let order: Vec<&str> = matches.iter().map(|m| m.ticker.as_str()).collect();
        assert_eq!(order, vec!["BBB", "ZZZ", "AAA"]);
    }

    #[test]
    fn test_sector_trends_union() {
        let mut daily = SignalAggregator::new();
        daily.record(signal("XOM", SignalLabel::Dm9Top), "Energy");
        daily.record(signal("AAPL", SignalLabel::Dm9Bot), "Technology");
        let daily = daily.finish("1D", date(), ScanStats::default());

        let mut weekly = SignalAggregator::new();
        weekly.record(signal("CVX", SignalLabel::Dm13Bot), "Energy");
        weekly.record(signal("NEE", SignalLabel::Dm9Top), "Utilities");
        let weekly = weekly.finish("1W", date(), ScanStats::default());

        let trends = sector_trends(&daily, &weekly);
        assert_eq!(
            trends,
            vec![
                SectorTrend { sector: "Energy".to_string(), daily: 1, weekly: 1 },
                SectorTrend { sector: "Technology".to_string(), daily: 1, weekly: 0 },
                SectorTrend { sector: "Utilities".to_string(), daily: 0, weekly: 1 },
            ]
        );
    }
}
