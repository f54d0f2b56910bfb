use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

use crate::constants::UNKNOWN_CLASSIFICATION;
use crate::error::{Error, Result};

/// Sector/industry classification of one ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerInfo {
    pub sector: String,
    pub industry: String,
}

impl Default for TickerInfo {
    fn default() -> Self {
        Self {
            sector: UNKNOWN_CLASSIFICATION.to_string(),
            industry: UNKNOWN_CLASSIFICATION.to_string(),
        }
    }
}

/// Ticker universe with sector/industry lookups
///
/// Loaded from flat CSV files with `Ticker,Sector,Industry` headers. Blank
/// classification cells become "Unknown"; rows without a ticker are ignored.
#[derive(Debug, Clone, Default)]
pub struct TickerReference {
    entries: HashMap<String, TickerInfo>,
}

impl TickerReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a reference table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
        };

        let ticker_col = column("Ticker").ok_or_else(|| {
            Error::Parse(format!("{}: missing 'Ticker' column", path.display()))
        })?;
        let sector_col = column("Sector");
        let industry_col = column("Industry");

        let mut entries = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let ticker = record.get(ticker_col).map(str::trim).unwrap_or("");
            if ticker.is_empty() {
                continue;
            }

            let cell = |col: Option<usize>| {
                col.and_then(|c| record.get(c))
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .unwrap_or(UNKNOWN_CLASSIFICATION)
                    .to_string()
            };

            entries.insert(
                ticker.to_string(),
                TickerInfo {
                    sector: cell(sector_col),
                    industry: cell(industry_col),
                },
            );
        }

        Ok(Self { entries })
    }

    /// Load a reference table, logging and returning an empty table on failure
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            warn!(file = %path.display(), "Reference file not found");
            return Self::new();
        }

        match Self::from_csv(path) {
            Ok(reference) => {
                info!(file = %path.display(), tickers = reference.len(), "Loaded reference table");
                reference
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Failed to load reference table");
                Self::new()
            }
        }
    }

    /// Load and union several reference files; later files win on duplicates
    pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut reference = Self::new();
        for path in paths {
            reference.merge(Self::load_or_empty(path));
        }
        reference
    }

    /// Union another table into this one, overriding duplicate symbols
    pub fn merge(&mut self, other: TickerReference) {
        self.entries.extend(other.entries);
    }

    pub fn insert(&mut self, ticker: impl Into<String>, sector: impl Into<String>, industry: impl Into<String>) {
        self.entries.insert(
            ticker.into(),
            TickerInfo {
                sector: sector.into(),
                industry: industry.into(),
            },
        );
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.entries.contains_key(ticker)
    }

    /// Sector of a ticker, "Unknown" when absent
    pub fn sector(&self, ticker: &str) -> &str {
        self.entries
            .get(ticker)
            .map(|info| info.sector.as_str())
            .unwrap_or(UNKNOWN_CLASSIFICATION)
    }

    /// Industry of a ticker, "Unknown" when absent
    pub fn industry(&self, ticker: &str) -> &str {
        self.entries
            .get(ticker)
            .map(|info| info.industry.as_str())
            .unwrap_or(UNKNOWN_CLASSIFICATION)
    }

    /// All tickers, sorted
    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.entries.keys().cloned().collect();
        tickers.sort();
        tickers
    }

    /// Number of tickers per sector, sorted by sector name
    pub fn sector_sizes(&self) -> BTreeMap<String, usize> {
        let mut sizes = BTreeMap::new();
        for info in self.entries.values() {
            *sizes.entry(info.sector.clone()).or_insert(0) += 1;
        }
        sizes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_from_csv_defaults_blank_cells() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sp_cache.csv");
        fs::write(
            &path,
            "\u{feff}Ticker,Sector,Industry\nAAPL,Technology,Consumer Electronics\nXOM,,\n ,Energy,Oil\n",
        )
        .unwrap();

        let reference = TickerReference::from_csv(&path).unwrap();
        assert_eq!(reference.len(), 2);
        assert_eq!(reference.sector("AAPL"), "Technology");
        assert_eq!(reference.industry("AAPL"), "Consumer Electronics");
        assert_eq!(reference.sector("XOM"), "Unknown");
        assert_eq!(reference.industry("XOM"), "Unknown");
    }

    #[test]
    fn test_missing_ticker_defaults_to_unknown() {
        let reference = TickerReference::new();
        assert_eq!(reference.sector("MSFT"), "Unknown");
        assert_eq!(reference.industry("MSFT"), "Unknown");
        assert!(!reference.contains("MSFT"));
    }

    #[test]
    fn test_later_tables_override_earlier() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("a.csv");
        let second = temp_dir.path().join("b.csv");
        fs::write(&first, "Ticker,Sector,Industry\nT,Telecom,Wireless\nF,Consumer,Autos\n").unwrap();
        fs::write(&second, "Ticker,Sector,Industry\nT,Communication,Telecom Services\n").unwrap();

        let reference = TickerReference::load_all(&[first, second, temp_dir.path().join("missing.csv")]);
        assert_eq!(reference.len(), 2);
        assert_eq!(reference.sector("T"), "Communication");
        assert_eq!(reference.industry("T"), "Telecom Services");
        assert_eq!(reference.sector("F"), "Consumer");
        assert_eq!(reference.tickers(), vec!["F", "T"]);
    }

    #[test]
    fn test_missing_ticker_column_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.csv");
        fs::write(&path, "Symbol,Sector\nAAPL,Technology\n").unwrap();

        assert!(TickerReference::from_csv(&path).is_err());
        assert!(TickerReference::load_or_empty(&path).is_empty());
    }

    #[test]
    fn test_sector_sizes() {
        let mut reference = TickerReference::new();
        reference.insert("AAPL", "Technology", "Hardware");
        reference.insert("MSFT", "Technology", "Software");
        reference.insert("XOM", "Energy", "Oil");

        let sizes = reference.sector_sizes();
        assert_eq!(sizes.get("Technology"), Some(&2));
        assert_eq!(sizes.get("Energy"), Some(&1));
    }
}
