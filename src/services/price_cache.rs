//! On-disk price cache
//!
//! One CSV file per timeframe key (`price_cache_<KEY>.csv`) holding every
//! ticker's bars in the `ticker,time,open,high,low,close,volume` layout.
//! Files are written to a temporary sibling and renamed into place so a
//! crashed run never leaves a truncated cache behind.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{MarketData, PriceBar};

const CACHE_FILE_PREFIX: &str = "price_cache_";
const CACHE_FILE_EXTENSION: &str = "csv";

#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    ticker: String,
    time: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

/// Summary of one cache entry
#[derive(Debug, Clone)]
pub struct CacheSummary {
    pub key: String,
    pub tickers: usize,
    pub bars: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Price cache rooted at a directory
#[derive(Debug, Clone)]
pub struct PriceCache {
    dir: PathBuf,
}

impl PriceCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a cache key (the key is uppercased)
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!(
            "{}{}.{}",
            CACHE_FILE_PREFIX,
            key.to_uppercase(),
            CACHE_FILE_EXTENSION
        ))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path_for(key).exists()
    }

    /// Last write time of an entry (`None` when absent or unsupported)
    pub fn modified(&self, key: &str) -> Option<DateTime<Utc>> {
        fs::metadata(self.path_for(key))
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    }

    /// Load a cache entry; `Ok(None)` when the entry does not exist
    pub fn load(&self, key: &str) -> Result<Option<MarketData>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut data = MarketData::new();

        for row in reader.deserialize::<CacheRow>() {
            let row = row.map_err(|e| Error::Csv(format!("{}: {}", path.display(), e)))?;
            data.entry(row.ticker)
                .or_default()
                .push(PriceBar::new(row.time, row.open, row.high, row.low, row.close, row.volume));
        }

        for series in data.values_mut() {
            normalize_series(series);
        }

        debug!(key = key, tickers = data.len(), "Loaded price cache");
        Ok(Some(data))
    }

    /// Persist a full mapping under `key`, replacing any previous entry
    pub fn store(&self, key: &str, data: &MarketData) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let tmp_path = path.with_extension(format!("{}.tmp", CACHE_FILE_EXTENSION));

        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            for (ticker, series) in data {
                for bar in series {
                    writer.serialize(CacheRow {
                        ticker: ticker.clone(),
                        time: bar.date,
                        open: bar.open,
                        high: bar.high,
                        low: bar.low,
                        close: bar.close,
                        volume: bar.volume,
                    })?;
                }
            }
            writer.flush()?;
        }

        fs::rename(&tmp_path, &path)?;
        info!(file = %path.display(), tickers = data.len(), "Saved price cache");
        Ok(())
    }

    /// Keys of all cache entries present on disk, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.strip_prefix(CACHE_FILE_PREFIX)
                    .and_then(|rest| rest.strip_suffix(&format!(".{}", CACHE_FILE_EXTENSION)))
                    .map(str::to_string)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Load an entry and summarise it
    pub fn summary(&self, key: &str) -> Result<Option<CacheSummary>> {
        let data = match self.load(key)? {
            Some(data) => data,
            None => return Ok(None),
        };

        let bars = data.values().map(Vec::len).sum();
        let first_date = data.values().filter_map(|s| s.first()).map(|b| b.date).min();
        let last_date = data.values().filter_map(|s| s.last()).map(|b| b.date).max();

        Ok(Some(CacheSummary {
            key: key.to_uppercase(),
            tickers: data.len(),
            bars,
            first_date,
            last_date,
        }))
    }
}

/// Sort bars by date and drop duplicate dates, keeping the last occurrence
pub fn normalize_series(series: &mut Vec<PriceBar>) {
    series.sort_by_key(|bar| bar.date);
    let mut deduped: Vec<PriceBar> = Vec::with_capacity(series.len());
    for bar in series.drain(..) {
        match deduped.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => deduped.push(bar),
        }
    }
    *series = deduped;
}
