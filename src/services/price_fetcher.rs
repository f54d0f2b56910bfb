use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::models::{MarketData, ScanConfig, Timeframe};
use crate::services::market_clock::is_stale_window;
use crate::services::price_cache::{normalize_series, PriceCache};

/// Source of historical price bars
///
/// A batch call returns whatever series it could obtain; tickers it has no
/// data for are simply absent. An `Err` means the whole batch failed.
pub trait PriceSource {
    fn fetch_batch(
        &self,
        tickers: &[String],
        timeframe: &Timeframe,
    ) -> impl Future<Output = Result<MarketData>> + Send;
}

/// Fetches a universe in batches and keeps the on-disk cache current
pub struct PriceFetcher<S: PriceSource> {
    source: S,
    cache: PriceCache,
    batch_size: usize,
    batch_pause: Duration,
    show_progress: bool,
}

impl<S: PriceSource> PriceFetcher<S> {
    pub fn new(source: S, cache: PriceCache, config: &ScanConfig) -> Self {
        Self {
            source,
            cache,
            batch_size: config.batch_size.max(1),
            batch_pause: config.batch_pause,
            show_progress: true,
        }
    }

    /// Disable the terminal progress bar
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    /// Return price data for `tickers`, from cache on the stale window,
    /// otherwise freshly fetched and persisted under the timeframe key
    ///
    /// Batch failures are logged and contribute no data; a failed cache
    /// write is logged and the fetched data is still returned. The fetched
    /// mapping is always persisted, so a total outage empties the entry.
    pub async fn fetch_or_load(
        &self,
        tickers: &[String],
        timeframe: &Timeframe,
        now: DateTime<Utc>,
    ) -> MarketData {
        self.fetch_or_load_as_of(tickers, timeframe, now).await.0
    }

    /// Like [`fetch_or_load`](Self::fetch_or_load), also returning the time
    /// the data reflects: the cache write time when served from cache,
    /// otherwise `now`
    pub async fn fetch_or_load_as_of(
        &self,
        tickers: &[String],
        timeframe: &Timeframe,
        now: DateTime<Utc>,
    ) -> (MarketData, DateTime<Utc>) {
        let key = timeframe.cache_key();

        if is_stale_window(now) && self.cache.exists(&key) {
            match self.cache.load(&key) {
                Ok(Some(data)) => {
                    let as_of = self
                        .cache
                        .modified(&key)
                        .map(|written| written.min(now))
                        .unwrap_or(now);
                    info!(
                        key = %key,
                        tickers = data.len(),
                        as_of = %as_of,
                        "Stale window: using cached data"
                    );
                    return (data, as_of);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "Cached data unreadable, fetching fresh");
                }
            }
        }

        let data = self.fetch_all(tickers, timeframe).await;

        if data.is_empty() && !tickers.is_empty() {
            warn!(key = %key, "No data received for any ticker");
        }

        if let Err(e) = self.cache.store(&key, &data) {
            error!(key = %key, error = %e, "Failed to persist price cache");
        }

        (data, now)
    }

    /// Fetch every batch sequentially, pausing between batches
    async fn fetch_all(&self, tickers: &[String], timeframe: &Timeframe) -> MarketData {
        let batches: Vec<&[String]> = tickers.chunks(self.batch_size).collect();
        let total_batches = batches.len();

        info!(
            timeframe = %timeframe,
            tickers = tickers.len(),
            batches = total_batches,
            "Fetching fresh price data"
        );

        let pb = self.progress_bar(total_batches);
        let mut all_data = MarketData::new();
        let mut failed_batches = 0usize;

        for (batch_idx, batch) in batches.iter().enumerate() {
            match self.source.fetch_batch(batch, timeframe).await {
                Ok(batch_data) => {
                    for (ticker, mut series) in batch_data {
                        if !batch.contains(&ticker) {
                            continue;
                        }
                        normalize_series(&mut series);
                        all_data.insert(ticker, series);
                    }
                }
                Err(e) => {
                    failed_batches += 1;
                    warn!(
                        batch_num = batch_idx + 1,
                        total_batches = total_batches,
                        first_ticker = %batch.first().map(String::as_str).unwrap_or(""),
                        error = %e,
                        "Batch fetch failed"
                    );
                }
            }

            if let Some(pb) = &pb {
                pb.inc(1);
            }

            if batch_idx + 1 < total_batches && !self.batch_pause.is_zero() {
                sleep(self.batch_pause).await;
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        info!(
            timeframe = %timeframe,
            received = all_data.len(),
            failed_batches = failed_batches,
            "Fetch completed"
        );

        all_data
    }

    fn progress_bar(&self, total: usize) -> Option<ProgressBar> {
        if !self.show_progress || total == 0 {
            return None;
        }

        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} batches ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::PriceBar;
    use chrono::{NaiveDate, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Returns one bar per ticker; fails any batch containing "FAIL"
    struct FakeSource {
        calls: Arc<AtomicUsize>,
    }

    impl PriceSource for FakeSource {
        fn fetch_batch(
            &self,
            tickers: &[String],
            _timeframe: &Timeframe,
        ) -> impl Future<Output = Result<MarketData>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let tickers = tickers.to_vec();
            async move {
                if tickers.iter().any(|t| t == "FAIL") {
                    return Err(Error::Provider("provider unavailable".to_string()));
                }
                let date = NaiveDate::from_ymd_opt(2025, 6, 13).unwrap();
                let mut data = MarketData::new();
                for ticker in tickers {
                    if ticker == "NODATA" {
                        continue;
                    }
                    data.insert(ticker, vec![PriceBar::from_close(date, 10.0)]);
                }
                // stray ticker outside the batch is ignored
                data.insert("STRAY".to_string(), vec![PriceBar::from_close(date, 1.0)]);
                Ok(data)
            }
        }
    }

    fn fetcher(dir: &std::path::Path, batch_size: usize) -> (PriceFetcher<FakeSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = ScanConfig::default()
            .with_batch_size(batch_size)
            .with_batch_pause(Duration::ZERO);
        let fetcher = PriceFetcher::new(
            FakeSource { calls: calls.clone() },
            PriceCache::new(dir),
            &config,
        )
        .without_progress();
        (fetcher, calls)
    }

    fn tickers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn weekday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 11, 15, 0, 0).unwrap()
    }

    fn saturday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 15, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_abort_others() {
        let temp_dir = TempDir::new().unwrap();
        let (fetcher, calls) = fetcher(temp_dir.path(), 2);

        let universe = tickers(&["AAPL", "FAIL", "MSFT", "NODATA", "XOM"]);
        let data = fetcher.fetch_or_load(&universe, &Timeframe::daily(), weekday()).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let keys: Vec<&str> = data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["MSFT", "XOM"]);
        assert!(fetcher.cache().exists("1D"));
    }

    #[tokio::test]
    async fn test_stale_window_reuses_cache() {
        let temp_dir = TempDir::new().unwrap();
        let (fetcher, calls) = fetcher(temp_dir.path(), 50);
        let universe = tickers(&["AAPL", "MSFT"]);

        let fresh = fetcher.fetch_or_load(&universe, &Timeframe::weekly(), weekday()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let cached = fetcher.fetch_or_load(&universe, &Timeframe::weekly(), saturday()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached, fresh);
    }

    #[tokio::test]
    async fn test_stale_window_without_cache_fetches() {
        let temp_dir = TempDir::new().unwrap();
        let (fetcher, calls) = fetcher(temp_dir.path(), 50);

        let data = fetcher
            .fetch_or_load(&tickers(&["AAPL"]), &Timeframe::sector(), saturday())
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(data.len(), 1);
        assert!(fetcher.cache().exists("SECTOR"));
    }

    #[tokio::test]
    async fn test_weekday_always_refetches() {
        let temp_dir = TempDir::new().unwrap();
        let (fetcher, calls) = fetcher(temp_dir.path(), 50);
        let universe = tickers(&["AAPL"]);

        fetcher.fetch_or_load(&universe, &Timeframe::daily(), weekday()).await;
        fetcher.fetch_or_load(&universe, &Timeframe::daily(), weekday()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_total_outage_empties_cache_entry() {
        let temp_dir = TempDir::new().unwrap();
        let (fetcher, calls) = fetcher(temp_dir.path(), 50);

        let fresh = fetcher.fetch_or_load(&tickers(&["AAPL"]), &Timeframe::daily(), weekday()).await;
        assert_eq!(fresh.len(), 1);

        let outage = fetcher.fetch_or_load(&tickers(&["FAIL"]), &Timeframe::daily(), weekday()).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(outage.is_empty());
        assert_eq!(fetcher.cache().load("1D").unwrap(), Some(MarketData::new()));
    }

    #[tokio::test]
    async fn test_as_of_is_cache_write_time_on_stale_window() {
        let temp_dir = TempDir::new().unwrap();
        let (fetcher, _calls) = fetcher(temp_dir.path(), 50);
        let universe = tickers(&["AAPL"]);

        let (_, as_of) = fetcher
            .fetch_or_load_as_of(&universe, &Timeframe::weekly(), weekday())
            .await;
        assert_eq!(as_of, weekday());

        let thursday = Utc.with_ymd_and_hms(2025, 6, 12, 15, 0, 0).unwrap();
        fs::File::options()
            .write(true)
            .open(fetcher.cache().path_for("1W"))
            .unwrap()
            .set_modified(thursday.into())
            .unwrap();

        let (_, as_of) = fetcher
            .fetch_or_load_as_of(&universe, &Timeframe::weekly(), saturday())
            .await;
        assert_eq!(as_of, thursday);
    }
}
