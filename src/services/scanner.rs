//! Batch scan pipeline
//!
//! Walks a ticker universe in symbol order, applies an evaluator to each
//! ticker's series and aggregates the matches. A bad series never aborts a
//! scan: it is turned into a [`SkipReason`], counted on [`ScanStats`] and
//! logged at debug level.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::constants::DAILY_CACHE_KEY;
use crate::models::{
    closes, Interval, MarketData, PriceBar, ScanResult, ScanStats, SignalMatch, SkipReason,
    TickerReference, Timeframe, WyckoffMatch, WyckoffResult,
};
use crate::services::aggregator::{sort_wyckoff, SignalAggregator};
use crate::services::market_clock::weekly_bar_is_final;
use crate::services::price_cache::PriceCache;
use crate::services::price_fetcher::{PriceFetcher, PriceSource};
use crate::services::{demark, wyckoff};

/// Finality predicate for intervals whose last bar is always closed
pub fn all_bars_final(_bar: &PriceBar) -> bool {
    true
}

/// Reject series no evaluator can use
fn validate_series(series: &[PriceBar]) -> Result<(), SkipReason> {
    if series.is_empty() {
        return Err(SkipReason::EmptySeries);
    }
    if series.iter().any(|bar| !bar.is_valid()) {
        return Err(SkipReason::MalformedBar);
    }
    Ok(())
}

/// Drop the most recent bar when it is still forming
fn completed_bars<'s, F>(series: &'s [PriceBar], bar_is_final: &F) -> &'s [PriceBar]
where
    F: Fn(&PriceBar) -> bool,
{
    match series.last() {
        Some(last) if !bar_is_final(last) => &series[..series.len() - 1],
        _ => series,
    }
}

/// Scans a ticker universe against its reference classification
pub struct Scanner<'a> {
    reference: &'a TickerReference,
}

impl<'a> Scanner<'a> {
    pub fn new(reference: &'a TickerReference) -> Self {
        Self { reference }
    }

    /// Run the DeMark evaluator over every universe ticker present in `data`
    ///
    /// # Arguments
    /// * `data` - Price series per ticker (tickers outside the universe are ignored)
    /// * `timeframe` - Timeframe the data was fetched for
    /// * `bar_is_final` - Whether a series' last bar is closed; unfinished bars are dropped
    /// * `today` - Candle date reported when no ticker could be evaluated
    ///
    /// # Returns
    /// * Matches per bucket sorted by ticker, sector tallies, the latest
    ///   evaluated bar date and skip statistics
    pub fn scan_timeframe<F>(
        &self,
        data: &MarketData,
        timeframe: &Timeframe,
        bar_is_final: F,
        today: NaiveDate,
    ) -> ScanResult
    where
        F: Fn(&PriceBar) -> bool,
    {
        let mut aggregator = SignalAggregator::new();
        let mut stats = ScanStats {
            tickers_requested: self.reference.len(),
            ..ScanStats::default()
        };
        let mut candle_date: Option<NaiveDate> = None;

        for ticker in self.reference.tickers() {
            let series = match data.get(&ticker) {
                Some(series) => series,
                None => {
                    stats.missing_data += 1;
                    continue;
                }
            };

            let bars = completed_bars(series, &bar_is_final);
            match self.evaluate_demark(&ticker, bars, timeframe) {
                Ok((matches, last_date)) => {
                    stats.tickers_evaluated += 1;
                    candle_date = candle_date.max(Some(last_date));

                    let sector = self.reference.sector(&ticker);
                    for signal_match in matches {
                        aggregator.record(signal_match, sector);
                    }
                }
                Err(reason) => {
                    debug!(ticker = %ticker, reason = %reason, "Skipping ticker");
                    stats.record_skip(reason);
                }
            }
        }

        let result = aggregator.finish(&timeframe.label, candle_date.unwrap_or(today), stats);

        info!(
            label = %timeframe.label,
            tops = result.tops.len(),
            bottoms = result.bottoms.len(),
            evaluated = result.stats.tickers_evaluated,
            missing = result.stats.missing_data,
            skipped = result.stats.skipped_total(),
            candle_date = %result.candle_date,
            "DeMark scan completed"
        );

        result
    }

    /// Matches for one ticker plus the date of the bar evaluated
    fn evaluate_demark(
        &self,
        ticker: &str,
        bars: &[PriceBar],
        timeframe: &Timeframe,
    ) -> Result<(Vec<SignalMatch>, NaiveDate), SkipReason> {
        validate_series(bars)?;
        let last = bars.last().ok_or(SkipReason::EmptySeries)?;

        let industry = if timeframe.is_sector_scan() {
            self.reference.sector(ticker)
        } else {
            self.reference.industry(ticker)
        };

        let matches = demark::evaluate(&closes(bars))
            .labels()
            .into_iter()
            .map(|signal| SignalMatch {
                ticker: ticker.to_string(),
                last_close: last.close,
                signal,
                industry: industry.to_string(),
            })
            .collect();

        Ok((matches, last.date))
    }

    /// Run the Wyckoff evaluator over every universe ticker present in `data`
    pub fn scan_wyckoff(&self, data: &MarketData) -> WyckoffResult {
        let mut matches = Vec::new();
        let mut stats = ScanStats {
            tickers_requested: self.reference.len(),
            ..ScanStats::default()
        };

        for ticker in self.reference.tickers() {
            let series = match data.get(&ticker) {
                Some(series) => series,
                None => {
                    stats.missing_data += 1;
                    continue;
                }
            };

            match self.evaluate_wyckoff(&ticker, series) {
                Ok(found) => {
                    stats.tickers_evaluated += 1;
                    matches.extend(found);
                }
                Err(reason) => {
                    debug!(ticker = %ticker, reason = %reason, "Skipping ticker");
                    stats.record_skip(reason);
                }
            }
        }

        sort_wyckoff(&mut matches);

        info!(
            matches = matches.len(),
            evaluated = stats.tickers_evaluated,
            skipped = stats.skipped_total(),
            "Wyckoff scan completed"
        );

        WyckoffResult { matches, stats }
    }

    fn evaluate_wyckoff(
        &self,
        ticker: &str,
        series: &[PriceBar],
    ) -> Result<Option<WyckoffMatch>, SkipReason> {
        validate_series(series)?;
        let last = series.last().ok_or(SkipReason::EmptySeries)?;

        let percent_change = match wyckoff::sign_of_strength(&closes(series))? {
            Some(change) => change,
            None => return Ok(None),
        };

        Ok(Some(WyckoffMatch {
            ticker: ticker.to_string(),
            last_close: last.close,
            sector: self.reference.sector(ticker).to_string(),
            industry: self.reference.industry(ticker).to_string(),
            percent_change,
        }))
    }

    /// Fetch (or load) a timeframe and scan it
    ///
    /// Weekly bars of a week still in progress when the data was obtained are
    /// not evaluated; for cached data that is the cache write time, not `now`.
    pub async fn run_timeframe<S: PriceSource>(
        &self,
        fetcher: &PriceFetcher<S>,
        timeframe: &Timeframe,
        now: DateTime<Utc>,
    ) -> ScanResult {
        let tickers = self.reference.tickers();
        info!(tickers = tickers.len(), timeframe = %timeframe, "Scanning timeframe");

        let (data, as_of) = fetcher.fetch_or_load_as_of(&tickers, timeframe, now).await;
        let today = now.date_naive();

        match timeframe.interval {
            Interval::Weekly => self.scan_timeframe(
                &data,
                timeframe,
                |bar: &PriceBar| weekly_bar_is_final(bar.date, as_of),
                today,
            ),
            Interval::Daily => self.scan_timeframe(&data, timeframe, all_bars_final, today),
        }
    }

    /// Wyckoff scan over the cached daily data (never fetches)
    ///
    /// A missing or unreadable daily cache yields an empty result.
    pub fn run_wyckoff(&self, cache: &PriceCache) -> WyckoffResult {
        match cache.load(DAILY_CACHE_KEY) {
            Ok(Some(data)) => self.scan_wyckoff(&data),
            Ok(None) => {
                warn!(
                    file = %cache.path_for(DAILY_CACHE_KEY).display(),
                    "No daily cache found. Run the DeMark scan first."
                );
                WyckoffResult::default()
            }
            Err(e) => {
                warn!(error = %e, "Daily cache unreadable, Wyckoff scan skipped");
                WyckoffResult::default()
            }
        }
    }
}
