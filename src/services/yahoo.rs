//! Yahoo Finance chart API client
//!
//! Fetches daily/weekly history for a batch of symbols concurrently
//! (`GET /v8/finance/chart/{symbol}?interval=..&range=..`), throttled by a
//! sliding-window rate limiter shared across all requests of the client.

use chrono::{DateTime, Duration as ChronoDuration};
use futures::future::join_all;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration as StdDuration, SystemTime};
use tokio::sync::Mutex as TokioMutex;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{MarketData, PriceBar, PriceSeries, ScanConfig, Timeframe};
use crate::services::price_fetcher::PriceSource;

/// Base URL for the chart API
const BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Shared rate limiter for provider requests across all concurrent tasks
#[derive(Debug)]
pub struct SharedRateLimiter {
    /// Timestamps of recent requests (sliding window)
    request_timestamps: TokioMutex<Vec<SystemTime>>,
    /// Maximum requests allowed per minute
    rate_limit_per_minute: u32,
}

impl SharedRateLimiter {
    pub fn new(rate_limit_per_minute: u32) -> Self {
        Self {
            request_timestamps: TokioMutex::new(Vec::new()),
            rate_limit_per_minute: rate_limit_per_minute.max(1),
        }
    }

    /// Wait until a request slot is free within the last minute, then claim it
    pub async fn enforce_rate_limit(&self) {
        loop {
            let current_time = SystemTime::now();
            let mut timestamps = self.request_timestamps.lock().await;

            // Remove timestamps older than 1 minute
            timestamps.retain(|&timestamp| {
                current_time
                    .duration_since(timestamp)
                    .unwrap_or(StdDuration::from_secs(0))
                    < StdDuration::from_secs(60)
            });

            if timestamps.len() < self.rate_limit_per_minute as usize {
                timestamps.push(current_time);
                return;
            }

            let wait_time = timestamps
                .first()
                .map(|&oldest| {
                    StdDuration::from_secs(60).saturating_sub(
                        current_time
                            .duration_since(oldest)
                            .unwrap_or(StdDuration::from_secs(0)),
                    )
                })
                .unwrap_or_default();

            // Drop lock before sleeping to allow other tasks to check rate limit
            drop(timestamps);
            sleep(wait_time + StdDuration::from_millis(100)).await;
        }
    }
}

/// HTTP client for the chart API
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<SharedRateLimiter>,
}

impl YahooClient {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        Self::with_base_url(BASE_URL, config)
    }

    /// Client against a custom endpoint (proxies, mirrors)
    pub fn with_base_url(base_url: &str, config: &ScanConfig) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid base_url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            rate_limiter: Arc::new(SharedRateLimiter::new(config.rate_limit_per_minute)),
        })
    }

    /// Fetch the history of one symbol
    pub async fn get_history(&self, ticker: &str, timeframe: &Timeframe) -> Result<PriceSeries> {
        self.rate_limiter.enforce_rate_limit().await;

        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            provider_symbol(ticker)
        );
        debug!(ticker = ticker, url = %url, "Requesting chart");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("interval", timeframe.interval.to_provider_format()),
                ("range", timeframe.period.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::SymbolNotFound(format!("{}: no chart data", ticker)));
        }
        if !status.is_success() {
            return Err(Error::Provider(format!(
                "{}: provider returned status {}",
                ticker, status
            )));
        }

        let body = response.text().await?;
        parse_chart_response(&body)
    }
}

impl PriceSource for YahooClient {
    fn fetch_batch(
        &self,
        tickers: &[String],
        timeframe: &Timeframe,
    ) -> impl Future<Output = Result<MarketData>> + Send {
        let client = self.clone();
        let tickers = tickers.to_vec();
        let timeframe = timeframe.clone();

        async move {
            let requests = tickers.iter().map(|ticker| client.get_history(ticker, &timeframe));
            let results = join_all(requests).await;

            let mut data = MarketData::new();
            let mut last_error = None;

            for (ticker, result) in tickers.iter().zip(results) {
                match result {
                    Ok(series) if !series.is_empty() => {
                        data.insert(ticker.clone(), series);
                    }
                    Ok(_) => {
                        debug!(ticker = %ticker, "Provider returned no bars");
                    }
                    Err(e) => {
                        debug!(ticker = %ticker, error = %e, "Ticker fetch failed");
                        last_error = Some(e);
                    }
                }
            }

            match last_error {
                Some(e) if data.is_empty() => Err(e),
                Some(_) => {
                    warn!(
                        requested = tickers.len(),
                        received = data.len(),
                        "Batch partially fetched"
                    );
                    Ok(data)
                }
                None => Ok(data),
            }
        }
    }
}

/// Provider spelling of a symbol (class shares use '-': BRK.B -> BRK-B)
pub fn provider_symbol(ticker: &str) -> String {
    ticker.trim().replace('.', "-").to_uppercase()
}

/// Parse a chart API response into a price series
///
/// Bars are stamped with the exchange-local calendar date. Bars without a
/// close are dropped; missing open/high/low fall back to the close.
pub fn parse_chart_response(body: &str) -> Result<PriceSeries> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        return Err(Error::SymbolNotFound(format!(
            "{}: {}",
            error.code.unwrap_or_default(),
            error.description.unwrap_or_default()
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| Error::Parse("chart response has no result".to_string()))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = ChronoDuration::seconds(result.meta.gmtoffset);

    let mut series = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let close = match quote.close.get(i).copied().flatten() {
            Some(close) => close,
            None => continue,
        };

        let time = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| Error::Parse(format!("invalid timestamp {}", ts)))?;
        let date = (time + offset).date_naive();

        let field = |values: &Vec<Option<f64>>| values.get(i).copied().flatten().unwrap_or(close);
        series.push(PriceBar::new(
            date,
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            close,
            quote.volume.get(i).copied().flatten().unwrap_or(0),
        ));
    }

    Ok(series)
}
