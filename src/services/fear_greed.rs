//! CNN Fear & Greed sentiment index
//!
//! One snapshot is fetched per run and appended to a CSV history
//! (`Date,Index,Previous Close`) that feeds the report's trend table.

use chrono::{DateTime, Duration, NaiveDate};
use fs2::FileExt;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration as StdDuration;
use tracing::{info, warn};

use crate::error::{Error, Result};

const FEAR_GREED_URL: &str = "https://production.dataviz.cnn.io/index/fearandgreed/graphdata";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

const REFERER: &str = "https://edition.cnn.com/";

const REQUEST_TIMEOUT_SECS: u64 = 10;

const HISTORY_HEADERS: [&str; 3] = ["Date", "Index", "Previous Close"];

#[derive(Debug, Default, Deserialize)]
struct GraphData {
    #[serde(default)]
    fear_and_greed: IndexData,
}

#[derive(Debug, Default, Deserialize)]
struct IndexData {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    previous_close: f64,
    timestamp: Option<serde_json::Value>,
}

/// Index reading for one day; every field is `None` when the fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FearGreedSnapshot {
    pub value: Option<i64>,
    pub previous_close: Option<i64>,
    pub date: Option<NaiveDate>,
}

impl FearGreedSnapshot {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }

    pub fn value_label(&self) -> String {
        label(self.value)
    }

    pub fn previous_label(&self) -> String {
        label(self.previous_close)
    }

    pub fn date_label(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

fn label(value: Option<i64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// One row of the history file
#[derive(Debug, Clone, PartialEq)]
pub struct FearGreedRecord {
    pub date: NaiveDate,
    pub index: f64,
    pub previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Index")]
    index: Option<f64>,
    #[serde(rename = "Previous Close")]
    previous_close: Option<f64>,
}

/// Parse the graph data payload
///
/// Scores are rounded half-to-even. A missing or non-string timestamp dates
/// the snapshot `today`.
pub fn parse_graph_data(body: &str, today: NaiveDate) -> Result<FearGreedSnapshot> {
    let data: GraphData = serde_json::from_str(body)?;
    let index = data.fear_and_greed;

    let date = match index.timestamp.as_ref().and_then(|ts| ts.as_str()) {
        Some(ts) => DateTime::parse_from_rfc3339(ts)
            .map_err(|e| Error::Parse(format!("invalid timestamp '{}': {}", ts, e)))?
            .date_naive(),
        None => today,
    };

    Ok(FearGreedSnapshot {
        value: Some(index.score.round_ties_even() as i64),
        previous_close: Some(index.previous_close.round_ties_even() as i64),
        date: Some(date),
    })
}

/// HTTP client for the sentiment endpoint
pub struct FearGreedClient {
    client: reqwest::Client,
    url: String,
}

impl FearGreedClient {
    pub fn new() -> Result<Self> {
        Self::with_url(FEAR_GREED_URL)
    }

    pub fn with_url(url: &str) -> Result<Self> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid sentiment url: must start with http:// or https://, got: '{}'",
                url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub async fn fetch(&self, today: NaiveDate) -> Result<FearGreedSnapshot> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::REFERER, REFERER)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Provider(format!(
                "Fear & Greed endpoint returned status {}",
                status
            )));
        }

        let body = response.text().await?;
        parse_graph_data(&body, today)
    }

    /// Fetch today's reading and append it to `history_path`
    ///
    /// A failed fetch yields [`FearGreedSnapshot::unavailable`]; a failed
    /// history write is logged and the snapshot is still returned.
    pub async fn snapshot(&self, history_path: &Path, today: NaiveDate) -> FearGreedSnapshot {
        let snapshot = match self.fetch(today).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Error fetching Fear & Greed index");
                return FearGreedSnapshot::unavailable();
            }
        };

        if let Err(e) = append_history(history_path, &snapshot) {
            warn!(file = %history_path.display(), error = %e, "Failed to append sentiment history");
        }

        info!(
            value = %snapshot.value_label(),
            previous = %snapshot.previous_label(),
            date = %snapshot.date_label(),
            "Fear & Greed index fetched"
        );

        snapshot
    }
}

/// Append a snapshot row, writing the header first when the file is new or empty
///
/// Unavailable snapshots are not recorded.
pub fn append_history(path: &Path, snapshot: &FearGreedSnapshot) -> Result<()> {
    let (value, previous, date) = match (snapshot.value, snapshot.previous_close, snapshot.date) {
        (Some(value), Some(previous), Some(date)) => (value, previous, date),
        _ => return Ok(()),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::Io(format!("Failed to open {} for append: {}", path.display(), e)))?;

    file.lock_exclusive()
        .map_err(|e| Error::Io(format!("Failed to acquire lock on {}: {}", path.display(), e)))?;

    let is_empty = file.metadata()?.len() == 0;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(&file);

    if is_empty {
        wtr.write_record(HISTORY_HEADERS)?;
    }
    wtr.write_record([
        date.format("%Y-%m-%d").to_string(),
        value.to_string(),
        previous.to_string(),
    ])?;
    wtr.flush()?;

    Ok(())
}

/// Load history rows dated within `days` of `today`, oldest first
///
/// A missing file is an empty history. Rows with an unparsable date or
/// index are dropped.
pub fn load_history(path: &Path, today: NaiveDate, days: i64) -> Result<Vec<FearGreedRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let cutoff = today - Duration::days(days);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records: Vec<FearGreedRecord> = reader
        .deserialize::<HistoryRow>()
        .filter_map(|row| row.ok())
        .filter_map(|row| {
            let date = parse_history_date(&row.date)?;
            Some(FearGreedRecord {
                date,
                index: row.index?,
                previous_close: row.previous_close,
            })
        })
        .filter(|record| record.date >= cutoff)
        .collect();

    records.sort_by_key(|record| record.date);
    Ok(records)
}

/// Accepts `YYYY-MM-DD` optionally followed by a time part
fn parse_history_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
