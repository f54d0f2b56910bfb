use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_BATCH_PAUSE_MS, DEFAULT_BATCH_SIZE, DEFAULT_RATE_LIMIT_PER_MINUTE,
    DEFAULT_REQUEST_TIMEOUT_SECS, FEAR_GREED_HISTORY_FILE, SECTOR_REFERENCE_FILE, UNIVERSE_REFERENCE_FILES,
};
use crate::utils::{get_cache_dir, get_docs_dir, get_reference_dir};

/// Configuration for one scanner run
///
/// Built once at startup (env vars, then CLI overrides) and shared read-only.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory holding `price_cache_<KEY>.csv` files
    pub cache_dir: PathBuf,

    /// Directory the HTML report is written to
    pub docs_dir: PathBuf,

    /// Reference tables making up the equity universe, in load order
    pub universe_files: Vec<PathBuf>,

    /// Reference table of the sector ETF universe
    pub sector_file: PathBuf,

    /// Sentiment history CSV, appended once per run
    pub fear_greed_history: PathBuf,

    /// Tickers per provider batch
    pub batch_size: usize,

    /// Pause between provider batches
    pub batch_pause: Duration,

    /// Provider requests allowed per minute
    pub rate_limit_per_minute: u32,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let reference_dir = get_reference_dir();
        Self {
            cache_dir: get_cache_dir(),
            docs_dir: get_docs_dir(),
            universe_files: UNIVERSE_REFERENCE_FILES
                .iter()
                .map(|file| reference_dir.join(file))
                .collect(),
            sector_file: reference_dir.join(SECTOR_REFERENCE_FILE),
            fear_greed_history: reference_dir.join(FEAR_GREED_HISTORY_FILE),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: Duration::from_millis(DEFAULT_BATCH_PAUSE_MS),
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ScanConfig {
    /// Create config with explicit directories, defaults elsewhere
    pub fn new(cache_dir: PathBuf, docs_dir: PathBuf, reference_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            docs_dir,
            universe_files: UNIVERSE_REFERENCE_FILES
                .iter()
                .map(|file| reference_dir.join(file))
                .collect(),
            sector_file: reference_dir.join(SECTOR_REFERENCE_FILE),
            fear_greed_history: reference_dir.join(FEAR_GREED_HISTORY_FILE),
            ..Self::default()
        }
    }

    /// Override the batch size (0 is treated as 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }
}
