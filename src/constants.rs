//! Scanner Constants
//!
//! Lookbacks, thresholds and file layout shared by the evaluators, the scan
//! pipeline and the commands.

/// Bars back used by the sequential counter comparison (close vs close 4 bars ago)
pub const SEQUENTIAL_LOOKBACK: usize = 4;

/// Re-based count that marks a DeMark setup (9)
pub const DEMARK_SETUP_COUNT: i64 = 9;

/// Re-based count that marks a DeMark countdown (13)
pub const DEMARK_COUNTDOWN_COUNT: i64 = 13;

/// Minimum bars before the DeMark evaluator reports anything
///
/// The counter math only needs 5 bars; 20 keeps thinly traded or freshly
/// listed tickers out of the report.
pub const DEMARK_MIN_BARS: usize = 20;

/// Minimum bars before the Wyckoff evaluator reports anything
pub const WYCKOFF_MIN_BARS: usize = 35;

/// Prior bars (excluding the current one) the breakout must clear
pub const WYCKOFF_BREAKOUT_WINDOW: usize = 30;

/// Trailing bars inspected for the momentum streak
pub const WYCKOFF_STREAK_BARS: usize = 5;

/// Up-closes required within the streak window (strictly more than this)
pub const WYCKOFF_STREAK_THRESHOLD: usize = 4;

/// Placeholder used for missing sector/industry classification
pub const UNKNOWN_CLASSIFICATION: &str = "Unknown";

/// Tickers per provider batch
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Pause between provider batches, in milliseconds
pub const DEFAULT_BATCH_PAUSE_MS: u64 = 500;

/// Provider requests allowed per minute across all concurrent tasks
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 600;

/// Per-request HTTP timeout, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Cache key the Wyckoff scan reads (written by the daily DeMark scan)
pub const DAILY_CACHE_KEY: &str = "1D";

/// Timeframe label of the sector ETF scan
pub const SECTOR_LABEL: &str = "Sector";

/// Reference tables making up the equity universe, loaded in order
/// (later files override earlier ones for duplicate symbols)
pub const UNIVERSE_REFERENCE_FILES: &[&str] = &[
    "sp_cache.csv",
    "russell_cache.csv",
    "nasdaq_cache.csv",
    "NDQ_cache.csv",
    "AMEX_cache.csv",
    "NYSE_cache.csv",
];

/// Reference table of the sector ETF universe
pub const SECTOR_REFERENCE_FILE: &str = "sectors_cache.csv";

/// Sentiment history file (appended once per run)
pub const FEAR_GREED_HISTORY_FILE: &str = "fear_and_greed_history.csv";

/// Days of sentiment history shown in the report
pub const FEAR_GREED_TREND_DAYS: i64 = 120;
