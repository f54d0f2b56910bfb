mod price_bar;
mod scan_config;
mod scan_result;
mod signal;
mod ticker_reference;
mod timeframe;
pub mod indicators;

pub use price_bar::{closes, PriceBar};
pub use scan_config::ScanConfig;
pub use scan_result::{ScanResult, ScanStats, SectorTally, SkipReason, WyckoffResult};
pub use signal::{Bucket, DeMarkFlags, SignalLabel, SignalMatch, WyckoffMatch};
pub use ticker_reference::{TickerInfo, TickerReference};
pub use timeframe::{Interval, Timeframe};

use std::collections::BTreeMap;

/// Price history of a single ticker, oldest bar first
pub type PriceSeries = Vec<PriceBar>;

/// Price histories keyed by ticker, iterated in symbol order
pub type MarketData = BTreeMap<String, PriceSeries>;
