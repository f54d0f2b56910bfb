pub mod aggregator;
pub mod demark;
pub mod fear_greed;
pub mod market_clock;
pub mod price_cache;
pub mod price_fetcher;
pub mod report;
pub mod scanner;
pub mod wyckoff;
pub mod yahoo;

pub use aggregator::{sector_trends, SectorTrend, SignalAggregator};
pub use fear_greed::{FearGreedClient, FearGreedRecord, FearGreedSnapshot};
pub use market_clock::MarketHours;
pub use price_cache::{CacheSummary, PriceCache};
pub use price_fetcher::{PriceFetcher, PriceSource};
pub use report::{Dashboard, ReportWriter};
pub use scanner::Scanner;
pub use yahoo::YahooClient;
