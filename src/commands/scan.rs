use chrono::Utc;
use std::time::Instant;
use tracing::warn;

use crate::constants::FEAR_GREED_TREND_DAYS;
use crate::error::{Error, Result};
use crate::models::{ScanConfig, ScanResult, TickerReference, Timeframe};
use crate::services::fear_greed::load_history;
use crate::services::{
    sector_trends, Dashboard, FearGreedClient, FearGreedSnapshot, PriceCache, PriceFetcher,
    ReportWriter, Scanner, YahooClient,
};

pub fn run(config: ScanConfig, skip_fear_greed: bool) {
    let start_time = Instant::now();
    println!("⏳ Starting Dashboard Generator");

    match run_scan(&config, skip_fear_greed) {
        Ok(()) => {
            println!(
                "\n✅ All Done! Open {} or {}",
                config.docs_dir.join(crate::services::report::DASHBOARD_FILE).display(),
                config.docs_dir.join(crate::services::report::WYCKOFF_FILE).display()
            );
            println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
        }
        Err(e) => {
            eprintln!("\n❌ Scan failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Load the equity and sector ETF universes
pub fn load_universes(config: &ScanConfig) -> Result<(TickerReference, TickerReference)> {
    let universe = TickerReference::load_all(&config.universe_files);
    let sectors = TickerReference::load_or_empty(&config.sector_file);

    if universe.is_empty() && sectors.is_empty() {
        return Err(Error::Config(format!(
            "No ticker reference files found (looked for {} and {})",
            config
                .universe_files
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            config.sector_file.display()
        )));
    }

    Ok((universe, sectors))
}

fn print_scan(result: &ScanResult) {
    println!(
        "   {:<7} {} tops, {} bottoms ({} of {} tickers evaluated, candle {})",
        result.label,
        result.tops.len(),
        result.bottoms.len(),
        result.stats.tickers_evaluated,
        result.stats.tickers_requested,
        result.candle_date
    );
    if result.stats.missing_data > 0 || result.stats.skipped_total() > 0 {
        println!(
            "           ⚠️  {} without data, {} skipped",
            result.stats.missing_data,
            result.stats.skipped_total()
        );
    }
}

fn run_scan(config: &ScanConfig, skip_fear_greed: bool) -> Result<()> {
    let (universe, sectors) = load_universes(config)?;
    println!(
        "📋 Universe: {} tickers, {} sector ETFs",
        universe.len(),
        sectors.len()
    );

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Runtime(format!("Failed to create runtime: {}", e)))?;

    let now = Utc::now();
    let today = now.date_naive();
    let client = YahooClient::new(config)?;
    let fetcher = PriceFetcher::new(client, PriceCache::new(config.cache_dir.clone()), config);

    let scanner = Scanner::new(&universe);
    let sector_scanner = Scanner::new(&sectors);

    println!("\n--- Running DeMark Scans ---");
    let (daily, weekly, sector_result, fear_greed) = runtime.block_on(async {
        let daily = scanner.run_timeframe(&fetcher, &Timeframe::daily(), now).await;
        print_scan(&daily);

        let weekly = scanner.run_timeframe(&fetcher, &Timeframe::weekly(), now).await;
        print_scan(&weekly);

        let sector_result = sector_scanner
            .run_timeframe(&fetcher, &Timeframe::sector(), now)
            .await;
        print_scan(&sector_result);

        let fear_greed = if skip_fear_greed {
            FearGreedSnapshot::unavailable()
        } else {
            match FearGreedClient::new() {
                Ok(client) => client.snapshot(&config.fear_greed_history, today).await,
                Err(e) => {
                    warn!(error = %e, "Sentiment client unavailable");
                    FearGreedSnapshot::unavailable()
                }
            }
        };

        (daily, weekly, sector_result, fear_greed)
    });

    // Reads the daily cache persisted by the scan above
    println!("\n--- Running Wyckoff Scans ---");
    let wyckoff = scanner.run_wyckoff(fetcher.cache());
    println!("Found {} Wyckoff candidates.", wyckoff.matches.len());

    if fear_greed.is_available() {
        println!(
            "\n😨 Fear & Greed: {} (Prev: {})",
            fear_greed.value_label(),
            fear_greed.previous_label()
        );
    } else if !skip_fear_greed {
        println!("\n⚠️  Fear & Greed index unavailable");
    }

    let history = load_history(&config.fear_greed_history, today, FEAR_GREED_TREND_DAYS)
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read sentiment history");
            Vec::new()
        });
    let trends = sector_trends(&daily, &weekly);

    println!("\n--- Generating HTML ---");
    let writer = ReportWriter::new(config.docs_dir.clone());
    let generated_at = Utc::now();
    let dashboard = Dashboard {
        daily: &daily,
        weekly: &weekly,
        sectors: &sector_result,
        sector_trends: &trends,
        fear_greed: &fear_greed,
        fear_greed_history: &history,
        generated_at,
    };

    let index = writer.write_dashboard(&dashboard)?;
    println!("📝 {}", index.display());
    let wyckoff_page = writer.write_wyckoff(&wyckoff, generated_at)?;
    println!("📝 {}", wyckoff_page.display());

    Ok(())
}
