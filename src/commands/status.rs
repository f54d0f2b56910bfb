use crate::constants::FEAR_GREED_TREND_DAYS;
use crate::error::Result;
use crate::models::{ScanConfig, TickerReference};
use crate::services::fear_greed::load_history;
use crate::services::PriceCache;
use crate::utils::format_number;

pub fn run(config: ScanConfig) {
    println!("📊 Scanner Status\n");

    if let Err(e) = show_status(&config) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn show_status(config: &ScanConfig) -> Result<()> {
    println!("═══════════════════════════════════════════════════════════\n");
    show_references(config);

    println!("\n═══════════════════════════════════════════════════════════\n");
    show_cache(config)?;

    println!("\n═══════════════════════════════════════════════════════════\n");
    show_fear_greed(config);

    Ok(())
}

fn show_references(config: &ScanConfig) {
    println!("📋 Reference tables");

    let mut universe = TickerReference::new();
    for path in &config.universe_files {
        if !path.exists() {
            println!("   {:<22} missing", file_name(path));
            continue;
        }
        match TickerReference::from_csv(path) {
            Ok(reference) => {
                println!(
                    "   {:<22} {:>8} tickers",
                    file_name(path),
                    format_number(reference.len())
                );
                universe.merge(reference);
            }
            Err(e) => println!("   {:<22} ⚠️  {}", file_name(path), e),
        }
    }

    let sectors = TickerReference::load_or_empty(&config.sector_file);
    println!(
        "   {:<22} {:>8} tickers",
        file_name(&config.sector_file),
        format_number(sectors.len())
    );

    println!("\n   Universe: {} unique tickers", format_number(universe.len()));
    for (sector, count) in universe.sector_sizes() {
        println!("      {:<28} {:>6}", sector, format_number(count));
    }
}

fn show_cache(config: &ScanConfig) -> Result<()> {
    let cache = PriceCache::new(config.cache_dir.clone());
    println!("💾 Price cache ({})", cache.dir().display());

    let keys = cache.keys()?;
    if keys.is_empty() {
        println!("   ⚠️  No cached data. Run 'scan' first.");
        return Ok(());
    }

    for key in keys {
        match cache.summary(&key) {
            Ok(Some(summary)) => {
                let range = match (summary.first_date, summary.last_date) {
                    (Some(first), Some(last)) => format!("{} → {}", first, last),
                    _ => "empty".to_string(),
                };
                println!(
                    "   {:<7} {:>6} tickers {:>10} bars  ({})",
                    summary.key,
                    format_number(summary.tickers),
                    format_number(summary.bars),
                    range
                );
            }
            Ok(None) => println!("   {:<7} missing", key),
            Err(e) => println!("   {:<7} ⚠️  {}", key, e),
        }
    }

    Ok(())
}

fn show_fear_greed(config: &ScanConfig) {
    let today = chrono::Utc::now().date_naive();
    match load_history(&config.fear_greed_history, today, FEAR_GREED_TREND_DAYS) {
        Ok(history) => match history.last() {
            Some(latest) => println!(
                "😨 Fear & Greed: {:.0} on {} ({} entries in the last {} days)",
                latest.index,
                latest.date,
                history.len(),
                FEAR_GREED_TREND_DAYS
            ),
            None => println!("😨 Fear & Greed: no recent history"),
        },
        Err(e) => println!("😨 Fear & Greed: ⚠️  {}", e),
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
