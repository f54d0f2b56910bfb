use chrono::Utc;

use crate::constants::DAILY_CACHE_KEY;
use crate::error::Result;
use crate::models::{ScanConfig, WyckoffResult};
use crate::services::{PriceCache, ReportWriter, Scanner};

use super::scan::load_universes;

pub fn run(config: ScanConfig) {
    println!("💪 Wyckoff \"Sign of Strength\" Screener\n");

    match run_wyckoff(&config) {
        Ok(result) => print_matches(&result),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_wyckoff(config: &ScanConfig) -> Result<WyckoffResult> {
    let (universe, _) = load_universes(config)?;
    let cache = PriceCache::new(config.cache_dir.clone());

    if !cache.exists(DAILY_CACHE_KEY) {
        println!(
            "⚠️  No daily cache at {}. Run 'marketscan scan' first.",
            cache.path_for(DAILY_CACHE_KEY).display()
        );
    }

    let result = Scanner::new(&universe).run_wyckoff(&cache);

    let page = ReportWriter::new(config.docs_dir.clone()).write_wyckoff(&result, Utc::now())?;
    println!("📝 {}\n", page.display());

    Ok(result)
}

fn print_matches(result: &WyckoffResult) {
    if result.matches.is_empty() {
        println!("No Wyckoff candidates found today.");
        return;
    }

    println!("Found {} Wyckoff candidates:\n", result.matches.len());
    println!(
        "   {:<8} {:>10} {:>9}  {:<24} {}",
        "Ticker", "Price", "Change", "Sector", "Industry"
    );
    for m in &result.matches {
        println!(
            "   {:<8} {:>10.2} {:>+8.2}%  {:<24} {}",
            m.ticker, m.last_close, m.percent_change, m.sector, m.industry
        );
    }
}
