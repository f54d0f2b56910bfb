use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::commands;
use crate::models::ScanConfig;
use crate::utils::{get_cache_dir, get_docs_dir, get_reference_dir};

#[derive(Parser)]
#[command(name = "marketscan")]
#[command(about = "DeMark 9/13 and Wyckoff breakout scanner", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub dirs: DirArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Directory overrides (default: MARKETSCAN_* env vars, then built-in paths)
#[derive(Args)]
pub struct DirArgs {
    /// Directory holding price_cache_<KEY>.csv files
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Directory the HTML report is written to
    #[arg(long, global = true)]
    pub docs_dir: Option<PathBuf>,

    /// Directory holding the ticker reference CSV files
    #[arg(long, global = true)]
    pub reference_dir: Option<PathBuf>,
}

impl DirArgs {
    pub fn to_config(&self) -> ScanConfig {
        ScanConfig::new(
            self.cache_dir.clone().unwrap_or_else(get_cache_dir),
            self.docs_dir.clone().unwrap_or_else(get_docs_dir),
            self.reference_dir.clone().unwrap_or_else(get_reference_dir),
        )
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the daily, weekly and sector DeMark scans, the Wyckoff scan and write the report
    Scan {
        /// Tickers per provider batch
        #[arg(long, default_value_t = crate::constants::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Pause between provider batches in milliseconds
        #[arg(long, default_value_t = crate::constants::DEFAULT_BATCH_PAUSE_MS)]
        batch_pause_ms: u64,

        /// Skip the Fear & Greed index fetch
        #[arg(long)]
        skip_fear_greed: bool,
    },
    /// Run only the Wyckoff scan over the cached daily data
    Wyckoff,
    /// Show reference tables, cache contents and sentiment history
    Status,
}

pub fn run() {
    let cli = Cli::parse();
    let config = cli.dirs.to_config();

    match cli.command {
        Commands::Scan {
            batch_size,
            batch_pause_ms,
            skip_fear_greed,
        } => {
            let config = config
                .with_batch_size(batch_size)
                .with_batch_pause(Duration::from_millis(batch_pause_ms));
            commands::scan::run(config, skip_fear_greed);
        }
        Commands::Wyckoff => {
            commands::wyckoff::run(config);
        }
        Commands::Status => {
            commands::status::run(config);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan_flags() {
        let cli = Cli::try_parse_from([
            "marketscan",
            "scan",
            "--batch-size",
            "25",
            "--skip-fear-greed",
            "--cache-dir",
            "/tmp/cache",
        ])
        .unwrap();

        assert_eq!(cli.dirs.cache_dir, Some(PathBuf::from("/tmp/cache")));
        match cli.command {
            Commands::Scan {
                batch_size,
                batch_pause_ms,
                skip_fear_greed,
            } => {
                assert_eq!(batch_size, 25);
                assert_eq!(batch_pause_ms, crate::constants::DEFAULT_BATCH_PAUSE_MS);
                assert!(skip_fear_greed);
            }
            _ => panic!("expected scan command"),
        }
    }

    #[test]
    fn test_dir_overrides_reach_config() {
        let cli = Cli::try_parse_from([
            "marketscan",
            "--reference-dir",
            "/data/refs",
            "--docs-dir",
            "/srv/www",
            "status",
        ])
        .unwrap();

        let config = cli.dirs.to_config();
        assert_eq!(config.docs_dir, PathBuf::from("/srv/www"));
        assert_eq!(config.sector_file, PathBuf::from("/data/refs/sectors_cache.csv"));
        assert!(matches!(cli.command, Commands::Status));
    }
}
