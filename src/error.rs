//! Crate-wide error type
//!
//! Per-ticker data problems are not errors; they are reported as
//! `SkipReason`s on the scan statistics. `AppError` covers setup, I/O and
//! provider failures.

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AppError {
    /// Bad directories, reference tables or client settings
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    /// Malformed cache, reference or history CSV
    #[error("CSV error: {0}")]
    Csv(String),

    /// Transport failure or unexpected status from a data provider
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider has no data for the symbol (delisted, renamed, typo)
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Provider rate limit exceeded")]
    RateLimited,

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Provider(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

pub type Error = AppError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_errors_map_to_csv_variant() {
        // unequal record lengths are rejected by a non-flexible reader
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader("a,b\nc\n".as_bytes());
        let err = reader.records().find_map(|r| r.err()).map(AppError::from);

        assert!(matches!(err, Some(AppError::Csv(_))));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            AppError::SymbolNotFound("ZZZZ".to_string()).to_string(),
            "Symbol not found: ZZZZ"
        );
        assert_eq!(AppError::RateLimited.to_string(), "Provider rate limit exceeded");
    }
}
