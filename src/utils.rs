use std::path::PathBuf;

/// Get price cache directory from environment variable or use default
pub fn get_cache_dir() -> PathBuf {
    std::env::var("MARKETSCAN_CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("cache"))
}

/// Get report output directory from environment variable or use default
pub fn get_docs_dir() -> PathBuf {
    std::env::var("MARKETSCAN_DOCS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("docs"))
}

/// Get directory holding the ticker reference CSV files
pub fn get_reference_dir() -> PathBuf {
    std::env::var("MARKETSCAN_REFERENCE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Format an integer with thousands separators (12345 -> "12,345")
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}
