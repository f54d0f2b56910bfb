//! Static HTML report
//!
//! Two pages under the docs directory: `index.html` (DeMark dashboard with
//! sentiment, sector ETFs and sector trends) and `wyckoff.html`. Tables are
//! sortable client-side by clicking a header.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Bucket, ScanResult, ScanStats, SignalMatch, WyckoffMatch, WyckoffResult};
use crate::services::aggregator::SectorTrend;
use crate::services::fear_greed::{FearGreedRecord, FearGreedSnapshot};

pub const DASHBOARD_FILE: &str = "index.html";
pub const WYCKOFF_FILE: &str = "wyckoff.html";

const COMMON_CSS: &str = r#"
    <style>
        body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 0; padding: 20px; background-color: #f9f9f9; }
        h1, h2, h3 { color: #2c3e50; }
        .nav-bar { background-color: #34495e; padding: 15px; border-radius: 8px; margin-bottom: 25px; display: flex; gap: 20px; }
        .nav-bar a { color: white; text-decoration: none; font-weight: bold; font-size: 1.1em; padding: 5px 10px; border-radius: 4px; transition: background 0.3s;}
        .nav-bar a:hover, .nav-bar a.active { background-color: #1abc9c; }

        table { width: 100%; border-collapse: collapse; background: white; box-shadow: 0 1px 3px rgba(0,0,0,0.1); margin-bottom: 30px; }
        th, td { padding: 12px; text-align: left; border-bottom: 1px solid #ddd; }
        th { background-color: #ecf0f1; cursor: pointer; }
        tr:hover { background-color: #f1f1f1; }

        .tag { padding: 4px 8px; border-radius: 4px; font-weight: bold; font-size: 0.9em; display: inline-block; }
        .tag-top { background-color: #ffcccc; color: #a94442; }
        .tag-bot { background-color: #d0e9c6; color: #3c763d; }
        .tag-wyckoff { background-color: #d9edf7; color: #31708f; border: 1px solid #bce8f1; }

        .grid-container { display: flex; flex-wrap: wrap; gap: 20px; }
        .col { flex: 1; min-width: 300px; }
        .meta { color: #7f8c8d; font-size: 0.9em; }

        th.asc::after { content: " ▲"; color: #777; font-size: 0.8em;}
        th.desc::after { content: " ▼"; color: #777; font-size: 0.8em;}
    </style>
"#;

const SORT_SCRIPT: &str = r#"
    <script>
    document.querySelectorAll("table").forEach(table => {
        table.querySelectorAll("th").forEach((header, i) => {
            header.addEventListener("click", () => {
                const tbody = table.querySelector("tbody") || table;
                const rows = Array.from(tbody.querySelectorAll("tr"));
                const isAsc = header.classList.toggle("asc");
                header.classList.remove("desc");
                if (!isAsc) header.classList.add("desc");

                rows.sort((a, b) => {
                    const tA = a.cells[i].innerText;
                    const tB = b.cells[i].innerText;
                    const nA = parseFloat(tA.replace(/[^0-9.-]/g, ""));
                    const nB = parseFloat(tB.replace(/[^0-9.-]/g, ""));

                    if (!isNaN(nA) && !isNaN(nB)) return isAsc ? nA - nB : nB - nA;
                    return isAsc ? tA.localeCompare(tB) : tB.localeCompare(tA);
                });
                rows.forEach(r => tbody.appendChild(r));
            });
        });
    });
    </script>
"#;

/// Page highlighted in the navigation bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Wyckoff,
}

/// Inputs of the DeMark dashboard page
pub struct Dashboard<'a> {
    pub daily: &'a ScanResult,
    pub weekly: &'a ScanResult,
    pub sectors: &'a ScanResult,
    pub sector_trends: &'a [SectorTrend],
    pub fear_greed: &'a FearGreedSnapshot,
    pub fear_greed_history: &'a [FearGreedRecord],
    pub generated_at: DateTime<Utc>,
}

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn report_date(generated_at: DateTime<Utc>) -> String {
    format!(
        "Report generated: {}",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    )
}

pub fn nav_bar(active: Page) -> String {
    let class = |page: Page| if page == active { "active" } else { "" };
    format!(
        r#"
    <div class="nav-bar">
        <a href="{}" class="{}">DeMark Dashboard</a>
        <a href="{}" class="{}">Wyckoff Scans (SOS)</a>
    </div>
"#,
        DASHBOARD_FILE,
        class(Page::Dashboard),
        WYCKOFF_FILE,
        class(Page::Wyckoff)
    )
}

fn page(title: &str, active: Page, body: &str) -> String {
    format!(
        "<html><head><meta charset=\"utf-8\"><title>{}</title>{}</head><body>\n{}\n{}\n{}</body></html>\n",
        escape_html(title),
        COMMON_CSS,
        nav_bar(active),
        body,
        SORT_SCRIPT
    )
}

/// Candle date and coverage line under a section heading
pub fn render_scan_meta(result: &ScanResult) -> String {
    format!(
        "<p class=\"meta\">Candle: {} | evaluated {} of {} tickers{}</p>",
        result.candle_date.format("%Y-%m-%d"),
        result.stats.tickers_evaluated,
        result.stats.tickers_requested,
        coverage_note(&result.stats)
    )
}

fn coverage_note(stats: &ScanStats) -> String {
    let mut notes = Vec::new();
    if stats.missing_data > 0 {
        notes.push(format!("{} without data", stats.missing_data));
    }
    for (reason, count) in &stats.skipped {
        notes.push(format!("{} skipped ({})", count, reason));
    }

    if notes.is_empty() {
        String::new()
    } else {
        format!(" | {}", notes.join(", "))
    }
}

/// Table of DeMark matches for one bucket
pub fn render_signal_table(matches: &[SignalMatch], bucket: Bucket) -> String {
    if matches.is_empty() {
        return "<p>None found.</p>".to_string();
    }

    let css_class = match bucket {
        Bucket::Tops => "tag-top",
        Bucket::Bottoms => "tag-bot",
    };

    let rows: String = matches
        .iter()
        .map(|m| {
            format!(
                "<tr><td><b>{}</b></td><td>{:.2}</td><td><span class='tag {}'>{}</span></td><td>{}</td></tr>",
                escape_html(&m.ticker),
                m.last_close,
                css_class,
                m.signal,
                escape_html(&m.industry)
            )
        })
        .collect();

    format!(
        "<table><thead><tr><th>Ticker</th><th>Price</th><th>Signal</th><th>Industry</th></tr></thead><tbody>{}</tbody></table>",
        rows
    )
}

/// Bottoms and tops side by side, with the scan's candle line
pub fn render_signal_section(heading: &str, result: &ScanResult) -> String {
    format!(
        r#"
    <h2>{}</h2>
    {}
    <div class="grid-container">
        <div class="col">
            <h3>Bottoms (Buy)</h3>
            {}
        </div>
        <div class="col">
            <h3>Tops (Sell)</h3>
            {}
        </div>
    </div>
"#,
        escape_html(heading),
        render_scan_meta(result),
        render_signal_table(&result.bottoms, Bucket::Bottoms),
        render_signal_table(&result.tops, Bucket::Tops)
    )
}

/// Sentiment box plus the history table (most recent first)
pub fn render_fear_greed(snapshot: &FearGreedSnapshot, history: &[FearGreedRecord]) -> String {
    let mut html = format!(
        r#"
    <div style="background: #fff; padding: 15px; border-left: 5px solid #333; margin-bottom: 20px;">
        <strong>Fear &amp; Greed:</strong> <span style="font-size: 1.2em; font-weight:bold;">{}</span> (Prev: {})
        <span class="meta">as of {}</span>
    </div>
"#,
        snapshot.value_label(),
        snapshot.previous_label(),
        snapshot.date_label()
    );

    if !history.is_empty() {
        let rows: String = history
            .iter()
            .rev()
            .map(|record| {
                format!(
                    "<tr><td>{}</td><td>{:.0}</td><td>{}</td></tr>",
                    record.date.format("%Y-%m-%d"),
                    record.index,
                    record
                        .previous_close
                        .map(|p| format!("{:.0}", p))
                        .unwrap_or_else(|| "N/A".to_string())
                )
            })
            .collect();

        html.push_str(&format!(
            "<h3>CNN Fear &amp; Greed (Last {} Entries)</h3><table><thead><tr><th>Date</th><th>Index</th><th>Previous Close</th></tr></thead><tbody>{}</tbody></table>",
            history.len(),
            rows
        ));
    }

    html
}

/// Daily vs weekly signal counts per sector
pub fn render_sector_trends(trends: &[SectorTrend]) -> String {
    if trends.is_empty() {
        return "<p>No sector signals.</p>".to_string();
    }

    let rows: String = trends
        .iter()
        .map(|trend| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&trend.sector),
                trend.daily,
                trend.weekly
            )
        })
        .collect();

    format!(
        "<table><thead><tr><th>Sector</th><th>Daily Signals</th><th>Weekly Signals</th></tr></thead><tbody>{}</tbody></table>",
        rows
    )
}

pub fn render_dashboard(dashboard: &Dashboard<'_>) -> String {
    let body = format!(
        r#"
    <h1>📉 DeMark Signals Dashboard</h1>
    <p>{}</p>
    {}
    {}
    {}
    {}
    <h2>Sector Trends</h2>
    {}
"#,
        report_date(dashboard.generated_at),
        render_fear_greed(dashboard.fear_greed, dashboard.fear_greed_history),
        render_signal_section("Daily Signals", dashboard.daily),
        render_signal_section("Weekly Signals", dashboard.weekly),
        render_signal_section("Sector ETF Signals", dashboard.sectors),
        render_sector_trends(dashboard.sector_trends)
    );

    page("DeMark Dashboard", Page::Dashboard, &body)
}

fn wyckoff_row(m: &WyckoffMatch) -> String {
    let color = if m.percent_change > 0.0 { "green" } else { "red" };
    let ticker = escape_html(&m.ticker);
    format!(
        r#"
        <tr>
            <td><a href="https://www.tradingview.com/chart/?symbol={}" target="_blank" style="text-decoration:none; color:#2980b9; font-weight:bold;">{}</a></td>
            <td>{:.2}</td>
            <td style="color: {}">{:+.2}%</td>
            <td>{}</td>
            <td>{}</td>
            <td><span class="tag tag-wyckoff">Breakout + Streak</span></td>
        </tr>"#,
        ticker,
        ticker,
        m.last_close,
        color,
        m.percent_change,
        escape_html(&m.sector),
        escape_html(&m.industry)
    )
}

pub fn render_wyckoff(result: &WyckoffResult, generated_at: DateTime<Utc>) -> String {
    let rows = if result.matches.is_empty() {
        "<tr><td colspan='6'>No Wyckoff candidates found today.</td></tr>".to_string()
    } else {
        result.matches.iter().map(wyckoff_row).collect()
    };

    let body = format!(
        r#"
    <h1>💪 Wyckoff "Sign of Strength" Screener</h1>
    <p>{}</p>
    <p class="meta">Evaluated {} of {} tickers{}</p>

    <div style="background: #d9edf7; padding: 15px; border: 1px solid #bce8f1; color: #31708f; border-radius: 4px; margin-bottom: 20px;">
        <strong>Criteria:</strong> Close &gt; Max(Previous 30 Days) <strong>AND</strong> 5 Consecutive Up-Close Days.
        <br><em>This indicates a breakout from a range with aggressive momentum.</em>
    </div>

    <table>
        <thead>
            <tr>
                <th>Ticker</th>
                <th>Price</th>
                <th>Change %</th>
                <th>Sector</th>
                <th>Industry</th>
                <th>Pattern</th>
            </tr>
        </thead>
        <tbody>
            {}
        </tbody>
    </table>
"#,
        report_date(generated_at),
        result.stats.tickers_evaluated,
        result.stats.tickers_requested,
        coverage_note(&result.stats),
        rows
    );

    page("Wyckoff Screener", Page::Wyckoff, &body)
}

/// Writes report pages into the docs directory
pub struct ReportWriter {
    docs_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
        }
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    pub fn write_dashboard(&self, dashboard: &Dashboard<'_>) -> Result<PathBuf> {
        self.write_page(DASHBOARD_FILE, &render_dashboard(dashboard))
    }

    pub fn write_wyckoff(&self, result: &WyckoffResult, generated_at: DateTime<Utc>) -> Result<PathBuf> {
        self.write_page(WYCKOFF_FILE, &render_wyckoff(result, generated_at))
    }

    fn write_page(&self, file_name: &str, html: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.docs_dir).map_err(|e| {
            Error::Io(format!(
                "Failed to create docs directory {}: {}",
                self.docs_dir.display(),
                e
            ))
        })?;

        let path = self.docs_dir.join(file_name);
        fs::write(&path, html)
            .map_err(|e| Error::Io(format!("Failed to write {}: {}", path.display(), e)))?;

        info!(file = %path.display(), bytes = html.len(), "Report page written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SectorTally, SignalLabel};
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 12, 30, 0).unwrap()
    }

    fn signal(ticker: &str, close: f64, label: SignalLabel, industry: &str) -> SignalMatch {
        SignalMatch {
            ticker: ticker.to_string(),
            last_close: close,
            signal: label,
            industry: industry.to_string(),
        }
    }

    fn result_with_matches() -> ScanResult {
        let mut result = ScanResult::empty("1D", NaiveDate::from_ymd_opt(2025, 6, 13).unwrap());
        result.tops.push(signal("AAPL", 203.456, SignalLabel::Dm9Top, "Consumer Electronics"));
        result.bottoms.push(signal("XOM", 101.0, SignalLabel::Dm13Bot, "Oil & Gas"));
        let mut tally = SectorTally::new();
        tally.increment("Technology");
        result.top_sectors = tally;
        result.stats.tickers_requested = 10;
        result.stats.tickers_evaluated = 8;
        result.stats.missing_data = 2;
        result
    }

    fn wyckoff_match(ticker: &str, change: f64) -> WyckoffMatch {
        WyckoffMatch {
            ticker: ticker.to_string(),
            last_close: 111.0,
            sector: "Energy".to_string(),
            industry: "Oil & Gas".to_string(),
            percent_change: change,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("Oil & Gas <E>"), "Oil &amp; Gas &lt;E&gt;");
        assert_eq!(escape_html("it's \"x\""), "it&#39;s &quot;x&quot;");
    }

    #[test]
    fn test_empty_signal_table() {
        assert_eq!(render_signal_table(&[], Bucket::Tops), "<p>None found.</p>");
    }

    #[test]
    fn test_signal_table_rows() {
        let result = result_with_matches();
        let html = render_signal_table(&result.tops, Bucket::Tops);
        assert!(html.contains("<b>AAPL</b>"));
        assert!(html.contains("<td>203.46</td>"));
        assert!(html.contains("tag-top'>DM9 Top<"));

        let html = render_signal_table(&result.bottoms, Bucket::Bottoms);
        assert!(html.contains("tag-bot'>DM13 Bot<"));
        assert!(html.contains("Oil &amp; Gas"));
    }

    #[test]
    fn test_scan_meta_reports_coverage() {
        let html = render_scan_meta(&result_with_matches());
        assert!(html.contains("Candle: 2025-06-13"));
        assert!(html.contains("evaluated 8 of 10 tickers"));
        assert!(html.contains("2 without data"));
    }

    #[test]
    fn test_nav_bar_marks_active_page() {
        let html = nav_bar(Page::Wyckoff);
        assert!(html.contains(r#"<a href="wyckoff.html" class="active">"#));
        assert!(html.contains(r#"<a href="index.html" class="">"#));
    }

    #[test]
    fn test_fear_greed_unavailable() {
        let html = render_fear_greed(&FearGreedSnapshot::unavailable(), &[]);
        assert!(html.contains(">N/A</span> (Prev: N/A)"));
        assert!(html.contains("<strong>Fear &amp; Greed:</strong>"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_fear_greed_history_most_recent_first() {
        let snapshot = FearGreedSnapshot {
            value: Some(60),
            previous_close: Some(55),
            date: NaiveDate::from_ymd_opt(2025, 6, 13),
        };
        let history = vec![
            FearGreedRecord {
                date: NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
                index: 55.0,
                previous_close: Some(50.0),
            },
            FearGreedRecord {
                date: NaiveDate::from_ymd_opt(2025, 6, 13).unwrap(),
                index: 60.0,
                previous_close: None,
            },
        ];

        let html = render_fear_greed(&snapshot, &history);
        let newer = html.find("2025-06-13</td>").unwrap();
        let older = html.find("2025-06-12</td>").unwrap();
        assert!(newer < older);
        assert!(html.contains("<td>60</td><td>N/A</td>"));
        assert!(html.contains("<h3>CNN Fear &amp; Greed (Last 2 Entries)</h3>"));
        assert!(!html.contains("Fear & Greed"));
    }

    #[test]
    fn test_sector_trends_table() {
        assert_eq!(render_sector_trends(&[]), "<p>No sector signals.</p>");

        let trends = vec![SectorTrend {
            sector: "Energy".to_string(),
            daily: 3,
            weekly: 1,
        }];
        assert!(render_sector_trends(&trends).contains("<tr><td>Energy</td><td>3</td><td>1</td></tr>"));
    }

    #[test]
    fn test_wyckoff_page() {
        let result = WyckoffResult {
            matches: vec![wyckoff_match("XOM", 6.7308), wyckoff_match("CVX", -0.5)],
            stats: ScanStats::default(),
        };
        let html = render_wyckoff(&result, generated_at());
        assert!(html.contains("https://www.tradingview.com/chart/?symbol=XOM"));
        assert!(html.contains(r#"<td style="color: green">+6.73%</td>"#));
        assert!(html.contains(r#"<td style="color: red">-0.50%</td>"#));
        assert!(html.contains("Report generated: 2025-06-14 12:30 UTC"));
        assert!(!html.contains("No Wyckoff candidates"));
    }

    #[test]
    fn test_empty_wyckoff_page() {
        let html = render_wyckoff(&WyckoffResult::default(), generated_at());
        assert!(html.contains("No Wyckoff candidates found today."));
    }

    #[test]
    fn test_writer_creates_pages() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(temp_dir.path().join("docs"));

        let daily = result_with_matches();
        let weekly = ScanResult::empty("1W", NaiveDate::from_ymd_opt(2025, 6, 13).unwrap());
        let sectors = ScanResult::empty("Sector", NaiveDate::from_ymd_opt(2025, 6, 13).unwrap());
        let trends = crate::services::aggregator::sector_trends(&daily, &weekly);
        let snapshot = FearGreedSnapshot::unavailable();

        let dashboard = Dashboard {
            daily: &daily,
            weekly: &weekly,
            sectors: &sectors,
            sector_trends: &trends,
            fear_greed: &snapshot,
            fear_greed_history: &[],
            generated_at: generated_at(),
        };

        let index = writer.write_dashboard(&dashboard).unwrap();
        let html = fs::read_to_string(&index).unwrap();
        assert!(index.ends_with("docs/index.html"));
        assert!(html.contains("Daily Signals"));
        assert!(html.contains("Sector ETF Signals"));
        assert!(html.contains("<tr><td>Technology</td><td>1</td><td>0</td></tr>"));

        let wyckoff = writer.write_wyckoff(&WyckoffResult::default(), generated_at()).unwrap();
        assert!(wyckoff.exists());
    }
}
