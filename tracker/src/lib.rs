//! Career-page keyword tracker
//!
//! Fetches configured career pages, keeps elements whose text contains a
//! keyword such as "Data Engineer", and saves the hits to a timestamped CSV
//! file and optionally a Google Sheet.

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod persist;
pub mod scan;

pub use common::{JobMatch, ScanConfig};

use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::fetch::HttpFetcher;
use crate::persist::CsvSink;
use crate::scan::Tracker;

/// Scans `configs` with a real HTTP client and the sinks described by
/// `settings`. Exits non-zero only when a fetch failed and nothing was
/// found, or the CSV could not be written.
pub fn run(configs: &[ScanConfig], settings: &Settings) -> ExitCode {
    let fetcher = match HttpFetcher::new(&settings.fetch) {
        Ok(fetcher) => fetcher,
        Err(err) => {
            error!("🔴 {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut tracker = Tracker::new(fetcher, CsvSink::new(&settings.output_dir, settings.csv_bom));
    if let Some(sheet) = settings.sheet_sink() {
        tracker = tracker.with_sheet(sheet);
    }

    let report = tracker.run(configs);
    if report.fetch_failed() && report.total_matches == 0 {
        warn!("⚠️ Warning: Job fetch failed and no results found");
    } else if report.file.is_ok() {
        info!(
            "🎉 Job tracker completed successfully! {} job(s) across {} site(s)",
            report.total_matches,
            report.sites.len()
        );
    }
    report.exit_code()
}
