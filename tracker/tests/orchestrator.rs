// tests/orchestrator.rs
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use job_tracker::error::FetchError;
use job_tracker::fetch::Fetcher;
use job_tracker::persist::{CsvSink, SheetMode, SheetOutcome, SheetSink};
use job_tracker::scan::Tracker;
use job_tracker::ScanConfig;
use regex::Regex;

enum Page {
    Html(&'static str),
    Status(u16),
    TimedOut,
    Unreachable,
}

/// Serves canned responses keyed by URL.
struct FakeFetcher {
    pages: HashMap<&'static str, Page>,
}

impl FakeFetcher {
    fn new(pages: Vec<(&'static str, Page)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
        }
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match self.pages.get(url) {
            Some(Page::Html(html)) => Ok(html.to_string()),
            Some(Page::Status(code)) => Err(FetchError::HttpStatus(*code)),
            Some(Page::TimedOut) => Err(FetchError::Timeout(Duration::from_secs(20))),
            Some(Page::Unreachable) | None => Err(FetchError::Network(format!("no route to {url}"))),
        }
    }
}

fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 2, 14)
        .unwrap()
        .and_hms_opt(6, 30, 0)
        .unwrap()
}

fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("job_tracker_it_{}", name));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p
}

const ACME_URL: &str = "https://acme.test/careers";
const GLOBEX_URL: &str = "https://globex.test/jobs?team=data";

const ACME_PAGE: &str = r#"
<html><body>
  <ul>
    <li><a href="/jobs/42">Senior Data Engineer</a></li>
    <li><a href="/jobs/43">Frontend Engineer</a></li>
  </ul>
</body></html>
"#;

fn acme() -> ScanConfig {
    ScanConfig::new("Acme", ACME_URL, "Data Engineer").with_base_url("https://acme.test")
}

fn globex() -> ScanConfig {
    ScanConfig::new("Globex", GLOBEX_URL, "Data Engineer")
}

#[test]
fn http_error_on_one_site_does_not_block_the_next() {
    let dir = tmp_dir("503_then_ok");
    let fetcher = FakeFetcher::new(vec![(GLOBEX_URL, Page::Status(503)), (ACME_URL, Page::Html(ACME_PAGE))]);
    let tracker = Tracker::new(fetcher, CsvSink::new(&dir, false)).with_clock(fixed_now);

    let report = tracker.run(&[globex(), acme()]);

    assert_eq!(report.sites.len(), 2);
    assert_eq!(report.sites[0].company, "Globex");
    assert_eq!(report.sites[0].matches, 0);
    assert!(matches!(report.sites[0].error, Some(FetchError::HttpStatus(503))));
    assert_eq!(report.sites[1].matches, 1);
    assert!(report.sites[1].error.is_none());
    assert!(!report.is_hard_failure());

    let file = report.file.as_ref().unwrap();
    let content = fs::read_to_string(&file.path).unwrap();
    assert_eq!(
        content,
        "Date,Company,Job Title,Link\n2025-02-14 06:30,Acme,Senior Data Engineer,https://acme.test/jobs/42\n"
    );
}

#[test]
fn failed_fetch_with_no_matches_is_a_hard_failure() {
    let dir = tmp_dir("all_failed");
    let fetcher = FakeFetcher::new(vec![(GLOBEX_URL, Page::TimedOut), (ACME_URL, Page::Unreachable)]);
    let tracker = Tracker::new(fetcher, CsvSink::new(&dir, true)).with_clock(fixed_now);

    let report = tracker.run(&[globex(), acme()]);

    assert!(report.fetch_failed());
    assert!(report.is_hard_failure());
    assert!(matches!(report.sites[0].error, Some(FetchError::Timeout(_))));
    assert!(matches!(report.sites[1].error, Some(FetchError::Network(_))));

    // The file is still written, header only.
    let file = report.file.as_ref().unwrap();
    assert_eq!(file.rows, 0);
    let bytes = fs::read(&file.path).unwrap();
    assert_eq!(bytes, b"\xEF\xBB\xBFDate,Company,Job Title,Link\n");
}

#[test]
fn zero_matches_without_fetch_errors_succeeds() {
    let dir = tmp_dir("no_matches");
    let fetcher = FakeFetcher::new(vec![(ACME_URL, Page::Html("<h3>Product Manager</h3>"))]);
    let tracker = Tracker::new(fetcher, CsvSink::new(&dir, false)).with_clock(fixed_now);

    let report = tracker.run(&[acme()]);

    assert_eq!(report.total_matches, 0);
    assert!(!report.is_hard_failure());
    let content = fs::read_to_string(&report.file.as_ref().unwrap().path).unwrap();
    assert_eq!(content, "Date,Company,Job Title,Link\n");
}

#[test]
fn partial_failure_with_matches_succeeds() {
    let dir = tmp_dir("partial");
    let fetcher = FakeFetcher::new(vec![(ACME_URL, Page::Html(ACME_PAGE))]);
    let tracker = Tracker::new(fetcher, CsvSink::new(&dir, false)).with_clock(fixed_now);

    let report = tracker.run(&[acme(), globex()]);

    assert!(report.fetch_failed());
    assert_eq!(report.total_matches, 1);
    assert!(!report.is_hard_failure());
}

#[test]
fn output_file_is_named_after_the_run_minute() {
    let dir = tmp_dir("file_name");
    let fetcher = FakeFetcher::new(vec![(ACME_URL, Page::Html(ACME_PAGE))]);
    let tracker = Tracker::new(fetcher, CsvSink::new(&dir, false)).with_clock(fixed_now);

    let report = tracker.run(&[acme()]);

    let path = &report.file.as_ref().unwrap().path;
    let name = path.file_name().unwrap().to_string_lossy();
    let pattern = Regex::new(r"^job_updates_\d{8}_\d{4}\.csv$").unwrap();
    assert!(pattern.is_match(&name));
    assert_eq!(name, "job_updates_20250214_0630.csv");
}

#[test]
fn every_row_contains_its_keyword() {
    let dir = tmp_dir("keyword_property");
    let noisy = r#"
        <div><span>Data Engineer</span></div>
        <div><h3>Big Data Engineering Manager</h3></div>
        <a href="jobs/7">Data Engineer - Payments</a>
        <span>Data engineer</span>
        <div>Data Engineer <em>Remote</em></div>
    "#;
    let fetcher = FakeFetcher::new(vec![(GLOBEX_URL, Page::Html(noisy))]);
    let tracker = Tracker::new(fetcher, CsvSink::new(&dir, false)).with_clock(fixed_now);

    let report = tracker.run(&[globex()]);
    let content = fs::read_to_string(&report.file.as_ref().unwrap().path).unwrap();

    let titles: Vec<&str> = content
        .lines()
        .skip(1)
        .map(|line| line.split(',').nth(2).unwrap())
        .collect();
    assert_eq!(titles.len(), report.total_matches);
    assert!(!titles.is_empty());
    assert!(titles.iter().all(|title| title.contains("Data Engineer")));
    assert!(content.contains("https://globex.test/jobs/7"));
}

#[test]
fn sheet_without_credential_is_skipped_and_run_succeeds() {
    let dir = tmp_dir("sheet_skipped");
    let fetcher = FakeFetcher::new(vec![(ACME_URL, Page::Html(ACME_PAGE))]);
    let sheet = SheetSink::new("spreadsheet-id", "Sheet1", SheetMode::Append, None);
    let tracker = Tracker::new(fetcher, CsvSink::new(&dir, false))
        .with_sheet(sheet)
        .with_clock(fixed_now);

    let report = tracker.run(&[acme()]);

    assert!(matches!(report.sheet, Some(Ok(SheetOutcome::Skipped))));
    assert!(!report.is_hard_failure());
}

#[test]
fn sheet_credential_errors_do_not_fail_the_run() {
    let dir = tmp_dir("sheet_bad_credential");
    let fetcher = FakeFetcher::new(vec![(ACME_URL, Page::Html(ACME_PAGE))]);
    let sheet = SheetSink::new(
        "spreadsheet-id",
        "Sheet1",
        SheetMode::Clear,
        Some(r#"{"client_email": "bot@proj"}"#.to_string()),
    );
    let tracker = Tracker::new(fetcher, CsvSink::new(&dir, false))
        .with_sheet(sheet)
        .with_clock(fixed_now);

    let report = tracker.run(&[acme()]);

    assert!(matches!(report.sheet, Some(Err(_))));
    assert!(!report.is_hard_failure());
}

#[test]
fn unwritable_output_is_a_hard_failure() {
    let dir = tmp_dir("unwritable");
    let blocker = dir.join("not_a_dir");
    fs::write(&blocker, "occupied").unwrap();
    let fetcher = FakeFetcher::new(vec![(ACME_URL, Page::Html(ACME_PAGE))]);
    let tracker = Tracker::new(fetcher, CsvSink::new(&blocker, false)).with_clock(fixed_now);

    let report = tracker.run(&[acme()]);

    assert_eq!(report.total_matches, 1);
    assert!(report.file.is_err());
    assert!(report.is_hard_failure());
}
