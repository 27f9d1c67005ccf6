//! Fetch → extract → persist, one site at a time.

use chrono::{Local, NaiveDateTime};
use common::{JobMatch, ScanConfig};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::error::{FetchError, SinkError};
use crate::extract::{extract, KeywordMatcher, LinkResolver};
use crate::fetch::Fetcher;
use crate::persist::{CsvSink, SheetOutcome, SheetSink, WrittenFile};

/// Fetches one configured page and turns keyword hits into rows.
pub struct JobScanner<F> {
    fetcher: F,
}

impl<F: Fetcher> JobScanner<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Every returned match has `config.keyword` in its title.
    pub fn scan(
        &self,
        config: &ScanConfig,
        captured_at: NaiveDateTime,
    ) -> Result<Vec<JobMatch>, FetchError> {
        info!("🔍 Checking {} job site...", config.company);
        let html = self.fetcher.fetch(&config.target_url)?;

        let matcher = KeywordMatcher::new(&config.keyword);
        let links = LinkResolver::new(&config.target_url, config.base_url.as_deref());
        let jobs: Vec<JobMatch> = extract(&html, &matcher, &links)
            .into_iter()
            .map(|candidate| JobMatch {
                captured_at,
                company: config.company.clone(),
                title: candidate.title,
                link: candidate.link,
            })
            .collect();

        for job in &jobs {
            info!("📋 Found: {} at {}", job.title, job.company);
        }
        info!("📊 Found {} matching job(s) at {}", jobs.len(), config.company);
        Ok(jobs)
    }
}

/// Outcome of one site.
#[derive(Debug)]
pub struct SiteReport {
    pub company: String,
    pub matches: usize,
    pub error: Option<FetchError>,
}

/// Everything a run did, for logging and the exit status.
#[derive(Debug)]
pub struct RunReport {
    pub started_at: NaiveDateTime,
    pub sites: Vec<SiteReport>,
    pub total_matches: usize,
    pub file: Result<WrittenFile, SinkError>,
    /// `None` when no sheet sink is configured
    pub sheet: Option<Result<SheetOutcome, SinkError>>,
}

impl RunReport {
    pub fn fetch_failed(&self) -> bool {
        self.sites.iter().any(|site| site.error.is_some())
    }

    /// A fetch failed and nothing was found, or the CSV never reached disk.
    /// Sheet errors never count.
    pub fn is_hard_failure(&self) -> bool {
        (self.fetch_failed() && self.total_matches == 0) || self.file.is_err()
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_hard_failure() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Runs every configured site through a [`JobScanner`] and hands the
/// collected rows to the sinks.
pub struct Tracker<F> {
    scanner: JobScanner<F>,
    csv: CsvSink,
    sheet: Option<SheetSink>,
    clock: fn() -> NaiveDateTime,
}

impl<F: Fetcher> Tracker<F> {
    pub fn new(fetcher: F, csv: CsvSink) -> Self {
        Self {
            scanner: JobScanner::new(fetcher),
            csv,
            sheet: None,
            clock: local_now,
        }
    }

    pub fn with_sheet(mut self, sheet: SheetSink) -> Self {
        self.sheet = Some(sheet);
        self
    }

    /// Source of capture and file-name timestamps.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Per-site failures are logged and recorded, never propagated.
    pub fn run(&self, configs: &[ScanConfig]) -> RunReport {
        let started_at = (self.clock)();
        let mut jobs: Vec<JobMatch> = Vec::new();
        let mut sites = Vec::with_capacity(configs.len());

        for config in configs {
            match self.scanner.scan(config, (self.clock)()) {
                Ok(found) => {
                    sites.push(SiteReport {
                        company: config.company.clone(),
                        matches: found.len(),
                        error: None,
                    });
                    jobs.extend(found);
                }
                Err(err) => {
                    log_fetch_error(&config.company, &err);
                    sites.push(SiteReport {
                        company: config.company.clone(),
                        matches: 0,
                        error: Some(err),
                    });
                }
            }
        }

        let file = self.csv.write(&jobs, started_at);
        if let Err(err) = &file {
            error!("🔴 Could not save results: {err}");
        }

        let sheet = self.sheet.as_ref().map(|sink| sink.persist(&jobs));
        if let Some(Err(err)) = &sheet {
            error!("🔴 Sheet upload failed: {err}");
        }

        RunReport {
            started_at,
            sites,
            total_matches: jobs.len(),
            file,
            sheet,
        }
    }
}

fn log_fetch_error(company: &str, err: &FetchError) {
    match err {
        FetchError::HttpStatus(code) => warn!("⚠️ HTTP Error from {company}: {code}"),
        FetchError::Timeout(_) => warn!("⚠️ {company}: {err}"),
        FetchError::Network(_) => error!("🔴 Request Error for {company}: {err}"),
    }
}
