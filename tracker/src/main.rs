//! Career-page keyword tracker
//!
//! Checks the configured career sites for job titles containing a keyword
//! and saves them to job_updates_<YYYYMMDD_HHMM>.csv

use anyhow::{Context, Result};
use clap::Parser;
use job_tracker::config::{self, Settings};
use job_tracker::persist::SheetMode;
use job_tracker::ScanConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "job-tracker", version)]
#[command(about = "Scan career pages for job titles containing a keyword")]
struct Cli {
    /// JSON file with [{"company", "url", "keyword", "base_url"?}] entries
    #[arg(long)]
    sites: Option<PathBuf>,

    /// Scan a single site instead of the configured list
    #[arg(long, requires_all = ["url", "keyword"])]
    company: Option<String>,

    #[arg(long, requires = "company")]
    url: Option<String>,

    #[arg(long, requires = "company")]
    keyword: Option<String>,

    /// Origin for relative job links of the single site
    #[arg(long, requires = "company")]
    base_url: Option<String>,

    /// Directory the CSV file is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Per-request timeout
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Extra request header, repeatable
    #[arg(long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Write the CSV without a UTF-8 byte order mark
    #[arg(long)]
    no_bom: bool,

    /// Replace the sheet contents or append to them
    #[arg(long, value_enum)]
    sheet_mode: Option<SheetMode>,
}

impl Cli {
    /// Environment first, flags on top.
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::from_env().context("Failed to load configuration")?;

        if let Some(path) = &self.sites {
            settings.sites_file = Some(path.clone());
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(secs) = self.timeout_secs {
            settings.fetch.timeout = Duration::from_secs(secs);
        }
        settings.fetch.headers.extend(self.headers.iter().cloned());
        if self.no_bom {
            settings.csv_bom = false;
        }
        if let Some(mode) = self.sheet_mode {
            settings.set_sheet_mode(mode);
        }
        Ok(settings)
    }

    fn sites(&self, settings: &Settings) -> Result<Vec<ScanConfig>> {
        let (Some(company), Some(url), Some(keyword)) = (&self.company, &self.url, &self.keyword)
        else {
            return settings.sites();
        };

        let mut site = ScanConfig::new(company, url, keyword);
        site.base_url = self.base_url.clone();
        config::validate(&site)?;
        Ok(vec![site])
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{raw}'"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let prepared = cli
        .settings()
        .and_then(|settings| Ok((cli.sites(&settings)?, settings)));

    match prepared {
        Ok((sites, settings)) => {
            tracing::info!("🚀 Starting job tracker for {} site(s)", sites.len());
            job_tracker::run(&sites, &settings)
        }
        Err(err) => {
            tracing::error!("🔴 {err:#}");
            ExitCode::FAILURE
        }
    }
}
