use anyhow::{bail, Context, Result};
use common::ScanConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::fetch::FetchOptions;
use crate::persist::{SheetMode, SheetSink};

pub const ENV_SITES: &str = "JOB_TRACKER_SITES";
pub const ENV_OUTPUT_DIR: &str = "JOB_TRACKER_OUTPUT_DIR";
pub const ENV_TIMEOUT_SECS: &str = "JOB_TRACKER_TIMEOUT_SECS";
pub const ENV_CSV_BOM: &str = "JOB_TRACKER_CSV_BOM";
pub const ENV_CREDENTIALS: &str = "GOOGLE_CREDENTIALS";
pub const ENV_SHEET_ID: &str = "GOOGLE_SHEET_ID";
pub const ENV_SHEET_NAME: &str = "GOOGLE_SHEET_NAME";
pub const ENV_SHEET_MODE: &str = "GOOGLE_SHEET_MODE";

const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Where and how to upload to Google Sheets.
#[derive(Debug, Clone)]
pub struct SheetSettings {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub mode: SheetMode,
    /// Service-account JSON; uploads are skipped without it
    pub credential: Option<String>,
}

/// Run configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Settings {
    pub sites_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub csv_bom: bool,
    pub fetch: FetchOptions,
    /// Present when a spreadsheet ID is configured
    pub sheet: Option<SheetSettings>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut fetch = FetchOptions::default();
        if let Some(secs) = var(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds"))?;
            fetch.timeout = Duration::from_secs(secs);
        }

        let csv_bom = match var(ENV_CSV_BOM) {
            Some(raw) => parse_flag(&raw).with_context(|| format!("{ENV_CSV_BOM} must be a boolean"))?,
            None => true,
        };

        let credential = var(ENV_CREDENTIALS);
        let sheet = match var(ENV_SHEET_ID) {
            Some(spreadsheet_id) => Some(SheetSettings {
                spreadsheet_id,
                sheet_name: var(ENV_SHEET_NAME).unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
                mode: match var(ENV_SHEET_MODE) {
                    Some(raw) => raw.parse::<SheetMode>().map_err(anyhow::Error::msg)?,
                    None => SheetMode::default(),
                },
                credential,
            }),
            None => {
                if credential.is_some() {
                    warn!("⚠️ {ENV_CREDENTIALS} is set but {ENV_SHEET_ID} is not, skipping sheet upload");
                }
                None
            }
        };

        Ok(Self {
            sites_file: var(ENV_SITES).map(PathBuf::from),
            output_dir: var(ENV_OUTPUT_DIR).map(PathBuf::from).unwrap_or_default(),
            csv_bom,
            fetch,
            sheet,
        })
    }

    /// Sites from the configured file, or the built-in list.
    pub fn sites(&self) -> Result<Vec<ScanConfig>> {
        match &self.sites_file {
            Some(path) => load_sites(path),
            None => Ok(default_sites()),
        }
    }

    /// Returns false, with a warning, when no spreadsheet is configured.
    pub fn set_sheet_mode(&mut self, mode: SheetMode) -> bool {
        match self.sheet.as_mut() {
            Some(sheet) => {
                sheet.mode = mode;
                true
            }
            None => {
                warn!("⚠️ Sheet mode '{mode}' ignored: {ENV_SHEET_ID} is not set");
                false
            }
        }
    }

    pub fn sheet_sink(&self) -> Option<SheetSink> {
        self.sheet.as_ref().map(|sheet| {
            SheetSink::new(
                &sheet.spreadsheet_id,
                &sheet.sheet_name,
                sheet.mode,
                sheet.credential.clone(),
            )
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognised flag value '{other}'"),
    }
}

/// Reads a JSON array of `{company, url, keyword, base_url?}` objects.
pub fn load_sites(path: &Path) -> Result<Vec<ScanConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read sites file {}", path.display()))?;
    let sites: Vec<ScanConfig> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse sites file {}", path.display()))?;

    if sites.is_empty() {
        bail!("Sites file {} lists no sites", path.display());
    }
    for site in &sites {
        validate(site)?;
    }
    Ok(sites)
}

/// Rejects entries that would scan nothing or match everything.
pub fn validate(site: &ScanConfig) -> Result<()> {
    if site.company.trim().is_empty() {
        bail!("Site entry for {} has no company name", site.target_url);
    }
    if site.target_url.trim().is_empty() {
        bail!("Site entry for {} has no URL", site.company);
    }
    if site.keyword.trim().is_empty() {
        bail!("Site entry for {} has an empty keyword", site.company);
    }
    Ok(())
}

/// Amazon India, Data Engineer roles.
pub fn default_sites() -> Vec<ScanConfig> {
    vec![ScanConfig::new(
        "Amazon",
        "https://www.amazon.jobs/content/en/job-categories/software-development?keyword%5B%5D=Data+Engineer&country%5B%5D=IN",
        "Data Engineer",
    )
    .with_base_url("https://www.amazon.jobs")]
}
