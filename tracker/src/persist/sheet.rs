//! Optional Google Sheets sink.
//!
//! The sink never fails a run on its own account: a missing credential is a
//! warning and an API error is reported back to the orchestrator for logging.

use clap::ValueEnum;
use common::{JobMatch, HEADER};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::SinkError;
use crate::persist::google::{GoogleSheetsClient, ServiceAccountKey};

/// How rows land in the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SheetMode {
    /// Wipe the sheet, then write header and rows from A1
    #[default]
    Clear,
    /// Add rows under the existing data; header only goes into an empty sheet
    Append,
}

impl FromStr for SheetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clear" => Ok(Self::Clear),
            "append" => Ok(Self::Append),
            other => Err(format!("unknown sheet mode '{other}', expected 'clear' or 'append'")),
        }
    }
}

impl fmt::Display for SheetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clear => write!(f, "clear"),
            Self::Append => write!(f, "append"),
        }
    }
}

/// The few Sheets API value operations the sink needs. Ranges are A1
/// notation, e.g. `'Sheet1'` or `'Sheet1'!A1`.
pub trait SheetClient {
    fn clear(&self, range: &str) -> Result<(), SinkError>;
    fn update(&self, range: &str, rows: &[Vec<String>]) -> Result<(), SinkError>;
    fn append(&self, range: &str, rows: &[Vec<String>]) -> Result<(), SinkError>;
    fn is_empty(&self, range: &str) -> Result<bool, SinkError>;
}

/// Result of a sink invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetOutcome {
    /// No credential configured; nothing was sent
    Skipped,
    Written { rows: usize },
}

#[derive(Debug, Clone)]
pub struct SheetSink {
    spreadsheet_id: String,
    sheet_name: String,
    mode: SheetMode,
    credential: Option<String>,
}

impl SheetSink {
    /// `credential` is the raw service-account JSON, if one is configured.
    pub fn new(
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        mode: SheetMode,
        credential: Option<String>,
    ) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            mode,
            credential: credential.filter(|c| !c.trim().is_empty()),
        }
    }

    /// Authenticates with the configured credential and writes `jobs`.
    pub fn persist(&self, jobs: &[JobMatch]) -> Result<SheetOutcome, SinkError> {
        let Some(raw) = &self.credential else {
            warn!("⚠️ No Google credential configured, skipping sheet upload");
            return Ok(SheetOutcome::Skipped);
        };

        let key = ServiceAccountKey::from_json(raw)?;
        let client = GoogleSheetsClient::connect(&key, &self.spreadsheet_id)?;
        self.write_with(&client, jobs)
    }

    /// Mode logic against an already-authenticated client.
    pub fn write_with(
        &self,
        client: &dyn SheetClient,
        jobs: &[JobMatch],
    ) -> Result<SheetOutcome, SinkError> {
        let rows: Vec<Vec<String>> = jobs.iter().map(|job| job.to_row().to_vec()).collect();
        let sheet = quote_sheet_name(&self.sheet_name);

        match self.mode {
            SheetMode::Clear => {
                client.clear(&sheet)?;
                let mut values = Vec::with_capacity(rows.len() + 1);
                values.push(header_row());
                values.extend(rows);
                client.update(&format!("{sheet}!A1"), &values)?;
            }
            SheetMode::Append => {
                let mut values = Vec::with_capacity(rows.len() + 1);
                if client.is_empty(&sheet)? {
                    values.push(header_row());
                }
                values.extend(rows);
                if !values.is_empty() {
                    client.append(&sheet, &values)?;
                }
            }
        }

        info!(
            "📤 Uploaded {} job(s) to sheet '{}' ({})",
            jobs.len(),
            self.sheet_name,
            self.mode
        );
        Ok(SheetOutcome::Written { rows: jobs.len() })
    }
}

/// A1 sheet reference; quotes inside the name are doubled.
fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

fn header_row() -> Vec<String> {
    HEADER.iter().map(|h| h.to_string()).collect()
}
