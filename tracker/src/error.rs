//! Error types for fetching pages and writing results.
//!
//! Neither kind aborts a run: fetch errors zero out one site's contribution,
//! sink errors are logged by the orchestrator.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a career page could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, redirect or body-read failure
    #[error("request failed: {0}")]
    Network(String),

    #[error("request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// Server answered with a non-2xx status
    #[error("HTTP status {0}")]
    HttpStatus(u16),
}

/// Failure writing results to a file or a remote sheet.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Service-account payload present but unusable
    #[error("invalid service account credential: {0}")]
    Credential(String),

    #[error("sheets request failed: {0}")]
    Remote(String),

    #[error("sheets API returned HTTP {status}: {body}")]
    RemoteStatus { status: u16, body: String },
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(err.to_string())
    }
}
