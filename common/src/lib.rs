use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format of the `Date` column.
pub const CAPTURED_AT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Column headers, in row order.
pub const HEADER: [&str; 4] = ["Date", "Company", "Job Title", "Link"];

/// One (company, URL, keyword) unit of work.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub company: String,
    #[serde(alias = "url")]
    pub target_url: String,
    pub keyword: String,
    /// Origin relative hrefs are joined to. Falls back to `target_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ScanConfig {
    pub fn new(
        company: impl Into<String>,
        target_url: impl Into<String>,
        keyword: impl Into<String>,
    ) -> Self {
        Self {
            company: company.into(),
            target_url: target_url.into(),
            keyword: keyword.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// A candidate job posting pulled out of a career page.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JobMatch {
    pub captured_at: NaiveDateTime,
    pub company: String,
    pub title: String,
    pub link: String,
}

impl JobMatch {
    /// Cells in `HEADER` order.
    pub fn to_row(&self) -> [String; 4] {
        [
            self.captured_at.format(CAPTURED_AT_FORMAT).to_string(),
            self.company.clone(),
            self.title.clone(),
            self.link.clone(),
        ]
    }
}
