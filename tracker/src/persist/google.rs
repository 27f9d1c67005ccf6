//! Google Sheets v4 client authenticated with a service account.
//!
//! The service-account key signs an RS256 JWT which is exchanged at the key's
//! token URI for a bearer token (OAuth 2.0 JWT bearer grant).

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::SinkError;
use crate::persist::sheet::SheetClient;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets/";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The fields of a service-account JSON key the client uses.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, SinkError> {
        serde_json::from_str(raw).map_err(|e| SinkError::Credential(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Signs the JWT assertion exchanged for an access token.
fn sign_assertion(key: &ServiceAccountKey, issued_at: i64) -> Result<String, SinkError> {
    let claims = Claims {
        iss: &key.client_email,
        scope: SHEETS_SCOPE,
        aud: &key.token_uri,
        iat: issued_at,
        exp: issued_at + TOKEN_LIFETIME_SECS,
    };
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SinkError::Credential(format!("private_key: {e}")))?;

    encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| SinkError::Credential(e.to_string()))
}

/// URL for a value operation, e.g. `values/Sheet1!A1:append`.
fn values_url(spreadsheet_id: &str, range: &str, action: Option<&str>) -> Result<Url, SinkError> {
    let mut url = Url::parse(SHEETS_API).map_err(|e| SinkError::Remote(e.to_string()))?;
    let last = match action {
        Some(action) => format!("{range}:{action}"),
        None => range.to_string(),
    };
    url.path_segments_mut()
        .map_err(|_| SinkError::Remote("sheets API URL cannot be a base".to_string()))?
        .pop_if_empty()
        .extend([spreadsheet_id, "values", last.as_str()]);
    Ok(url)
}

fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(SinkError::RemoteStatus {
        status: status.as_u16(),
        body,
    })
}

pub struct GoogleSheetsClient {
    http: Client,
    token: String,
    spreadsheet_id: String,
}

impl GoogleSheetsClient {
    /// Exchanges the service-account key for an access token.
    pub fn connect(key: &ServiceAccountKey, spreadsheet_id: &str) -> Result<Self, SinkError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let assertion = sign_assertion(key, Utc::now().timestamp())?;

        let response = http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()?;
        let token: TokenResponse = check(response)?.json()?;
        debug!(account = %key.client_email, "obtained sheets access token");

        Ok(Self {
            http,
            token: token.access_token,
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }

    fn send(&self, request: RequestBuilder) -> Result<reqwest::blocking::Response, SinkError> {
        check(request.bearer_auth(&self.token).send()?)
    }

    fn url(&self, range: &str, action: Option<&str>) -> Result<Url, SinkError> {
        values_url(&self.spreadsheet_id, range, action)
    }
}

impl SheetClient for GoogleSheetsClient {
    fn clear(&self, range: &str) -> Result<(), SinkError> {
        let url = self.url(range, Some("clear"))?;
        self.send(self.http.post(url).json(&json!({})))?;
        Ok(())
    }

    fn update(&self, range: &str, rows: &[Vec<String>]) -> Result<(), SinkError> {
        let mut url = self.url(range, None)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": rows });
        self.send(self.http.put(url).json(&body))?;
        Ok(())
    }

    fn append(&self, range: &str, rows: &[Vec<String>]) -> Result<(), SinkError> {
        let mut url = self.url(range, Some("append"))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = json!({ "majorDimension": "ROWS", "values": rows });
        self.send(self.http.post(url).json(&body))?;
        Ok(())
    }

    fn is_empty(&self, range: &str) -> Result<bool, SinkError> {
        let url = self.url(&format!("{range}!A1:A1"), None)?;
        let found: ValueRange = self.send(self.http.get(url))?.json()?;
        Ok(found.values.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"type": "service_account", "client_email": "bot@proj.iam.gserviceaccount.com", "private_key": "pem"}"#,
        )
        .unwrap();
        assert_eq!(key.client_email, "bot@proj.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_key_without_private_key_is_rejected() {
        let err = ServiceAccountKey::from_json(r#"{"client_email": "bot@proj"}"#).unwrap_err();
        assert!(matches!(err, SinkError::Credential(msg) if msg.contains("private_key")));
    }

    #[test]
    fn test_non_pem_private_key_is_a_credential_error() {
        let key = ServiceAccountKey {
            client_email: "bot@proj".to_string(),
            private_key: "not a pem".to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        };
        assert!(matches!(sign_assertion(&key, 0), Err(SinkError::Credential(_))));
    }

    #[test]
    fn test_values_url_encodes_sheet_name() {
        let url = values_url("abc123", "Job Updates!A1", None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Job%20Updates!A1"
        );
    }

    #[test]
    fn test_values_url_appends_action() {
        let url = values_url("abc123", "Sheet1", Some("clear")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Sheet1:clear"
        );
    }
}
