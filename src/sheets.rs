//! Google Sheets mirror of the harvested paper list.
//!
//! Authenticates as a service account (RS256 JWT bearer grant), finds the
//! spreadsheet by name through the Drive API or creates and shares it, then
//! replaces the first worksheet's content with the header and one row per paper.

use crate::error::{HarvestError, Result};
use crate::http;
use crate::record::{PaperRecord, COLUMNS};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use tracing::{debug, info};

/// Drive API base URL
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Sheets API base URL
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// OAuth scopes requested for the service account
pub const SCOPES: &[&str] = &[
    "https://spreadsheets.google.com/feeds",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive",
];

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Fields of a Google service-account key file that we need
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Read a service-account JSON key file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Spreadsheet {
    spreadsheet_id: String,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Outcome of a publish call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSummary {
    pub spreadsheet_id: String,
    /// Whether the spreadsheet had to be created
    pub created: bool,
    /// Data rows written, header excluded
    pub rows: usize,
}

/// Google Sheets client bound to one service account
pub struct SheetsPublisher {
    client: Client,
    key: ServiceAccountKey,
    drive_base: String,
    sheets_base: String,
}

impl SheetsPublisher {
    /// Create a publisher from an already loaded key
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        Ok(Self {
            client: http::default_client()?,
            key,
            drive_base: DRIVE_API_BASE.to_string(),
            sheets_base: SHEETS_API_BASE.to_string(),
        })
    }

    /// Create a publisher from a key file on disk
    pub fn from_credentials_file(path: &Path) -> Result<Self> {
        Self::new(ServiceAccountKey::from_file(path)?)
    }

    /// Override the Drive and Sheets API base URLs
    pub fn with_endpoints(mut self, drive_base: &str, sheets_base: &str) -> Self {
        self.drive_base = drive_base.trim_end_matches('/').to_string();
        self.sheets_base = sheets_base.trim_end_matches('/').to_string();
        self
    }

    /// Replace the content of spreadsheet `sheet_name` with `papers`.
    ///
    /// Creates the spreadsheet when it does not exist. All errors propagate.
    pub async fn publish(&self, papers: &[PaperRecord], sheet_name: &str) -> Result<PublishSummary> {
        let token = self.access_token().await?;

        let (spreadsheet_id, created) = match self.find_spreadsheet(&token, sheet_name).await? {
            Some(id) => (id, false),
            None => {
                let id = self.create_spreadsheet(&token, sheet_name).await?;
                self.share_with_service_account(&token, &id).await?;
                (id, true)
            }
        };

        let worksheet = self.first_worksheet(&token, &spreadsheet_id).await?;
        let range = quote_sheet_range(&worksheet);
        self.clear(&token, &spreadsheet_id, &range).await?;

        let mut rows: Vec<Vec<String>> = Vec::with_capacity(papers.len() + 1);
        rows.push(COLUMNS.iter().map(|c| c.to_string()).collect());
        rows.extend(papers.iter().map(PaperRecord::to_row));
        self.append(&token, &spreadsheet_id, &range, &rows).await?;

        info!(
            sheet = sheet_name,
            spreadsheet_id = %spreadsheet_id,
            created = created,
            rows = papers.len(),
            "Published papers to Google Sheets"
        );

        Ok(PublishSummary {
            spreadsheet_id,
            created,
            rows: papers.len(),
        })
    }

    /// Exchange a signed JWT assertion for an access token
    async fn access_token(&self) -> Result<String> {
        let assertion = self.signed_assertion()?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HarvestError::Auth(format!(
                "Token exchange failed: {} - {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        debug!(client_email = %self.key.client_email, "Obtained access token");
        Ok(token.access_token)
    }

    fn signed_assertion(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPES.join(" "),
            aud: &self.key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| HarvestError::Auth(format!("Invalid private key: {}", e)))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| HarvestError::Auth(format!("Failed to sign JWT: {}", e)))
    }

    async fn find_spreadsheet(&self, token: &str, name: &str) -> Result<Option<String>> {
        let q = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_query_literal(name),
            SPREADSHEET_MIME
        );

        let response = self
            .client
            .get(format!("{}/files", self.drive_base))
            .bearer_auth(token)
            .query(&[("q", q.as_str()), ("fields", "files(id,name)")])
            .send()
            .await?;

        let list: DriveFileList = check(response, "Drive").await?.json().await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_spreadsheet(&self, token: &str, name: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/spreadsheets", self.sheets_base))
            .bearer_auth(token)
            .json(&json!({ "properties": { "title": name } }))
            .send()
            .await?;

        let sheet: Spreadsheet = check(response, "Sheets").await?.json().await?;
        info!(sheet = name, spreadsheet_id = %sheet.spreadsheet_id, "Created spreadsheet");
        Ok(sheet.spreadsheet_id)
    }

    async fn share_with_service_account(&self, token: &str, spreadsheet_id: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/files/{}/permissions", self.drive_base, spreadsheet_id))
            .bearer_auth(token)
            .query(&[("sendNotificationEmail", "false")])
            .json(&json!({
                "type": "user",
                "role": "writer",
                "emailAddress": self.key.client_email,
            }))
            .send()
            .await?;

        check(response, "Drive").await?;
        Ok(())
    }

    async fn first_worksheet(&self, token: &str, spreadsheet_id: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/spreadsheets/{}", self.sheets_base, spreadsheet_id))
            .bearer_auth(token)
            .query(&[("fields", "spreadsheetId,sheets.properties.title")])
            .send()
            .await?;

        let sheet: Spreadsheet = check(response, "Sheets").await?.json().await?;
        sheet
            .sheets
            .into_iter()
            .next()
            .map(|s| s.properties.title)
            .ok_or_else(|| HarvestError::Parse("Spreadsheet has no worksheets".to_string()))
    }

    async fn clear(&self, token: &str, spreadsheet_id: &str, range: &str) -> Result<()> {
        let response = self
            .client
            .post(format!(
                "{}/spreadsheets/{}/values/{}:clear",
                self.sheets_base,
                spreadsheet_id,
                urlencoding::encode(range)
            ))
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await?;

        check(response, "Sheets").await?;
        Ok(())
    }

    async fn append(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        let response = self
            .client
            .post(format!(
                "{}/spreadsheets/{}/values/{}:append",
                self.sheets_base,
                spreadsheet_id,
                urlencoding::encode(range)
            ))
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "majorDimension": "ROWS", "values": rows }))
            .send()
            .await?;

        check(response, "Sheets").await?;
        Ok(())
    }
}

/// Turn a non-success response into an `Api` error
async fn check(response: Response, service: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(HarvestError::api(status, service, &body))
}

/// A1 notation for a whole worksheet: `'Title'`, with embedded quotes doubled
fn quote_sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Escape a string literal for a Drive `q` expression
fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
