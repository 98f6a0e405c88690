//! Google Sheets values API client
//!
//! Reads a whole sheet as rows of JSON cell values and writes single cells in RAW
//! input mode. Requests go through the storage channel's [`RateLimitedClient`] and carry
//! the OAuth access token obtained by [`crate::auth`].

use crate::cell::qualify;
use crate::config::{READ_COLUMNS, SHEETS_BASE_URL};
use crate::error::{Error, Result};
use crate::rate_limit::RateLimitedClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One spreadsheet row. Trailing empty cells are usually omitted by the API.
pub type Row = Vec<Value>;

/// Key-addressed tabular storage
#[async_trait]
pub trait CellStore: Send + Sync {
    /// All rows of the sheet, header first.
    async fn read_rows(&self) -> Result<Vec<Row>>;

    /// Overwrite one cell, addressed like `C42`, with a literal value.
    async fn write_cell(&self, cell: &str, value: &str) -> Result<()>;
}

/// Request/response body of the values endpoints
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    major_dimension: Option<String>,
    #[serde(default)]
    values: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Client for one sheet of one spreadsheet
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: RateLimitedClient,
    base_url: String,
    access_token: String,
    sheet_key: String,
    sheet_name: String,
}

impl SheetsClient {
    /// `sheet_key` is the `KEY` in `docs.google.com/spreadsheets/d/KEY/edit`; an empty
    /// `sheet_name` means the first sheet.
    pub fn new(
        http: RateLimitedClient,
        access_token: impl Into<String>,
        sheet_key: impl Into<String>,
        sheet_name: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: SHEETS_BASE_URL.to_string(),
            access_token: access_token.into(),
            sheet_key: sheet_key.into(),
            sheet_name: sheet_name.into(),
        }
    }

    /// Point the client at another API root (a mock server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(&self.sheet_key),
            urlencoding::encode(&qualify(&self.sheet_name, range))
        )
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String> {
        let request = builder.bearer_auth(&self.access_token).build()?;
        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }
        match serde_json::from_str::<GoogleErrorResponse>(&body) {
            Ok(GoogleErrorResponse { error }) => Err(Error::ApiResponse {
                code: if error.status.is_empty() {
                    error.code.to_string()
                } else {
                    error.status
                },
                details: error.message,
            }),
            Err(_) => Err(Error::HttpStatus(status)),
        }
    }
}

#[async_trait]
impl CellStore for SheetsClient {
    async fn read_rows(&self) -> Result<Vec<Row>> {
        let url = self.values_url(READ_COLUMNS);
        let body = self
            .send(self.http.request(reqwest::Method::GET, &url))
            .await?;
        let range: ValueRange = serde_json::from_str(&body)?;
        log::info!(
            "Read {} rows from {}",
            range.values.len(),
            range.range.as_deref().unwrap_or(READ_COLUMNS)
        );
        Ok(range.values)
    }

    async fn write_cell(&self, cell: &str, value: &str) -> Result<()> {
        let target = qualify(&self.sheet_name, cell);
        let url = self.values_url(cell);
        let body = ValueRange {
            range: Some(target),
            major_dimension: Some("ROWS".to_string()),
            values: vec![vec![Value::String(value.to_string())]],
        };
        self.send(
            self.http
                .request(reqwest::Method::PUT, &url)
                .query(&[("valueInputOption", "RAW")])
                .json(&body),
        )
        .await?;
        log::debug!("Set {} = {:?}", cell, value);
        Ok(())
    }
}

#[cfg(test)]
#[path = "sheets_tests.rs"]
mod tests;
