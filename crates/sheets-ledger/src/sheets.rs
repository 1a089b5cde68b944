//! Google Sheets v4 REST backend.

use crate::auth::SheetsAuth;
use crate::error::LedgerError;
use crate::types::*;
use crate::Ledger;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

/// Default Sheets API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// Ledger stored in one sheet of a Google spreadsheet.
///
/// Every read is a fresh range fetch; nothing is cached.
#[derive(Clone)]
pub struct SheetsLedger {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    auth: SheetsAuth,
}

impl SheetsLedger {
    /// Create a new Sheets ledger client.
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        auth: impl Into<SheetsAuth>,
        timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            auth: auth.into(),
        })
    }

    /// Spreadsheet this ledger writes to.
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            encode(&self.spreadsheet_id),
            encode(range)
        )
    }

    /// A1 range covering every ledger column.
    fn table_range(&self) -> String {
        format!(
            "{}!{}:{}",
            self.sheet_name,
            Column::Name.letter(),
            Column::PhoneNumber.letter()
        )
    }

    fn column_range(&self, column: Column) -> String {
        format!("{}!{}:{}", self.sheet_name, column.letter(), column.letter())
    }

    async fn get_values(&self, range: &str) -> Result<ValueRange, LedgerError> {
        let response = self
            .client
            .get(self.values_url(range))
            .bearer_auth(self.auth.bearer_token(&self.client).await?)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, LedgerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    warn!(status = %status, "Sheets API request failed");
    Err(LedgerError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Ledger for SheetsLedger {
    #[instrument(skip(self))]
    async fn count_rows(&self) -> Result<usize, LedgerError> {
        let values = self.get_values(&self.table_range()).await?;
        debug!("Ledger holds {} rows", values.values.len());
        Ok(values.values.len())
    }

    #[instrument(skip(self, value))]
    async fn column_contains(&self, column: Column, value: &str) -> Result<bool, LedgerError> {
        let values = self.get_values(&self.column_range(column)).await?;

        Ok(values
            .values
            .iter()
            .flatten()
            .any(|cell| cell_text(cell) == value))
    }

    #[instrument(skip(self, row), fields(field_count = row.len()))]
    async fn append_row(&self, row: &[String]) -> Result<(), LedgerError> {
        let body = ValueRange {
            values: vec![row
                .iter()
                .map(|f| serde_json::Value::String(f.clone()))
                .collect()],
            ..Default::default()
        };

        // RAW keeps phone numbers verbatim; USER_ENTERED would turn
        // "0812..." into the number 812... and break duplicate detection.
        let url = format!(
            "{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.values_url(&self.table_range())
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth.bearer_token(&self.client).await?)
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let appended: AppendValuesResponse = response.json().await?;
        debug!(
            "Appended row at {}",
            appended
                .updates
                .and_then(|u| u.updated_range)
                .unwrap_or_else(|| "unknown range".into())
        );
        Ok(())
    }
}

/// Extract the spreadsheet id from a sharing URL, or return the input
/// unchanged when it is already a bare id.
pub fn parse_spreadsheet_id(url_or_id: &str) -> String {
    static SPREADSHEET_URL: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(|| {
        regex::Regex::new(r"/spreadsheets/d/([a-zA-Z0-9\-_]+)").expect("valid spreadsheet regex")
    });

    let trimmed = url_or_id.trim();
    SPREADSHEET_URL
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| trimmed.to_string())
}
