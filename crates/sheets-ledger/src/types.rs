//! Ledger schema and Sheets API types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of header rows at the top of the sheet.
///
/// Row counts returned by a [`Ledger`](crate::Ledger) include these rows.
pub const HEADER_ROWS: usize = 1;

/// Header written to a fresh in-memory ledger.
pub const HEADER: [&str; 3] = ["Nama", "Alamat", "Nomor Telepon"];

/// Ledger columns, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Address,
    PhoneNumber,
}

impl Column {
    /// Spreadsheet column letter.
    pub fn letter(self) -> &'static str {
        match self {
            Column::Name => "A",
            Column::Address => "B",
            Column::PhoneNumber => "C",
        }
    }

    /// Zero-based position within a row.
    pub fn index(self) -> usize {
        match self {
            Column::Name => 0,
            Column::Address => 1,
            Column::PhoneNumber => 2,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// `ValueRange` resource of the Sheets v4 API.
///
/// `values` is omitted by the API when the range is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

/// Response of `spreadsheets.values.append`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    pub spreadsheet_id: Option<String>,
    pub table_range: Option<String>,
    pub updates: Option<UpdateValuesResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    pub updated_range: Option<String>,
    pub updated_rows: Option<u64>,
}

/// Render a cell as the string the sheet displays.
pub(crate) fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
