//! In-memory ledger for local runs and tests.

use crate::error::LedgerError;
use crate::types::{Column, HEADER};
use crate::Ledger;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Ledger kept in process memory. Rows are lost on restart.
#[derive(Clone)]
pub struct MemoryLedger {
    rows: Arc<RwLock<Vec<Vec<String>>>>,
}

impl MemoryLedger {
    /// Create a ledger holding only the header row.
    pub fn new() -> Self {
        Self::with_rows(vec![HEADER.iter().map(|h| h.to_string()).collect()])
    }

    /// Create a ledger with the given rows (header included).
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    /// Snapshot of all stored rows.
    pub async fn rows(&self) -> Vec<Vec<String>> {
        self.rows.read().await.clone()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn count_rows(&self) -> Result<usize, LedgerError> {
        Ok(self.rows.read().await.len())
    }

    async fn column_contains(&self, column: Column, value: &str) -> Result<bool, LedgerError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter_map(|row| row.get(column.index()))
            .any(|cell| cell == value))
    }

    async fn append_row(&self, row: &[String]) -> Result<(), LedgerError> {
        let mut rows = self.rows.write().await;
        rows.push(row.to_vec());
        debug!("Memory ledger: appended row (total: {})", rows.len());
        Ok(())
    }
}
