//! Common test utilities for integration tests.
#![allow(dead_code)]

use registration_bot::{RegistrationHandler, RegistrationService};
use registration_crypto::EncryptionKey;
use sheets_ledger::Ledger;
use signal_client::BotMessage;
use std::sync::Arc;

pub const SECRET: &str = "integration-test-secret";
pub const PUBLIC_HOST: &str = "events.example.com";

pub fn test_key() -> EncryptionKey {
    EncryptionKey::derive(SECRET).unwrap()
}

pub fn test_service(ledger: Arc<dyn Ledger>, capacity: usize) -> Arc<RegistrationService> {
    Arc::new(RegistrationService::new(
        ledger,
        test_key(),
        PUBLIC_HOST,
        capacity,
    ))
}

pub fn test_handler(ledger: Arc<dyn Ledger>, capacity: usize) -> RegistrationHandler {
    RegistrationHandler::new(test_service(ledger, capacity), "daftar")
}

/// Direct message from `source`.
pub fn message_from(source: &str, text: &str) -> BotMessage {
    BotMessage {
        source: source.into(),
        text: text.into(),
        timestamp: 1677652288000,
        is_group: false,
        group_id: None,
        receiving_account: "+6281100000000".into(),
    }
}
