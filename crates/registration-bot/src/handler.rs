//! Inbound message handling.
//!
//! A registration message looks like `name_address_phoneNumber_keyword`.
//! Messages that do not end with the keyword are ignored without a reply.

use crate::registrant::Registrant;
use crate::registration::{RegistrationOutcome, RegistrationService};
use signal_client::BotMessage;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Field delimiter of registration messages.
pub const FIELD_DELIMITER: char = '_';

/// Number of fields in a registration message, keyword included.
pub const FIELD_COUNT: usize = 4;

/// Caption sent with the QR code.
pub const SUCCESS_CAPTION: &str =
    "Pendaftaran berhasil! Tunjukkan kode QR ini kepada panitia saat verifikasi.";

/// Reply to send back to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// PNG image as a `data:image/png;base64,...` URI.
    Image { data_uri: String, caption: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 4 fields separated by '_', got {0}")]
    FieldCount(usize),
}

/// Turns registration messages into registrations.
pub struct RegistrationHandler {
    service: Arc<RegistrationService>,
    keyword: String,
}

impl RegistrationHandler {
    pub fn new(service: Arc<RegistrationService>, keyword: impl Into<String>) -> Self {
        Self {
            service,
            keyword: keyword.into().trim().to_lowercase(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Case-insensitive keyword suffix check.
    pub fn matches(&self, text: &str) -> bool {
        text.trim_end().to_lowercase().ends_with(&self.keyword)
    }

    /// Split a registration message into its registrant.
    ///
    /// The fourth field is the keyword; it is not checked again here.
    pub fn parse(text: &str) -> Result<Registrant, ParseError> {
        let parts: Vec<&str> = text.trim().split(FIELD_DELIMITER).map(str::trim).collect();

        match parts.as_slice() {
            [name, address, phone_number, _keyword] => {
                Ok(Registrant::new(*name, *address, *phone_number))
            }
            _ => Err(ParseError::FieldCount(parts.len())),
        }
    }

    /// Usage instructions sent for malformed registration messages.
    pub fn usage_message(&self) -> String {
        format!(
            "Format pendaftaran salah. Kirim pesan dengan format:\n\
             Nama_Alamat_NomorTelepon_{keyword}\n\n\
             Contoh: Budi_Jl Merdeka 10_081234567890_{keyword}",
            keyword = self.keyword
        )
    }

    /// Handle one inbound message. `None` means no reply.
    pub async fn handle(&self, message: &BotMessage) -> Option<Reply> {
        if !self.matches(&message.text) {
            debug!(
                "Message from {} does not end with \"{}\", ignoring",
                message.source, self.keyword
            );
            return None;
        }

        let registrant = match Self::parse(&message.text) {
            Ok(registrant) => registrant,
            Err(e) => {
                info!("Invalid registration message from {}: {}", message.source, e);
                return Some(Reply::Text(self.usage_message()));
            }
        };

        let reply = match self.service.register(registrant).await {
            RegistrationOutcome::Registered { qr_image, .. } => Reply::Image {
                data_uri: qr_image,
                caption: SUCCESS_CAPTION.into(),
            },
            RegistrationOutcome::Rejected(failure) => Reply::Text(failure.user_message()),
        };

        Some(reply)
    }
}
