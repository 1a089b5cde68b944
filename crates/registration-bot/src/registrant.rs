//! Registrant record.

use serde::{Deserialize, Serialize};

/// Separator between fields in the encrypted verification payload.
pub const PAYLOAD_SEPARATOR: char = '|';

/// A person registering for the event. Persisted as one ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
    pub name: String,
    pub address: String,
    pub phone_number: String,
}

impl Registrant {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            phone_number: phone_number.into(),
        }
    }

    /// Ledger row, in column order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.address.clone(),
            self.phone_number.clone(),
        ]
    }

    /// Plaintext that gets encrypted into the verification token.
    pub fn payload(&self) -> String {
        [
            self.name.as_str(),
            self.address.as_str(),
            self.phone_number.as_str(),
        ]
        .join(&PAYLOAD_SEPARATOR.to_string())
    }

    /// Inverse of [`Registrant::payload`].
    ///
    /// Returns `None` unless the payload has exactly three fields.
    pub fn from_payload(payload: &str) -> Option<Self> {
        let mut parts = payload.split(PAYLOAD_SEPARATOR);
        let registrant = Self::new(parts.next()?, parts.next()?, parts.next()?);
        match parts.next() {
            Some(_) => None,
            None => Some(registrant),
        }
    }
}
