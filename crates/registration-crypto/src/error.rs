//! Crypto errors.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Encryption secret is empty")]
    EmptySecret,

    #[error("Malformed verification token: {0}")]
    MalformedToken(String),

    #[error("Decryption failed: {0}")]
    Decrypt(String),
}
