//! Secret-derived AES-256 key.

use crate::error::CryptoError;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::fmt;

/// Key length required by AES-256.
pub const KEY_SIZE: usize = 32;

/// 256-bit key derived from the configured encryption secret.
///
/// The raw bytes never appear in `Debug` output.
#[derive(Clone)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Derive a key as SHA-256(secret).
    ///
    /// SHA-256 yields exactly [`KEY_SIZE`] bytes, so the digest is used as is.
    pub fn derive(secret: &str) -> Result<Self, CryptoError> {
        if secret.trim().is_empty() {
            return Err(CryptoError::EmptySecret);
        }

        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&digest[..KEY_SIZE]);
        Ok(Self(key))
    }

    /// Derive a key from a secret held in configuration.
    pub fn from_secret(secret: &SecretString) -> Result<Self, CryptoError> {
        Self::derive(secret.expose_secret())
    }

    /// Build a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}
