//! AES-256-CBC verification tokens.
//!
//! Token format: `hex(iv) ":" hex(ciphertext)`, with a fresh random
//! 16-byte IV per token and PKCS#7 padding.

use crate::error::CryptoError;
use crate::key::EncryptionKey;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use std::fmt;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// IV size for AES-CBC (one block).
pub const IV_SIZE: usize = 16;

/// Separator between the hex IV and the hex ciphertext.
pub const TOKEN_SEPARATOR: char = ':';

/// Opaque encrypted token embedded in verification URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// Wrap a token received from outside, checking only its shape.
    pub fn parse(raw: &str) -> Result<Self, CryptoError> {
        split_token(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VerificationToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encrypt `plaintext` under `key` with a fresh random IV.
pub fn encrypt(plaintext: &str, key: &EncryptionKey) -> VerificationToken {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(&(*key.as_bytes()).into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    VerificationToken(format!(
        "{}{}{}",
        hex::encode(iv),
        TOKEN_SEPARATOR,
        hex::encode(ciphertext)
    ))
}

/// Decrypt a token produced by [`encrypt`].
pub fn decrypt(token: &VerificationToken, key: &EncryptionKey) -> Result<String, CryptoError> {
    let (iv, ciphertext) = split_token(token.as_str())?;

    let plaintext = Aes256CbcDec::new(&(*key.as_bytes()).into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| CryptoError::Decrypt("invalid padding".into()))?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::Decrypt("plaintext is not UTF-8".into()))
}

fn split_token(raw: &str) -> Result<([u8; IV_SIZE], Vec<u8>), CryptoError> {
    let (iv_hex, ct_hex) = raw
        .split_once(TOKEN_SEPARATOR)
        .ok_or_else(|| CryptoError::MalformedToken("missing separator".into()))?;

    let iv_bytes =
        hex::decode(iv_hex).map_err(|e| CryptoError::MalformedToken(format!("iv: {}", e)))?;
    let iv: [u8; IV_SIZE] = iv_bytes.try_into().map_err(|v: Vec<u8>| {
        CryptoError::MalformedToken(format!("iv must be {} bytes, got {}", IV_SIZE, v.len()))
    })?;

    let ciphertext = hex::decode(ct_hex)
        .map_err(|e| CryptoError::MalformedToken(format!("ciphertext: {}", e)))?;
    if ciphertext.is_empty() || ciphertext.len() % IV_SIZE != 0 {
        return Err(CryptoError::MalformedToken(
            "ciphertext is not a whole number of blocks".into(),
        ));
    }

    Ok((iv, ciphertext))
}
