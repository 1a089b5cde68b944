//! Verification token crypto for registration-bot.
//!
//! Registrant data is encrypted into an opaque token that is embedded in the
//! verification URL carried by the QR code. Only holders of the configured
//! secret can recover the plaintext.

mod error;
mod key;
mod token;

pub use error::CryptoError;
pub use key::{EncryptionKey, KEY_SIZE};
pub use token::{decrypt, encrypt, VerificationToken, IV_SIZE, TOKEN_SEPARATOR};

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> EncryptionKey {
        EncryptionKey::derive("correct horse battery staple").unwrap()
    }

    #[test]
    fn test_derive_key_rejects_empty_secret() {
        assert_eq!(EncryptionKey::derive("").unwrap_err(), CryptoError::EmptySecret);
        assert_eq!(EncryptionKey::derive("   ").unwrap_err(), CryptoError::EmptySecret);
    }

    #[test]
    fn test_derive_key_is_deterministic() {
        let token = encrypt("Alice|Jl Merdeka|081234567890", &test_key());

        // A key derived again from the same secret decrypts it
        let again = EncryptionKey::derive("correct horse battery staple").unwrap();
        assert_eq!(decrypt(&token, &again).unwrap(), "Alice|Jl Merdeka|081234567890");
    }

    #[test]
    fn test_derive_key_matches_sha256() {
        // SHA-256("abc")
        let expected: [u8; 32] = hex::decode(
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        )
        .unwrap()
        .try_into()
        .unwrap();

        let token = encrypt("payload", &EncryptionKey::from_bytes(expected));
        let derived = EncryptionKey::derive("abc").unwrap();
        assert_eq!(decrypt(&token, &derived).unwrap(), "payload");
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let debug = format!("{:?}", test_key());
        assert_eq!(debug, "EncryptionKey([REDACTED])");
    }

    #[test]
    fn test_round_trip() {
        let key = test_key();
        for plaintext in [
            "",
            "a",
            "exactly sixteen!",
            "Alice|Jl Merdeka|081234567890",
            "Budi Santoso|Jl. Sudirman No. 5, Jakarta|+6281298765432",
            "ünïcödé|日本語|☎",
        ] {
            let token = encrypt(plaintext, &key);
            assert_eq!(decrypt(&token, &key).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_token_format() {
        let token = encrypt("Alice|Jl Merdeka|081234567890", &test_key());
        let (iv, ciphertext) = token.as_str().split_once(':').unwrap();

        assert_eq!(iv.len(), IV_SIZE * 2);
        assert!(iv.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        // 29 bytes of plaintext pad to two blocks
        assert_eq!(ciphertext.len(), 64);
    }

    #[test]
    fn test_fresh_iv_per_encryption() {
        let key = test_key();
        let first = encrypt("same plaintext", &key);
        let second = encrypt("same plaintext", &key);

        assert_ne!(first, second);
        assert_ne!(
            first.as_str().split_once(':').unwrap().0,
            second.as_str().split_once(':').unwrap().0
        );
    }

    #[test]
    fn test_wrong_key_does_not_recover_plaintext() {
        let token = encrypt("Alice|Jl Merdeka|081234567890", &test_key());
        let other = EncryptionKey::derive("another secret").unwrap();

        // CBC has no authentication tag: a wrong key either fails the padding
        // check or yields garbage, never the original plaintext.
        match decrypt(&token, &other) {
            Ok(plaintext) => assert_ne!(plaintext, "Alice|Jl Merdeka|081234567890"),
            Err(e) => assert!(matches!(e, CryptoError::Decrypt(_))),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_tokens() {
        for raw in [
            "",
            "no-separator",
            "zz:00112233445566778899aabbccddeeff",
            "0011:00112233445566778899aabbccddeeff",
            "00112233445566778899aabbccddeeff:",
            "00112233445566778899aabbccddeeff:0011",
        ] {
            assert!(
                matches!(VerificationToken::parse(raw), Err(CryptoError::MalformedToken(_))),
                "accepted {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_accepts_encrypted_token() {
        let token = encrypt("Alice|Jl Merdeka|081234567890", &test_key());
        let parsed = VerificationToken::parse(token.as_str()).unwrap();
        assert_eq!(parsed, token);
    }
}
