//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] registration_crypto::CryptoError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] sheets_ledger::LedgerError),

    #[error("Signal error: {0}")]
    Signal(#[from] signal_client::SignalError),

    #[error("QR encoding error: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
