//! Registration workflow: dedupe, capacity check, append, verification QR.

use crate::error::AppResult;
use crate::qr;
use crate::registrant::Registrant;
use registration_crypto::{encrypt, EncryptionKey};
use sheets_ledger::{Column, Ledger, HEADER_ROWS};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};

/// Path prefix of verification URLs.
pub const VERIFICATION_PATH: &str = "/registration-verification";

/// Why a registration was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationFailure {
    /// The phone number is already in the ledger.
    AlreadyRegistered { phone_number: String },
    /// The ledger holds `capacity` registrants.
    CapacityReached,
    /// Ledger, crypto or QR failure. Details are logged, not shown.
    Internal,
}

impl RegistrationFailure {
    /// Text sent back to the registrant.
    pub fn user_message(&self) -> String {
        match self {
            RegistrationFailure::AlreadyRegistered { phone_number } => format!(
                "Nomor telepon {} sudah terdaftar. Setiap nomor hanya dapat mendaftar satu kali.",
                phone_number
            ),
            RegistrationFailure::CapacityReached => {
                "Mohon maaf, kuota pendaftaran sudah penuh.".into()
            }
            RegistrationFailure::Internal => {
                "Maaf, terjadi kesalahan saat memproses pendaftaran Anda. Silakan coba lagi nanti."
                    .into()
            }
        }
    }
}

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered {
        registrant: Registrant,
        verification_url: String,
        /// QR code of `verification_url` as a PNG data URI.
        qr_image: String,
    },
    Rejected(RegistrationFailure),
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered { .. })
    }

    pub fn failure(&self) -> Option<&RegistrationFailure> {
        match self {
            RegistrationOutcome::Rejected(failure) => Some(failure),
            RegistrationOutcome::Registered { .. } => None,
        }
    }
}

/// Registers attendees against a capacity-limited ledger.
///
/// The verification QR code is rendered first; the ledger row is the last
/// thing written. The duplicate check, capacity check and append run under one lock, so
/// concurrent attempts in this process cannot register a phone number twice
/// or overshoot the capacity. Writers outside this process are not covered.
pub struct RegistrationService {
    ledger: Arc<dyn Ledger>,
    key: EncryptionKey,
    public_host: String,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl RegistrationService {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        key: EncryptionKey,
        public_host: impl Into<String>,
        capacity: usize,
    ) -> Self {
        Self {
            ledger,
            key,
            public_host: public_host.into().trim_end_matches('/').to_string(),
            capacity,
            write_lock: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register `registrant`. Never fails: errors become
    /// [`RegistrationFailure::Internal`] after being logged.
    #[instrument(skip(self, registrant), fields(phone_number = %registrant.phone_number))]
    pub async fn register(&self, registrant: Registrant) -> RegistrationOutcome {
        match self.try_register(registrant).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Registration failed: {}", e);
                RegistrationOutcome::Rejected(RegistrationFailure::Internal)
            }
        }
    }

    async fn try_register(&self, registrant: Registrant) -> AppResult<RegistrationOutcome> {
        // Nothing is written to the ledger until the QR code exists.
        let verification_url = self.verification_url(&registrant);
        let qr_image = qr::render_data_uri(verification_url.clone()).await?;

        if let Some(failure) = self.reserve(&registrant).await? {
            return Ok(RegistrationOutcome::Rejected(failure));
        }

        info!("Registered {}", registrant.phone_number);
        Ok(RegistrationOutcome::Registered {
            registrant,
            verification_url,
            qr_image,
        })
    }

    /// Check-then-append under the write lock. Returns the rejection, if any.
    async fn reserve(&self, registrant: &Registrant) -> AppResult<Option<RegistrationFailure>> {
        let _guard = self.write_lock.lock().await;

        if self
            .ledger
            .column_contains(Column::PhoneNumber, &registrant.phone_number)
            .await?
        {
            info!("Phone number {} already registered", registrant.phone_number);
            return Ok(Some(RegistrationFailure::AlreadyRegistered {
                phone_number: registrant.phone_number.clone(),
            }));
        }

        let rows = self.ledger.count_rows().await?;
        if rows >= self.capacity.saturating_add(HEADER_ROWS) {
            info!(
                "Capacity reached ({} registrants, limit {})",
                rows.saturating_sub(HEADER_ROWS),
                self.capacity
            );
            return Ok(Some(RegistrationFailure::CapacityReached));
        }

        self.ledger.append_row(&registrant.to_row()).await?;
        Ok(None)
    }

    /// `http://{host}/registration-verification/{urlencoded token}`
    pub fn verification_url(&self, registrant: &Registrant) -> String {
        let token = encrypt(&registrant.payload(), &self.key);
        format!(
            "http://{}{}/{}",
            self.public_host,
            VERIFICATION_PATH,
            urlencoding::encode(token.as_str())
        )
    }
}
