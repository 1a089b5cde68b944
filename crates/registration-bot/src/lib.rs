//! Event registration bot.
//!
//! Listens for `name_address_phoneNumber_keyword` chat messages, records the
//! registrant in a spreadsheet ledger (no duplicates, capped capacity) and
//! replies with a QR code of an encrypted verification URL.

pub mod config;
pub mod error;
pub mod handler;
pub mod qr;
pub mod registrant;
pub mod registration;
pub mod verification;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handler::{RegistrationHandler, Reply};
pub use registrant::Registrant;
pub use registration::{RegistrationFailure, RegistrationOutcome, RegistrationService};
pub use verification::{create_router, VerificationState};
