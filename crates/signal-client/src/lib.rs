//! Signal CLI REST API client.

mod client;
mod error;
mod receiver;
mod types;

pub use client::SignalClient;
pub use error::SignalError;
pub use receiver::{MessageReceiver, DEFAULT_ERROR_BACKOFF};
pub use types::*;
