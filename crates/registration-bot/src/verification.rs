//! HTTP endpoint behind the URL encoded in registration QR codes.

use crate::registrant::Registrant;
use crate::registration::VERIFICATION_PATH;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use registration_crypto::{decrypt, EncryptionKey, VerificationToken};
use serde::Serialize;
use sheets_ledger::{Column, Ledger, LedgerError};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state of the verification endpoint.
#[derive(Clone)]
pub struct VerificationState {
    pub ledger: Arc<dyn Ledger>,
    pub key: Arc<EncryptionKey>,
}

impl VerificationState {
    pub fn new(ledger: Arc<dyn Ledger>, key: EncryptionKey) -> Self {
        Self {
            ledger,
            key: Arc::new(key),
        }
    }
}

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Invalid verification token")]
    InvalidToken,

    #[error("Registrant is not registered")]
    NotRegistered,

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for VerificationError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            VerificationError::InvalidToken => (StatusCode::BAD_REQUEST, "INVALID_TOKEN"),
            VerificationError::NotRegistered => (StatusCode::NOT_FOUND, "NOT_REGISTERED"),
            VerificationError::Ledger(_) => (StatusCode::BAD_GATEWAY, "LEDGER_ERROR"),
        };

        // Ledger details stay in the log
        let error = match &self {
            VerificationError::Ledger(e) => {
                warn!("Verification lookup failed: {}", e);
                "Ledger unavailable".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub name: String,
    pub address: String,
    pub phone_number: String,
    pub registered: bool,
}

/// Build the verification router.
pub fn create_router(state: VerificationState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            &format!("{}/:token", VERIFICATION_PATH),
            get(verify_registration),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn verify_registration(
    State(state): State<VerificationState>,
    Path(token): Path<String>,
) -> Result<Json<VerificationResponse>, VerificationError> {
    let token = VerificationToken::parse(&token).map_err(|_| VerificationError::InvalidToken)?;
    let payload = decrypt(&token, &state.key).map_err(|_| VerificationError::InvalidToken)?;
    let registrant = Registrant::from_payload(&payload).ok_or(VerificationError::InvalidToken)?;

    if !state
        .ledger
        .column_contains(Column::PhoneNumber, &registrant.phone_number)
        .await?
    {
        return Err(VerificationError::NotRegistered);
    }

    info!("Verified registration of {}", registrant.phone_number);
    Ok(Json(VerificationResponse {
        name: registrant.name,
        address: registrant.address,
        phone_number: registrant.phone_number,
        registered: true,
    }))
}
