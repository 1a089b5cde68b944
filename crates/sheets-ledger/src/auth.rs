//! Sheets API credentials.
//!
//! Either a fixed OAuth access token, or a Google service account whose
//! key signs a JWT assertion that is exchanged for short-lived access
//! tokens. Service account tokens are cached and re-minted shortly before
//! they expire.

use crate::error::LedgerError;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// OAuth scope granting read/write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Google's OAuth token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Maximum lifetime Google accepts for an assertion.
const ASSERTION_LIFETIME: Duration = Duration::from_secs(3600);

/// Tokens are re-minted this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// The fields of a service account key file the token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: SecretString,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.into()
}

impl ServiceAccountKey {
    /// Parse the JSON key file downloaded from the Cloud console.
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json)
            .map_err(|e| LedgerError::Auth(format!("invalid service account JSON: {}", e)))
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME.as_secs()
}

struct CachedToken {
    token: SecretString,
    refresh_at: Instant,
}

/// Mints access tokens from a service account key.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey) -> Result<Self, LedgerError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
            .map_err(|e| LedgerError::Auth(format!("invalid service account key: {}", e)))?;

        Ok(Self {
            key,
            signing_key,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// A valid access token, from cache or freshly exchanged.
    async fn access_token(&self, client: &Client) -> Result<String, LedgerError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.token.expose_secret().clone());
            }
            debug!("Sheets access token expiring, refreshing");
        }

        let response = self.exchange(client).await?;
        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(REFRESH_MARGIN);
        let token = response.access_token;

        *cached = Some(CachedToken {
            token: SecretString::new(token.clone()),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(token)
    }

    fn assertion(&self) -> Result<String, LedgerError> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| LedgerError::Auth(format!("system clock before epoch: {}", e)))?
            .as_secs();

        let claims = Claims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME.as_secs(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| LedgerError::Auth(format!("failed to sign assertion: {}", e)))
    }

    async fn exchange(&self, client: &Client) -> Result<TokenResponse, LedgerError> {
        let assertion = self.assertion()?;

        let response = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, "Service account token exchange failed");
            return Err(LedgerError::Auth(format!(
                "token exchange failed ({}): {}",
                status, message
            )));
        }

        let token: TokenResponse = response.json().await?;
        info!(
            "Obtained Sheets access token for {} (expires in {}s)",
            self.key.client_email, token.expires_in
        );
        Ok(token)
    }
}

/// How [`crate::SheetsLedger`] authorizes its requests.
#[derive(Clone)]
pub enum SheetsAuth {
    /// Fixed bearer token, used as-is until it stops working.
    AccessToken(SecretString),
    /// Service account; tokens are minted and refreshed as needed.
    ServiceAccount(Arc<ServiceAccountAuth>),
}

impl SheetsAuth {
    /// Service account credentials from the contents of a key file.
    pub fn service_account(json: &str) -> Result<Self, LedgerError> {
        Self::from_key(ServiceAccountKey::from_json(json)?)
    }

    pub fn from_key(key: ServiceAccountKey) -> Result<Self, LedgerError> {
        Ok(Self::ServiceAccount(Arc::new(ServiceAccountAuth::new(key)?)))
    }

    pub(crate) async fn bearer_token(&self, client: &Client) -> Result<String, LedgerError> {
        match self {
            SheetsAuth::AccessToken(token) => Ok(token.expose_secret().clone()),
            SheetsAuth::ServiceAccount(auth) => auth.access_token(client).await,
        }
    }
}

impl From<SecretString> for SheetsAuth {
    fn from(token: SecretString) -> Self {
        SheetsAuth::AccessToken(token)
    }
}
