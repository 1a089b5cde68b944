//! Application configuration loaded from environment variables.

use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

/// Upper bound for `registration.capacity`.
pub const MAX_CAPACITY: usize = 1_000_000;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Signal configuration
    pub signal: SignalConfig,

    /// Ledger backend selection
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Google Sheets configuration (used by the `sheets` backend)
    #[serde(default)]
    pub sheets: SheetsConfig,

    /// Registration rules
    pub registration: RegistrationConfig,

    /// Verification endpoint configuration
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Bot configuration
    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    /// Signal CLI REST API endpoint
    #[serde(default = "default_signal_service")]
    pub service_url: String,

    /// Phone number of the bot's Signal account
    pub phone_number: String,

    /// Poll interval for messages
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Delay before polling again after a failed receive
    #[serde(default = "default_error_backoff", with = "humantime_serde")]
    pub error_backoff: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    /// Google Sheets spreadsheet
    Sheets,
    /// Process memory (rows are lost on restart)
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_backend")]
    pub backend: LedgerBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetsConfig {
    /// Spreadsheet id, or a URL containing `/spreadsheets/d/<id>/`
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Service account key file contents (JSON)
    #[serde(default)]
    pub credentials: Option<SecretString>,

    /// Fixed OAuth bearer token; overrides `credentials` when set
    #[serde(default)]
    pub access_token: Option<SecretString>,

    /// Sheet holding the registrant rows
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Sheets API base URL
    #[serde(default = "default_sheets_url")]
    pub base_url: String,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    /// Keyword a registration message must end with
    #[serde(default = "default_keyword")]
    pub keyword: String,

    /// Secret the token encryption key is derived from
    pub secret: SecretString,

    /// Public host (and optional port) of the verification endpoint
    pub public_host: String,

    /// Maximum number of registrants
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Serve the verification endpoint from this process
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default implementations
impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: default_ledger_backend(),
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            access_token: None,
            credentials: None,
            sheet_name: default_sheet_name(),
            base_url: default_sheets_url(),
            timeout: default_timeout(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions
fn default_signal_service() -> String {
    "http://signal-api:8080".into()
}

fn default_error_backoff() -> Duration {
    signal_client::DEFAULT_ERROR_BACKOFF
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_ledger_backend() -> LedgerBackend {
    LedgerBackend::Sheets
}

fn default_sheet_name() -> String {
    "Sheet1".into()
}

fn default_sheets_url() -> String {
    sheets_ledger::DEFAULT_BASE_URL.into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_keyword() -> String {
    "daftar".into()
}

fn default_capacity() -> usize {
    80
}

fn default_true() -> bool {
    true
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Phone numbers such as 081234567890 must stay strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the bot cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.registration.secret.expose_secret().trim().is_empty() {
            bail!("REGISTRATION__SECRET must not be empty");
        }
        if self.registration.public_host.trim().is_empty() {
            bail!("REGISTRATION__PUBLIC_HOST must not be empty");
        }
        if self.registration.keyword.trim().is_empty() {
            bail!("REGISTRATION__KEYWORD must not be empty");
        }
        if self.registration.capacity == 0 {
            bail!("REGISTRATION__CAPACITY must be at least 1");
        }
        if self.registration.capacity > MAX_CAPACITY {
            bail!("REGISTRATION__CAPACITY must be at most {}", MAX_CAPACITY);
        }

        if self.ledger.backend == LedgerBackend::Sheets {
            if self.sheets.spreadsheet_id.trim().is_empty() {
                bail!("SHEETS__SPREADSHEET_ID is required for the sheets ledger");
            }
            let is_set = |secret: &Option<SecretString>| {
                secret
                    .as_ref()
                    .is_some_and(|s| !s.expose_secret().trim().is_empty())
            };
            if !is_set(&self.sheets.credentials) && !is_set(&self.sheets.access_token) {
                bail!(
                    "SHEETS__CREDENTIALS (or SHEETS__ACCESS_TOKEN) is required for the sheets ledger"
                );
            }
        }

        Ok(())
    }

    /// Spreadsheet id with any surrounding URL stripped.
    pub fn spreadsheet_id(&self) -> String {
        sheets_ledger::parse_spreadsheet_id(&self.sheets.spreadsheet_id)
    }
}
