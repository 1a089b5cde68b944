//! Event registration bot - Main entry point.

use anyhow::Context;
use registration_bot::config::{Config, LedgerBackend};
use registration_bot::error::AppResult;
use registration_bot::verification::{create_router, VerificationState};
use registration_bot::{RegistrationHandler, RegistrationService, Reply};
use registration_crypto::EncryptionKey;
use secrecy::ExposeSecret;
use sheets_ledger::{Ledger, MemoryLedger, ServiceAccountKey, SheetsAuth, SheetsLedger};
use signal_client::{Attachment, BotMessage, MessageReceiver, SignalClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filename of the QR attachment.
const QR_FILENAME: &str = "registration.png";

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level);

    info!("Starting registration bot...");

    let key = EncryptionKey::from_secret(&config.registration.secret)
        .context("Failed to derive encryption key")?;

    let ledger = build_ledger(&config)?;

    let signal = SignalClient::new(&config.signal.service_url, &config.signal.phone_number)
        .context("Failed to create Signal client")?;

    if !signal.health_check().await {
        error!("Signal API not reachable at {}", config.signal.service_url);
        return Err(anyhow::anyhow!("Signal API not reachable").into());
    }
    info!("Signal API healthy");

    let service = Arc::new(RegistrationService::new(
        ledger.clone(),
        key.clone(),
        &config.registration.public_host,
        config.registration.capacity,
    ));
    let handler = Arc::new(RegistrationHandler::new(
        service,
        &config.registration.keyword,
    ));

    if config.verification.enabled {
        spawn_verification_server(&config, VerificationState::new(ledger, key)).await?;
    } else {
        info!("Verification endpoint disabled");
    }

    info!(
        "Listening for messages ending with \"{}\" (capacity {})",
        handler.keyword(),
        config.registration.capacity
    );

    let receiver = MessageReceiver::new(signal.clone(), config.signal.poll_interval)
        .with_error_backoff(config.signal.error_backoff);
    let mut stream = Box::pin(receiver.stream());

    // Main message loop: one task per inbound message
    loop {
        tokio::select! {
            Some(message) = stream.next() => {
                let handler = handler.clone();
                let signal = signal.clone();
                tokio::spawn(async move {
                    if let Some(reply) = handler.handle(&message).await {
                        deliver(&signal, &message, reply).await;
                    }
                });
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}

fn build_ledger(config: &Config) -> AppResult<Arc<dyn Ledger>> {
    match config.ledger.backend {
        LedgerBackend::Sheets => {
            let access_token = config
                .sheets
                .access_token
                .as_ref()
                .filter(|t| !t.expose_secret().trim().is_empty());

            let auth = match access_token {
                Some(token) => {
                    warn!("Using fixed SHEETS__ACCESS_TOKEN; it will not be refreshed");
                    SheetsAuth::from(token.clone())
                }
                None => {
                    let credentials = config
                        .sheets
                        .credentials
                        .as_ref()
                        .context("SHEETS__CREDENTIALS is not set")?;
                    let key = ServiceAccountKey::from_json(credentials.expose_secret())?;
                    info!("Authenticating to Sheets as {}", key.client_email);
                    SheetsAuth::from_key(key)?
                }
            };
            let spreadsheet_id = config.spreadsheet_id();

            let ledger = SheetsLedger::new(
                &config.sheets.base_url,
                &spreadsheet_id,
                &config.sheets.sheet_name,
                auth,
                config.sheets.timeout,
            )?;

            info!(
                "Using Google Sheets ledger (spreadsheet {}, sheet {})",
                spreadsheet_id, config.sheets.sheet_name
            );
            Ok(Arc::new(ledger))
        }
        LedgerBackend::Memory => {
            warn!("Using in-memory ledger (registrations will be lost on restart)");
            Ok(Arc::new(MemoryLedger::new()))
        }
    }
}

async fn spawn_verification_server(config: &Config, state: VerificationState) -> AppResult<()> {
    let addr = SocketAddr::new(
        config
            .verification
            .listen_addr
            .parse()
            .context("Invalid VERIFICATION__LISTEN_ADDR")?,
        config.verification.port,
    );

    let listener = TcpListener::bind(addr).await?;
    info!("Verification endpoint listening on {}", addr);

    let app = create_router(state);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Verification server error: {}", e);
        }
    });

    Ok(())
}

async fn deliver(signal: &SignalClient, message: &BotMessage, reply: Reply) {
    let result = match reply {
        Reply::Text(text) => signal.reply(message, &text).await,
        Reply::Image { data_uri, caption } => {
            match Attachment::from_data_uri(&data_uri, QR_FILENAME) {
                Some(attachment) => {
                    signal
                        .reply_with_attachment(message, &caption, &attachment)
                        .await
                }
                None => {
                    error!("QR image is not a base64 data URI");
                    signal
                        .reply(
                            message,
                            &registration_bot::RegistrationFailure::Internal.user_message(),
                        )
                        .await
                }
            }
        }
    };

    if let Err(e) = result {
        error!("Failed to send reply to {}: {}", message.reply_target(), e);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
