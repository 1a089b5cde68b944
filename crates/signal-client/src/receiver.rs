//! Polling message receiver.

use crate::client::SignalClient;
use crate::types::*;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, error};

/// Default delay after a failed receive call.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Turns the receive endpoint into a stream of text messages.
///
/// Envelopes without text (receipts, typing indicators) are skipped.
pub struct MessageReceiver {
    client: SignalClient,
    poll_interval: Duration,
    error_backoff: Duration,
}

impl MessageReceiver {
    pub fn new(client: SignalClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    /// Override the delay after a failed receive call.
    pub fn with_error_backoff(mut self, error_backoff: Duration) -> Self {
        self.error_backoff = error_backoff;
        self
    }

    /// Poll forever, yielding messages in arrival order.
    pub fn stream(self) -> impl Stream<Item = BotMessage> {
        async_stream::stream! {
            loop {
                let delay = match self.client.receive().await {
                    Ok(messages) => {
                        for bot_msg in messages.iter().filter_map(BotMessage::from_incoming) {
                            debug!(
                                "Received: {} from {}",
                                bot_msg.text.chars().take(50).collect::<String>(),
                                bot_msg.source
                            );
                            yield bot_msg;
                        }
                        self.poll_interval
                    }
                    Err(e) => {
                        error!("Receive error: {}", e);
                        self.error_backoff
                    }
                };

                sleep(delay).await;
            }
        }
    }
}
