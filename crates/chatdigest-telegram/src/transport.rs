//! Telegram implementation of the digest [`Transport`] seam, plus the
//! long-polling loop that feeds the [`Dispatcher`].

use std::future::Future;
use std::sync::Arc;

use chatdigest::api::RetryConfig;
use chatdigest::dispatch::{Dispatcher, ReplyFuture, Transport};
use chatdigest::router::IncomingMessage;
use chatdigest::store::ChatId;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::{TelegramClient, Update};

/// Author name used when Telegram omits the sender.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// Sends replies through the Bot API.
pub struct TelegramTransport {
    client: Arc<TelegramClient>,
}

impl TelegramTransport {
    pub fn new(client: Arc<TelegramClient>) -> Self {
        Self { client }
    }
}

impl Transport for TelegramTransport {
    fn reply<'a>(&'a self, chat: ChatId, text: &'a str) -> ReplyFuture<'a> {
        Box::pin(async move { self.client.send_message(chat.0, text).await })
    }
}

/// Convert a text message update into a digest event stamped `received_at`.
///
/// Updates without a message or without text yield `None`.
pub fn to_incoming(update: &Update, received_at: DateTime<Utc>) -> Option<IncomingMessage> {
    let message = update.message.as_ref()?;
    let text = message.text.as_ref()?;
    let author = message
        .from
        .as_ref()
        .map(|u| u.first_name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_AUTHOR);
    Some(IncomingMessage {
        chat_id: ChatId(message.chat.id),
        author: author.to_string(),
        text: text.clone(),
        timestamp: received_at,
    })
}

/// Long-poll `client` and submit every text message to `dispatcher` until
/// `shutdown` resolves.
///
/// Poll failures are logged and retried with backoff; the loop never exits
/// on its own. Returns the next offset so a caller could resume.
pub async fn run_polling(
    client: &TelegramClient,
    dispatcher: &Dispatcher,
    shutdown: impl Future<Output = ()>,
) -> i64 {
    let backoff = RetryConfig {
        max_retries: u32::MAX,
        ..RetryConfig::default()
    };
    let mut offset = 0;
    let mut failures: u32 = 0;
    tokio::pin!(shutdown);

    info!("Polling for updates");
    loop {
        let batch = tokio::select! {
            _ = &mut shutdown => break,
            batch = client.get_updates(offset) => batch,
        };

        match batch {
            Ok(updates) => {
                failures = 0;
                for update in &updates {
                    offset = offset.max(update.update_id + 1);
                    match to_incoming(update, Utc::now()) {
                        Some(message) => dispatcher.submit(message),
                        None => debug!(update_id = update.update_id, "Skipping non-text update"),
                    }
                }
            }
            Err(e) => {
                let delay = backoff.delay_for_attempt(failures.min(8));
                failures = failures.saturating_add(1);
                warn!(
                    failures,
                    "getUpdates failed, retrying in {:.1}s: {e}",
                    delay.as_secs_f64()
                );
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
    info!("Polling stopped");
    offset
}
