//! Minimal Telegram Bot API client: long polling and plain-text replies.

use std::time::{Duration, Instant};

use chatdigest::TransportError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Telegram's hard limit on a single message's text.
pub const MAX_MESSAGE_CHARS: usize = 4096;

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

/// One entry from `getUpdates`. Only message updates are requested.
#[derive(Deserialize, Debug, Clone)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<TgMessage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct TgMessage {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    /// Unix time the message was sent.
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: Option<String>,
}

#[derive(Serialize, Debug)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize, Debug)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

// ── Client ─────────────────────────────────────────────────────────

/// Async client for the Bot API methods the digest bot needs.
pub struct TelegramClient {
    client: reqwest::Client,
    base: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: &str, poll_timeout: Duration) -> Result<Self, TransportError> {
        Self::with_api_url(token, TELEGRAM_API_URL, poll_timeout)
    }

    /// Client for a Bot API server at `api_url` (self-hosted or a test mock).
    pub fn with_api_url(
        token: &str,
        api_url: &str,
        poll_timeout: Duration,
    ) -> Result<Self, TransportError> {
        // The HTTP deadline must outlast the server-side long poll.
        let client = reqwest::Client::builder()
            .user_agent(concat!("chatdigest-telegram/", env!("CARGO_PKG_VERSION")))
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            poll_timeout,
        })
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let start = Instant::now();
        let resp = self
            .client
            .post(format!("{}/{method}", self.base))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(format!("{method}: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| TransportError::Request(format!("{method}: failed to read body: {e}")))?;
        trace!(
            "Telegram {method}: HTTP {status} in {:.1}s ({} bytes)",
            start.elapsed().as_secs_f64(),
            text.len()
        );

        let parsed: ApiResponse<T> = serde_json::from_str(&text)
            .map_err(|e| TransportError::Malformed(format!("{method}: {e}")))?;
        if !parsed.ok {
            return Err(TransportError::Api {
                code: parsed.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: parsed.description.unwrap_or_default(),
            });
        }
        parsed
            .result
            .ok_or_else(|| TransportError::Malformed(format!("{method}: missing result")))
    }

    /// Long-poll for message updates with `update_id >= offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &GetUpdates {
                    offset,
                    timeout: self.poll_timeout.as_secs(),
                    allowed_updates: &["message"],
                },
            )
            .await?;
        if !updates.is_empty() {
            debug!(count = updates.len(), offset, "Received updates");
        }
        Ok(updates)
    }

    /// Send `text` to `chat_id`, split into chunks Telegram will accept.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            let _: serde_json::Value = self
                .call("sendMessage", &SendMessage { chat_id, text: chunk })
                .await?;
        }
        Ok(())
    }
}

/// Split `text` into pieces of at most `limit` chars, preferring line breaks.
pub fn split_message(text: &str, limit: usize) -> Vec<&str> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.chars().count() > limit {
        // Byte offset just past the `limit`-th char.
        let hard = rest
            .char_indices()
            .nth(limit)
            .map_or(rest.len(), |(i, _)| i);
        let cut = rest
            .get(..hard)
            .and_then(|head| head.rfind('\n'))
            .filter(|&i| i > 0)
            .map_or(hard, |i| i + 1);
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest);
    }
    chunks
}
