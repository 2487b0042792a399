//! Per-event routing: greet, store, or summarize.
//!
//! [`Router::handle`] classifies an [`IncomingMessage`] once and runs the
//! matching branch. Summary requests always produce exactly one reply:
//! the summary, an empty-window notice, or the summarizer's fallback.
//!
//! The router itself does not serialize events. Run it behind the
//! [`Dispatcher`](crate::dispatch::Dispatcher), which processes each chat's
//! events one at a time and in arrival order.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info};

use crate::checkpoint::CheckpointTracker;
use crate::config::{DigestConfig, ReplyConfig};
use crate::error::ConfigError;
use crate::store::{ChatId, MessageStore};
use crate::summarizer::{Summarizer, TextGenerator};
use crate::trigger::{EventKind, TriggerGrammar};
use crate::window::{self, SummaryMode};

/// A text message delivered by the chat transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of routing one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Routed {
    /// Greeting sent for the start command.
    Greeted(String),
    /// Ordinary text; `true` if it was appended.
    Stored(bool),
    /// Command or blank text that needs no action.
    Ignored,
    /// Summary request, with the reply to send.
    Summary {
        mode: SummaryMode,
        window_len: usize,
        reply: String,
    },
}

impl Routed {
    /// Text to send back to the chat, if any.
    pub fn reply(&self) -> Option<&str> {
        match self {
            Routed::Greeted(reply) | Routed::Summary { reply, .. } => Some(reply),
            Routed::Stored(_) | Routed::Ignored => None,
        }
    }
}

/// Routes incoming messages to the store or the summarizer.
pub struct Router {
    grammar: TriggerGrammar,
    store: Arc<MessageStore>,
    checkpoints: Arc<CheckpointTracker>,
    summarizer: Summarizer,
    replies: ReplyConfig,
    lookback: Duration,
}

impl Router {
    /// Assemble a router from explicit parts.
    pub fn new(
        grammar: TriggerGrammar,
        store: Arc<MessageStore>,
        checkpoints: Arc<CheckpointTracker>,
        summarizer: Summarizer,
        replies: ReplyConfig,
        lookback: Duration,
    ) -> Self {
        Self {
            grammar,
            store,
            checkpoints,
            summarizer,
            replies,
            lookback,
        }
    }

    /// Build a router with fresh in-memory state from configuration.
    pub fn from_config(
        config: &DigestConfig,
        backend: Arc<dyn TextGenerator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            TriggerGrammar::new(&config.trigger)?,
            Arc::new(MessageStore::new(
                config.store.retention(),
                &config.trigger.word,
            )),
            Arc::new(CheckpointTracker::new()),
            Summarizer::new(backend, &config.summarizer),
            config.replies.clone(),
            config.summarizer.lookback(),
        ))
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    pub fn checkpoints(&self) -> &Arc<CheckpointTracker> {
        &self.checkpoints
    }

    /// Handle one message. `message.timestamp` is "now" for the event.
    pub async fn handle(&self, message: &IncomingMessage) -> Routed {
        let kind = self.grammar.classify(&message.text);
        debug!(chat = %message.chat_id, ?kind, "Classified message");

        match kind {
            EventKind::Start => Routed::Greeted(self.replies.greeting.clone()),
            EventKind::Ignore => Routed::Ignored,
            EventKind::Store => Routed::Stored(self.store.append(
                message.chat_id,
                message.author.as_str(),
                message.text.as_str(),
                self.store_time(message.chat_id, message.timestamp),
            )),
            EventKind::Summary(mode) => {
                self.summarize(message.chat_id, mode, message.timestamp).await
            }
        }
    }

    /// Timestamp to store a message under.
    ///
    /// Recent windows only take messages strictly newer than the checkpoint,
    /// so a message stamped at or before it, such as one from the trigger's
    /// own poll batch, is moved just past it.
    fn store_time(&self, chat: ChatId, at: DateTime<Utc>) -> DateTime<Utc> {
        match self.checkpoints.peek(chat) {
            Some(checkpoint) if at <= checkpoint => {
                let bumped = checkpoint
                    .checked_add_signed(TimeDelta::nanoseconds(1))
                    .unwrap_or(checkpoint);
                debug!(chat = %chat, "Restamping {at} to {bumped}, past checkpoint");
                bumped
            }
            _ => at,
        }
    }

    async fn summarize(&self, chat: ChatId, mode: SummaryMode, now: DateTime<Utc>) -> Routed {
        let history = self.store.history(chat);
        if history.is_empty() {
            debug!(chat = %chat, "Summary requested with empty history");
            return Routed::Summary {
                mode,
                window_len: 0,
                reply: self.replies.nothing_yet.clone(),
            };
        }

        let checkpoint = self.checkpoints.get(chat, self.lookback, now);
        let window = window::select(&history, mode, checkpoint);
        if window.is_empty() {
            debug!(chat = %chat, ?mode, "Nothing newer than checkpoint {checkpoint}");
            return Routed::Summary {
                mode,
                window_len: 0,
                reply: self.replies.nothing_new.clone(),
            };
        }

        // Advance before the backend call so messages that arrive while it
        // is in flight land in the next window. Never behind the newest
        // summarized message, or it would be summarized twice.
        if mode == SummaryMode::Recent {
            let newest = window.last().map_or(now, |m| m.timestamp);
            self.checkpoints.set(chat, now.max(newest));
        }

        info!(
            chat = %chat,
            ?mode,
            window = window.len(),
            history = history.len(),
            "Summarizing"
        );
        let summary = self.summarizer.summarize(&window).await;
        Routed::Summary {
            mode,
            window_len: window.len(),
            reply: self.replies.summary_reply(mode, &summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReplyConfig, TriggerConfig};
    use crate::error::BackendError;
    use crate::summarizer::{GenerateFuture, GenerationRequest};
    use chrono::TimeDelta;
    use std::sync::Mutex;

    const CHAT: ChatId = ChatId(7);

    /// Echoes the transcript back, or fails when `fail` is set.
    #[derive(Default)]
    struct EchoBackend {
        fail: bool,
        transcripts: Mutex<Vec<String>>,
    }

    impl TextGenerator for EchoBackend {
        fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerateFuture<'a> {
            self.transcripts
                .lock()
                .unwrap()
                .push(request.transcript.clone());
            Box::pin(async move {
                if self.fail {
                    Err(BackendError::Request("connection refused".into()))
                } else {
                    Ok(request.transcript.clone())
                }
            })
        }
    }

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::days(365) + TimeDelta::seconds(secs)
    }

    fn config() -> DigestConfig {
        DigestConfig {
            trigger: TriggerConfig {
                word: "short".into(),
                alltime_synonyms: vec!["alltime".into()],
                ..TriggerConfig::default()
            },
            replies: ReplyConfig {
                greeting: "hello".into(),
                nothing_yet: "nothing to summarize yet".into(),
                nothing_new: "nothing new to summarize".into(),
                icon: "*".into(),
                title: "summary".into(),
                recent_label: "recent".into(),
                alltime_label: "all time".into(),
            },
            ..DigestConfig::default()
        }
    }

    fn router_with(backend: Arc<EchoBackend>) -> Router {
        Router::from_config(&config(), backend).unwrap()
    }

    fn msg(author: &str, text: &str, at: i64) -> IncomingMessage {
        IncomingMessage {
            chat_id: CHAT,
            author: author.into(),
            text: text.into(),
            timestamp: t(at),
        }
    }

    async fn seed(router: &Router) {
        for (author, text, at) in [("A", "one", 1), ("B", "two", 2), ("C", "three", 3)] {
            assert_eq!(router.handle(&msg(author, text, at)).await, Routed::Stored(true));
        }
    }

    #[tokio::test]
    async fn start_command_greets() {
        let router = router_with(Arc::default());
        let routed = router.handle(&msg("A", "/start", 1)).await;
        assert_eq!(routed.reply(), Some("hello"));
        assert!(router.store().is_empty(CHAT));
    }

    #[tokio::test]
    async fn other_commands_not_stored() {
        let router = router_with(Arc::default());
        assert_eq!(router.handle(&msg("A", "/help", 1)).await, Routed::Ignored);
        assert!(router.store().is_empty(CHAT));
    }

    #[tokio::test]
    async fn empty_history_replies_nothing_yet() {
        let backend = Arc::new(EchoBackend::default());
        let router = router_with(backend.clone());
        let routed = router.handle(&msg("A", "short", 1)).await;
        assert_eq!(routed.reply(), Some("nothing to summarize yet"));
        assert!(router.checkpoints().peek(CHAT).is_none());
        assert!(backend.transcripts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn recent_summary_then_nothing_new() {
        let backend = Arc::new(EchoBackend::default());
        let router = router_with(backend.clone());
        seed(&router).await;

        let routed = router.handle(&msg("A", "short", 4)).await;
        let Routed::Summary {
            mode,
            window_len,
            reply,
        } = routed.clone()
        else {
            panic!("expected summary, got {routed:?}");
        };
        assert_eq!(mode, SummaryMode::Recent);
        assert_eq!(window_len, 3);
        assert_eq!(reply, "* summary (recent):\nA: one\nB: two\nC: three");
        assert_eq!(router.checkpoints().peek(CHAT), Some(t(4)));
        // The trigger itself is never stored.
        assert_eq!(router.store().len(CHAT), 3);

        let again = router.handle(&msg("B", "short", 5)).await;
        assert_eq!(again.reply(), Some("nothing new to summarize"));
        assert_eq!(router.checkpoints().peek(CHAT), Some(t(4)));
        assert_eq!(backend.transcripts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn next_recent_window_starts_after_checkpoint() {
        let router = router_with(Arc::default());
        seed(&router).await;
        router.handle(&msg("A", "short", 4)).await;
        router.handle(&msg("D", "four", 5)).await;
        router.handle(&msg("E", "five", 6)).await;

        let routed = router.handle(&msg("A", "short", 7)).await;
        assert_eq!(
            routed.reply(),
            Some("* summary (recent):\nD: four\nE: five")
        );
        assert_eq!(router.checkpoints().peek(CHAT), Some(t(7)));
    }

    #[tokio::test]
    async fn alltime_ignores_and_keeps_checkpoint() {
        let router = router_with(Arc::default());
        seed(&router).await;
        router.handle(&msg("A", "short", 4)).await;

        let routed = router.handle(&msg("A", "short alltime", 5)).await;
        assert_eq!(
            routed,
            Routed::Summary {
                mode: SummaryMode::AllTime,
                window_len: 3,
                reply: "* summary (all time):\nA: one\nB: two\nC: three".into(),
            }
        );
        assert_eq!(router.checkpoints().peek(CHAT), Some(t(4)));
        assert_eq!(router.store().len(CHAT), 3);
    }

    #[tokio::test]
    async fn alltime_without_checkpoint_does_not_create_one() {
        let router = router_with(Arc::default());
        seed(&router).await;
        router.handle(&msg("A", "SHORT ALLTIME", 4)).await;
        assert!(router.checkpoints().peek(CHAT).is_none());
    }

    #[tokio::test]
    async fn messages_older_than_lookback_excluded() {
        let router = router_with(Arc::default());
        router.handle(&msg("Old", "ancient", 0)).await;
        router.handle(&msg("New", "fresh", 2 * 24 * 3600)).await;

        let routed = router.handle(&msg("A", "short", 2 * 24 * 3600 + 10)).await;
        assert_eq!(routed.reply(), Some("* summary (recent):\nNew: fresh"));
    }

    #[tokio::test]
    async fn backend_failure_still_replies_and_advances() {
        let backend = Arc::new(EchoBackend {
            fail: true,
            ..EchoBackend::default()
        });
        let router = router_with(backend);
        seed(&router).await;

        let routed = router.handle(&msg("A", "short", 4)).await;
        let fallback = DigestConfig::default().summarizer.fallback_text;
        assert_eq!(
            routed.reply().map(str::to_string),
            Some(format!("* summary (recent):\n{fallback}"))
        );
        assert_eq!(router.checkpoints().peek(CHAT), Some(t(4)));
    }

    #[tokio::test]
    async fn message_at_checkpoint_instant_reaches_next_window() {
        let router = router_with(Arc::default());
        router.handle(&msg("A", "one", 1)).await;
        router.handle(&msg("A", "short", 1)).await;
        assert_eq!(router.handle(&msg("B", "late", 1)).await, Routed::Stored(true));

        let routed = router.handle(&msg("C", "short", 2)).await;
        assert_eq!(routed.reply(), Some("* summary (recent):\nB: late"));
    }

    #[tokio::test]
    async fn same_instant_triggers_never_repeat_or_skip() {
        let router = router_with(Arc::default());
        router.handle(&msg("A", "one", 1)).await;
        router.handle(&msg("A", "short", 1)).await;
        router.handle(&msg("B", "two", 1)).await;

        let second = router.handle(&msg("A", "short", 1)).await;
        assert_eq!(second.reply(), Some("* summary (recent):\nB: two"));

        router.handle(&msg("C", "three", 1)).await;
        let third = router.handle(&msg("A", "short", 1)).await;
        assert_eq!(third.reply(), Some("* summary (recent):\nC: three"));

        let history = router.store().history(CHAT);
        let checkpoint = router.checkpoints().peek(CHAT).unwrap();
        assert!(history.iter().all(|m| m.timestamp <= checkpoint));
    }

    #[tokio::test]
    async fn message_stamped_before_checkpoint_is_not_lost() {
        let router = router_with(Arc::default());
        seed(&router).await;
        router.handle(&msg("A", "short", 10)).await;
        // Clock skew: stamped earlier than the request that summarized.
        router.handle(&msg("D", "skewed", 5)).await;

        let routed = router.handle(&msg("A", "short", 11)).await;
        assert_eq!(routed.reply(), Some("* summary (recent):\nD: skewed"));
    }
}
