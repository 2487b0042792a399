//! Per-chat message log.
//!
//! [`MessageStore`] keeps an append-only, chronologically ordered history for
//! every chat it has seen. Histories are created lazily on the first stored
//! message and live as long as the store. Reads clone the history out so no
//! map guard is ever held across an `.await`.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, trace};

/// Opaque chat identifier. Key for all per-chat state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One retained chat message. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredMessage {
    /// Display name of the sender (not unique).
    pub author: String,
    /// Message body, never empty.
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    /// Transcript line: `"{author}: {text}"`.
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.author, self.text)
    }
}

/// How many messages a chat keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Retention {
    /// Keep everything for the life of the process.
    #[default]
    Unbounded,
    /// Keep at most this many messages, dropping the oldest first.
    Bounded(usize),
}

/// Append-only per-chat message log.
pub struct MessageStore {
    chats: DashMap<ChatId, VecDeque<StoredMessage>>,
    retention: Retention,
    /// Lowercased bare trigger word; never stored.
    bare_trigger: String,
}

impl MessageStore {
    pub fn new(retention: Retention, bare_trigger: &str) -> Self {
        Self {
            chats: DashMap::new(),
            retention,
            bare_trigger: bare_trigger.trim().to_lowercase(),
        }
    }

    /// Append a message to `chat`'s history.
    ///
    /// Returns `false` without touching the history when `text` is blank or
    /// equals the bare trigger word (case-insensitive, surrounding whitespace
    /// ignored). A timestamp older than the chat's newest message is clamped
    /// up to it so the history stays non-decreasing.
    pub fn append(
        &self,
        chat: ChatId,
        author: impl Into<String>,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> bool {
        let text = text.into();
        if text.trim().is_empty() {
            debug!(chat = %chat, "Skipping blank message");
            return false;
        }
        if text.trim().to_lowercase() == self.bare_trigger {
            debug!(chat = %chat, "Skipping bare trigger word");
            return false;
        }

        let author = author.into();
        let mut history = self.chats.entry(chat).or_default();
        let timestamp = match history.back() {
            Some(last) if last.timestamp > timestamp => {
                debug!(
                    chat = %chat,
                    "Clamping out-of-order timestamp {timestamp} to {}",
                    last.timestamp
                );
                last.timestamp
            }
            _ => timestamp,
        };

        trace!(chat = %chat, author = %author, "Stored: {text}");
        history.push_back(StoredMessage {
            author,
            text,
            timestamp,
        });

        if let Retention::Bounded(max) = self.retention {
            while history.len() > max {
                history.pop_front();
            }
        }
        debug!(chat = %chat, len = history.len(), "Message stored");
        true
    }

    /// Snapshot of `chat`'s retained history, oldest first. Empty if unseen.
    pub fn history(&self, chat: ChatId) -> Vec<StoredMessage> {
        self.chats
            .get(&chat)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of retained messages for `chat`.
    pub fn len(&self, chat: ChatId) -> usize {
        self.chats.get(&chat).map_or(0, |h| h.len())
    }

    pub fn is_empty(&self, chat: ChatId) -> bool {
        self.len(chat) == 0
    }

    /// Number of chats with at least one stored message.
    pub fn chat_count(&self) -> usize {
        self.chats.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    const CHAT: ChatId = ChatId(42);

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(secs)
    }

    #[test]
    fn append_adds_message_last() {
        let store = MessageStore::new(Retention::Unbounded, "short");
        assert!(store.append(CHAT, "alice", "hi", t(1)));
        assert!(store.append(CHAT, "bob", "hello", t(2)));

        let history = store.history(CHAT);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].author, "bob");
        assert_eq!(history[1].text, "hello");
        assert_eq!(history[1].timestamp, t(2));
    }

    #[test]
    fn bare_trigger_is_never_stored() {
        let store = MessageStore::new(Retention::Unbounded, "short");
        assert!(!store.append(CHAT, "alice", "short", t(1)));
        assert!(!store.append(CHAT, "alice", "SHORT", t(2)));
        assert!(!store.append(CHAT, "alice", "  Short \n", t(3)));
        assert!(store.history(CHAT).is_empty());
        assert_eq!(store.chat_count(), 0);
    }

    #[test]
    fn trigger_inside_sentence_is_stored() {
        let store = MessageStore::new(Retention::Unbounded, "short");
        assert!(store.append(CHAT, "alice", "keep it short please", t(1)));
        assert_eq!(store.len(CHAT), 1);
    }

    #[test]
    fn non_latin_trigger_matches_case_insensitively() {
        let store = MessageStore::new(Retention::Unbounded, "Короче");
        assert!(!store.append(CHAT, "alice", "КОРОЧЕ", t(1)));
        assert!(store.is_empty(CHAT));
    }

    #[test]
    fn blank_text_is_rejected() {
        let store = MessageStore::new(Retention::Unbounded, "short");
        assert!(!store.append(CHAT, "alice", "   ", t(1)));
        assert!(store.is_empty(CHAT));
    }

    #[test]
    fn unseen_chat_has_empty_history() {
        let store = MessageStore::new(Retention::Unbounded, "short");
        store.append(CHAT, "alice", "hi", t(1));
        assert!(store.history(ChatId(7)).is_empty());
    }

    #[test]
    fn chats_are_isolated() {
        let store = MessageStore::new(Retention::Unbounded, "short");
        store.append(ChatId(1), "alice", "one", t(1));
        store.append(ChatId(2), "bob", "two", t(2));
        assert_eq!(store.history(ChatId(1))[0].text, "one");
        assert_eq!(store.history(ChatId(2))[0].text, "two");
        assert_eq!(store.chat_count(), 2);
    }

    #[test]
    fn out_of_order_timestamp_is_clamped() {
        let store = MessageStore::new(Retention::Unbounded, "short");
        store.append(CHAT, "alice", "first", t(10));
        store.append(CHAT, "bob", "second", t(5));
        let history = store.history(CHAT);
        assert_eq!(history[1].timestamp, t(10));
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn bounded_retention_drops_oldest() {
        let store = MessageStore::new(Retention::Bounded(2), "short");
        store.append(CHAT, "a", "1", t(1));
        store.append(CHAT, "b", "2", t(2));
        store.append(CHAT, "c", "3", t(3));
        let texts: Vec<_> = store.history(CHAT).into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["2", "3"]);
    }

    #[test]
    fn transcript_line_format() {
        let msg = StoredMessage {
            author: "alice".into(),
            text: "hi there".into(),
            timestamp: t(0),
        };
        assert_eq!(msg.transcript_line(), "alice: hi there");
    }
}
