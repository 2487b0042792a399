//! Per-chat "last recent-mode summary request" timestamps.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::store::ChatId;

/// Default lookback when a chat has never been summarized.
pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(24 * 60 * 60);

/// Tracks the lower bound of the next recent-mode window for each chat.
#[derive(Default)]
pub struct CheckpointTracker {
    checkpoints: DashMap<ChatId, DateTime<Utc>>,
}

impl CheckpointTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored checkpoint, or `now - lookback` when absent.
    ///
    /// Never creates an entry.
    pub fn get(&self, chat: ChatId, lookback: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
        if let Some(at) = self.checkpoints.get(&chat) {
            return *at;
        }
        let delta = TimeDelta::from_std(lookback).unwrap_or(TimeDelta::MAX);
        now.checked_sub_signed(delta)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// The stored checkpoint, if any.
    pub fn peek(&self, chat: ChatId) -> Option<DateTime<Utc>> {
        self.checkpoints.get(&chat).map(|at| *at)
    }

    /// Overwrite the checkpoint unconditionally.
    pub fn set(&self, chat: ChatId, at: DateTime<Utc>) {
        debug!(chat = %chat, "Checkpoint advanced to {at}");
        self.checkpoints.insert(chat, at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(secs)
    }

    #[test]
    fn absent_checkpoint_defaults_to_lookback() {
        let tracker = CheckpointTracker::new();
        let now = t(100_000);
        let got = tracker.get(ChatId(1), DEFAULT_LOOKBACK, now);
        assert_eq!(got, now - TimeDelta::hours(24));
    }

    #[test]
    fn get_does_not_create_entry() {
        let tracker = CheckpointTracker::new();
        tracker.get(ChatId(1), DEFAULT_LOOKBACK, t(100_000));
        assert!(tracker.peek(ChatId(1)).is_none());
    }

    #[test]
    fn set_overwrites() {
        let tracker = CheckpointTracker::new();
        tracker.set(ChatId(1), t(10));
        tracker.set(ChatId(1), t(20));
        assert_eq!(tracker.get(ChatId(1), DEFAULT_LOOKBACK, t(1_000_000)), t(20));
        assert!(tracker.peek(ChatId(2)).is_none());
    }

    #[test]
    fn huge_lookback_saturates() {
        let tracker = CheckpointTracker::new();
        let got = tracker.get(ChatId(1), Duration::MAX, t(0));
        assert_eq!(got, DateTime::<Utc>::MIN_UTC);
    }
}
