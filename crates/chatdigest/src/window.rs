//! Selection of the messages that go into one summary.

use chrono::{DateTime, Utc};

use crate::store::StoredMessage;

/// Which part of the history a summary request covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryMode {
    /// Messages strictly newer than the chat's checkpoint.
    Recent,
    /// The whole retained history. Ignores and never moves the checkpoint.
    AllTime,
}

/// Ordered subset of `history` to summarize.
///
/// Pure: the caller owns checkpoint advancement. An empty result means
/// there is nothing to summarize.
pub fn select(
    history: &[StoredMessage],
    mode: SummaryMode,
    checkpoint: DateTime<Utc>,
) -> Vec<StoredMessage> {
    match mode {
        SummaryMode::AllTime => history.to_vec(),
        SummaryMode::Recent => history
            .iter()
            .filter(|m| m.timestamp > checkpoint)
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(secs)
    }

    fn msg(author: &str, at: i64) -> StoredMessage {
        StoredMessage {
            author: author.into(),
            text: format!("{author} says hi"),
            timestamp: t(at),
        }
    }

    fn authors(window: &[StoredMessage]) -> Vec<&str> {
        window.iter().map(|m| m.author.as_str()).collect()
    }

    #[test]
    fn recent_is_strictly_after_checkpoint() {
        let history = vec![msg("a", 1), msg("b", 2), msg("c", 3)];
        let window = select(&history, SummaryMode::Recent, t(2));
        assert_eq!(authors(&window), ["c"]);
    }

    #[test]
    fn recent_preserves_order() {
        let history = vec![msg("a", 1), msg("b", 5), msg("c", 5), msg("d", 9)];
        let window = select(&history, SummaryMode::Recent, t(1));
        assert_eq!(authors(&window), ["b", "c", "d"]);
    }

    #[test]
    fn recent_with_nothing_newer_is_empty() {
        let history = vec![msg("a", 1), msg("b", 2)];
        assert!(select(&history, SummaryMode::Recent, t(2)).is_empty());
    }

    #[test]
    fn alltime_ignores_checkpoint() {
        let history = vec![msg("a", 1), msg("b", 2), msg("c", 3)];
        let window = select(&history, SummaryMode::AllTime, t(100));
        assert_eq!(window, history);
    }

    #[test]
    fn alltime_is_idempotent() {
        let history = vec![msg("a", 1), msg("b", 2)];
        let first = select(&history, SummaryMode::AllTime, t(0));
        let second = select(&history, SummaryMode::AllTime, t(0));
        assert_eq!(first, second);
    }

    #[test]
    fn empty_history_yields_empty_window() {
        assert!(select(&[], SummaryMode::AllTime, t(0)).is_empty());
        assert!(select(&[], SummaryMode::Recent, t(0)).is_empty());
    }
}
