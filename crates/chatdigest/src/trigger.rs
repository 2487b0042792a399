//! Classification of incoming text into a closed set of event kinds.
//!
//! Every message is classified exactly once, in a fixed order: start
//! command, other bot commands, summary trigger, ordinary text.
//!
//! A bot command is a first word shaped like Telegram's `/name` or
//! `/name@botname`. Text that merely starts with a slash (`/ lol`, `/???`)
//! is ordinary text.

use regex::Regex;
use serde::Deserialize;

use crate::config::TriggerConfig;
use crate::error::ConfigError;
use crate::window::SummaryMode;

/// How much of a message the trigger must cover.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// The trimmed message is exactly `trigger` or `trigger <synonym>`.
    #[default]
    WholeMessage,
    /// The message starts with the trigger word. AllTime if a synonym
    /// appears anywhere after it.
    Prefix,
}

/// What to do with one incoming message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Start command: reply with the greeting.
    Start,
    /// Summary trigger.
    Summary(SummaryMode),
    /// Ordinary chat text: store it.
    Store,
    /// Some other bot command or blank text: drop it.
    Ignore,
}

/// Compiled trigger grammar.
#[derive(Debug, Clone)]
pub struct TriggerGrammar {
    start_command: String,
    command: Regex,
    trigger: Regex,
    alltime: Option<Regex>,
    policy: MatchPolicy,
}

impl TriggerGrammar {
    pub fn new(config: &TriggerConfig) -> Result<Self, ConfigError> {
        let word = config.word.trim();
        if word.is_empty() {
            return Err(ConfigError::Invalid("trigger word must not be empty".into()));
        }
        let word = regex::escape(word);

        let synonyms: Vec<String> = config
            .alltime_synonyms
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(regex::escape)
            .collect();
        let synonym_group = (!synonyms.is_empty()).then(|| synonyms.join("|"));

        let trigger = match (config.match_policy, &synonym_group) {
            (MatchPolicy::WholeMessage, Some(group)) => {
                format!(r"(?i)^\s*{word}(?:\s+(?P<alltime>{group}))?\s*$")
            }
            (MatchPolicy::WholeMessage, None) => format!(r"(?i)^\s*{word}\s*$"),
            (MatchPolicy::Prefix, _) => format!(r"(?i)^\s*{word}(?:\W|$)"),
        };
        let alltime = synonym_group
            .map(|group| Regex::new(&format!(r"(?i)\b(?:{group})\b")))
            .transpose()
            .map_err(|e| ConfigError::Invalid(format!("bad alltime synonym: {e}")))?;

        Ok(Self {
            start_command: config.start_command.trim().to_string(),
            command: Regex::new(r"^/[A-Za-z0-9_]+(?:@\w+)?$")
                .map_err(|e| ConfigError::Invalid(format!("bad command pattern: {e}")))?,
            trigger: Regex::new(&trigger)
                .map_err(|e| ConfigError::Invalid(format!("bad trigger word: {e}")))?,
            alltime,
            policy: config.match_policy,
        })
    }

    /// Classify one message.
    pub fn classify(&self, text: &str) -> EventKind {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return EventKind::Ignore;
        }

        let first_word = trimmed.split_whitespace().next().unwrap_or(trimmed);
        if self.command.is_match(first_word) {
            // `/start@botname` is how group chats address a specific bot.
            let name = first_word.split('@').next().unwrap_or(first_word);
            return if name == self.start_command {
                EventKind::Start
            } else {
                EventKind::Ignore
            };
        }

        match self.summary_mode(trimmed) {
            Some(mode) => EventKind::Summary(mode),
            None => EventKind::Store,
        }
    }

    fn summary_mode(&self, text: &str) -> Option<SummaryMode> {
        let caps = self.trigger.captures(text)?;
        let alltime = match self.policy {
            MatchPolicy::WholeMessage => caps.name("alltime").is_some(),
            MatchPolicy::Prefix => {
                let rest = text.get(caps.get(0).map_or(0, |m| m.end())..).unwrap_or("");
                self.alltime.as_ref().is_some_and(|re| re.is_match(rest))
            }
        };
        Some(if alltime {
            SummaryMode::AllTime
        } else {
            SummaryMode::Recent
        })
    }
}
