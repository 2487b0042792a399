//! Service configuration with defaults matching the original group-chat bot.
//!
//! [`DigestConfig`] can be built in code (all sections implement `Default`,
//! plus `with_*` builders for the common overrides) or loaded from a TOML
//! file where every key is optional:
//!
//! ```toml
//! [trigger]
//! word = "short"
//! alltime_synonyms = ["alltime"]
//! match_policy = "prefix"
//!
//! [summarizer]
//! max_output_tokens = 1500
//! timeout_secs = 30
//!
//! [backend]
//! model = "openai/gpt-4o-mini"
//!
//! [store]
//! max_messages_per_chat = 5000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::api::retry::RetryConfig;
use crate::api::client::OPENROUTER_BASE_URL;
use crate::error::ConfigError;
use crate::store::Retention;
use crate::trigger::MatchPolicy;
use crate::window::SummaryMode;

/// Top-level configuration.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct DigestConfig {
    pub trigger: TriggerConfig,
    pub replies: ReplyConfig,
    pub summarizer: SummarizerConfig,
    pub backend: BackendConfig,
    pub store: StoreConfig,
}

/// Trigger grammar tokens. Locale-specific literals, never translated.
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct TriggerConfig {
    /// Word that requests a summary. Default: `"короче"`.
    pub word: String,
    /// Words that, following the trigger, select all-time mode.
    pub alltime_synonyms: Vec<String>,
    pub match_policy: MatchPolicy,
    /// Case-sensitive greeting command. Default: `"/start"`.
    pub start_command: String,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            word: "короче".into(),
            alltime_synonyms: vec!["оллтайм".into(), "alltime".into()],
            match_policy: MatchPolicy::WholeMessage,
            start_command: "/start".into(),
        }
    }
}

/// Fixed reply texts.
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct ReplyConfig {
    pub greeting: String,
    /// Sent when the chat has no stored messages at all.
    pub nothing_yet: String,
    /// Sent when the selected window is empty.
    pub nothing_new: String,
    pub icon: String,
    pub title: String,
    pub recent_label: String,
    pub alltime_label: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            greeting: "привет, я бот для резюмирования чата. напиши 'короче' и я суммирую \
                       последние сообщения."
                .into(),
            nothing_yet: "короче некуда — сообщений пока нет.".into(),
            nothing_new: "короче некуда — новых сообщений нет.".into(),
            icon: "🐳".into(),
            title: "саммари".into(),
            recent_label: "последних сообщений".into(),
            alltime_label: "всех сообщений".into(),
        }
    }
}

impl ReplyConfig {
    pub fn label(&self, mode: SummaryMode) -> &str {
        match mode {
            SummaryMode::Recent => &self.recent_label,
            SummaryMode::AllTime => &self.alltime_label,
        }
    }

    /// `"{icon} {title} ({label}):\n{summary}"`.
    pub fn summary_reply(&self, mode: SummaryMode, summary: &str) -> String {
        format!(
            "{} {} ({}):\n{}",
            self.icon,
            self.title,
            self.label(mode),
            summary
        )
    }
}

/// Summarization policy.
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct SummarizerConfig {
    pub system_instruction: String,
    /// Output-length cap passed to the backend. Default: `3000`.
    pub max_output_tokens: u32,
    /// Deadline for the whole backend call, retries included. Default: `60`.
    pub timeout_secs: u64,
    /// Reply body used when the backend fails.
    pub fallback_text: String,
    /// Recent-mode window when a chat has no checkpoint. Default: `24`.
    pub lookback_hours: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            system_instruction: "используй lowercase. суммируй этот разговор максимально кратко \
                                 и по пунктам, указывая автора по каждому пункту:"
                .into(),
            max_output_tokens: 3000,
            timeout_secs: 60,
            fallback_text: "сори чет не получилось".into(),
            lookback_hours: 24,
        }
    }
}

impl SummarizerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn lookback(&self) -> Duration {
        Duration::from_secs(self.lookback_hours.saturating_mul(60 * 60))
    }
}

/// Chat-completions backend settings. The API key is supplied separately.
#[derive(Deserialize, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: Option<f32>,
    /// Retries for transient failures. Default: `1`.
    pub max_retries: u32,
    /// Per-HTTP-request timeout. Default: `45`.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: OPENROUTER_BASE_URL.into(),
            model: "openai/gpt-4o-mini".into(),
            temperature: None,
            max_retries: 1,
            request_timeout_secs: 45,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::with_retries(self.max_retries)
    }
}

/// Message retention.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Keep at most this many messages per chat. Unbounded when absent.
    pub max_messages_per_chat: Option<usize>,
}

impl StoreConfig {
    pub fn retention(&self) -> Retention {
        match self.max_messages_per_chat {
            Some(max) => Retention::Bounded(max),
            None => Retention::Unbounded,
        }
    }
}

impl DigestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trigger.word.trim().is_empty() {
            return Err(ConfigError::Invalid("trigger.word must not be empty".into()));
        }
        if self.trigger.start_command.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "trigger.start_command must not be empty".into(),
            ));
        }
        if self.summarizer.max_output_tokens == 0 {
            return Err(ConfigError::Invalid(
                "summarizer.max_output_tokens must be positive".into(),
            ));
        }
        if self.summarizer.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "summarizer.timeout_secs must be positive".into(),
            ));
        }
        if self.backend.model.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.model must not be empty".into()));
        }
        if self.store.max_messages_per_chat == Some(0) {
            return Err(ConfigError::Invalid(
                "store.max_messages_per_chat must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Override the backend model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.backend.model = model.into();
        self
    }

    /// Override the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.backend.base_url = base_url.into();
        self
    }

    /// Override the trigger word.
    pub fn with_trigger_word(mut self, word: impl Into<String>) -> Self {
        self.trigger.word = word.into();
        self
    }

    /// Override the overall backend deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.summarizer.timeout_secs = timeout.as_secs().max(1);
        self
    }
}
