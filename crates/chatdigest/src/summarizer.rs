//! Turning a window of chat messages into a short attributed summary.
//!
//! [`Summarizer`] owns the failure policy: any [`BackendError`], including a
//! blown deadline, becomes the configured fallback text. The error kind is
//! logged so failures stay distinguishable even though the user only ever
//! sees one message.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::config::SummarizerConfig;
use crate::error::BackendError;
use crate::store::StoredMessage;

/// Boxed future returned by [`TextGenerator::generate`].
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, BackendError>> + Send + 'a>>;

/// One generative-text call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub transcript: String,
    pub max_output_tokens: u32,
}

/// External text-generation capability.
///
/// Uses a boxed future so the trait stays dyn-compatible.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerateFuture<'a>;
}

/// Join messages as `"{author}: {text}"` lines, oldest first.
pub fn format_transcript(messages: &[StoredMessage]) -> String {
    messages
        .iter()
        .map(StoredMessage::transcript_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summarizes message windows through a [`TextGenerator`].
pub struct Summarizer {
    backend: Arc<dyn TextGenerator>,
    system_instruction: String,
    max_output_tokens: u32,
    timeout: Duration,
    fallback_text: String,
}

impl Summarizer {
    pub fn new(backend: Arc<dyn TextGenerator>, config: &SummarizerConfig) -> Self {
        Self {
            backend,
            system_instruction: config.system_instruction.clone(),
            max_output_tokens: config.max_output_tokens,
            timeout: config.timeout(),
            fallback_text: config.fallback_text.clone(),
        }
    }

    /// Override the overall deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fallback_text(&self) -> &str {
        &self.fallback_text
    }

    pub fn build_request(&self, messages: &[StoredMessage]) -> GenerationRequest {
        GenerationRequest {
            system_instruction: self.system_instruction.clone(),
            transcript: format_transcript(messages),
            max_output_tokens: self.max_output_tokens,
        }
    }

    /// Summary text for `messages`, or the fallback text on any failure.
    ///
    /// Callers short-circuit empty windows; an empty slice is answered with
    /// the fallback without calling the backend.
    pub async fn summarize(&self, messages: &[StoredMessage]) -> String {
        match self.try_summarize(messages).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(kind = e.kind(), "Summarization failed, using fallback: {e}");
                self.fallback_text.clone()
            }
        }
    }

    /// Like [`summarize`](Self::summarize) but surfaces the error.
    pub async fn try_summarize(&self, messages: &[StoredMessage]) -> Result<String, BackendError> {
        if messages.is_empty() {
            return Err(BackendError::Empty);
        }
        let request = self.build_request(messages);
        debug!(
            messages = messages.len(),
            transcript_chars = request.transcript.chars().count(),
            "Requesting summary"
        );

        let start = Instant::now();
        let generated = tokio::time::timeout(self.timeout, self.backend.generate(&request))
            .await
            .map_err(|_| BackendError::Timeout(self.timeout))??;

        let summary = generated.trim();
        if summary.is_empty() {
            return Err(BackendError::Empty);
        }
        debug!(
            "Summary ready in {:.1}s ({} chars)",
            start.elapsed().as_secs_f64(),
            summary.chars().count()
        );
        Ok(summary.to_string())
    }
}
