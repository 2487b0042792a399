//! Generative-text backend plumbing.
//!
//! - [`client`]: async client for OpenAI-compatible chat completion
//!   endpoints (OpenRouter by default).
//! - [`retry`]: exponential backoff for transient failures (429, 5xx,
//!   network errors, timeouts). Never retries 4xx.
//! - [`backend`]: [`ChatBackend`], the
//!   [`TextGenerator`](crate::summarizer::TextGenerator) the service runs on.

pub mod backend;
pub mod client;
pub mod retry;

pub use backend::ChatBackend;
pub use client::{OPENROUTER_BASE_URL, OpenRouterClient};
pub use retry::RetryConfig;
