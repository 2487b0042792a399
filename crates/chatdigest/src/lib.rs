//! Rolling group-chat history with on-demand LLM summaries.
//!
//! `chatdigest` listens to a group conversation, keeps a per-chat message
//! history, and when someone sends the trigger phrase replies with a terse,
//! per-author bullet summary produced by a chat completions model.
//!
//! The pieces, leaf first:
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`store`] | [`MessageStore`](store::MessageStore): append-only per-chat log, optional bounded retention |
//! | [`checkpoint`] | [`CheckpointTracker`](checkpoint::CheckpointTracker): "last recent-mode request" per chat |
//! | [`window`] | [`select`](window::select): which messages go into a summary |
//! | [`summarizer`] | [`Summarizer`](summarizer::Summarizer) and the [`TextGenerator`](summarizer::TextGenerator) seam, with fallback on failure |
//! | [`trigger`] | [`TriggerGrammar`](trigger::TriggerGrammar): start / summary / store classification |
//! | [`router`] | [`Router`](router::Router): the per-event state machine |
//! | [`dispatch`] | [`Dispatcher`](dispatch::Dispatcher): per-chat ordering and the [`Transport`](dispatch::Transport) seam |
//! | [`api`] | OpenAI-compatible client, retry policy, [`ChatBackend`](api::ChatBackend) |
//! | [`config`] | [`DigestConfig`](config::DigestConfig), TOML loading and defaults |
//!
//! # Getting started
//!
//! ```ignore
//! use std::sync::Arc;
//! use chatdigest::prelude::*;
//!
//! let config = DigestConfig::load("chatdigest.toml")?;
//! let backend = ChatBackend::from_config(&api_key, &config.backend)?;
//! let router = Arc::new(Router::from_config(&config, Arc::new(backend))?);
//! let dispatcher = Dispatcher::new(router, Arc::new(my_transport));
//!
//! // For every text message the transport receives:
//! dispatcher.submit(IncomingMessage {
//!     chat_id: ChatId(-100123),
//!     author: "alice".into(),
//!     text: "short".into(),
//!     timestamp: chrono::Utc::now(),
//! });
//! ```
//!
//! State is in memory only and lives as long as the process.

pub mod api;
pub mod checkpoint;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod prelude;
pub mod router;
pub mod store;
pub mod summarizer;
pub mod trigger;
pub mod window;

pub use error::{BackendError, ConfigError, TransportError};
