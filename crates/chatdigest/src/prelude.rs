//! Convenience re-exports for wiring up a digest service.
//!
//! ```ignore
//! use chatdigest::prelude::*;
//! ```
//!
//! Covers configuration, the router and dispatcher, both collaborator seams,
//! and the default chat completions backend. Lower-level pieces (window
//! selection, retry tuning, raw client types) stay in their modules.

// ── Configuration ───────────────────────────────────────────────────
pub use crate::config::DigestConfig;
pub use crate::trigger::MatchPolicy;

// ── Event flow ──────────────────────────────────────────────────────
pub use crate::dispatch::{Dispatcher, ReplyFuture, Transport};
pub use crate::router::{IncomingMessage, Routed, Router};
pub use crate::store::ChatId;
pub use crate::window::SummaryMode;

// ── Backend ─────────────────────────────────────────────────────────
pub use crate::api::ChatBackend;
pub use crate::summarizer::{GenerateFuture, GenerationRequest, TextGenerator};

// ── Errors ──────────────────────────────────────────────────────────
pub use crate::error::{BackendError, ConfigError, TransportError};
