//! Telegram front end for `chatdigest`.
//!
//! Long-polls the Bot API, turns each text message into an
//! [`IncomingMessage`](chatdigest::router::IncomingMessage) stamped with its
//! receipt time, and sends the router's replies back through `sendMessage`.
//!
//! ```ignore
//! use std::sync::Arc;
//! use chatdigest::prelude::*;
//! use chatdigest_telegram::{TelegramClient, TelegramTransport, run_polling};
//!
//! let telegram = Arc::new(TelegramClient::new(&token, Duration::from_secs(30))?);
//! let dispatcher = Dispatcher::new(router, Arc::new(TelegramTransport::new(telegram.clone())));
//! run_polling(&telegram, &dispatcher, async { tokio::signal::ctrl_c().await.ok(); }).await;
//! dispatcher.shutdown().await;
//! ```

pub mod api;
pub mod transport;

pub use api::{TelegramClient, split_message};
pub use transport::{TelegramTransport, run_polling, to_incoming};
