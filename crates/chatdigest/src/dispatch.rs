//! Per-chat serialization of incoming events.
//!
//! The [`Dispatcher`] owns one worker task per chat, fed by an unbounded
//! channel. A chat's events are routed strictly one after another in arrival
//! order, so an append can never interleave with a window selection and two
//! summary requests never race on the checkpoint. Different chats proceed
//! independently.
//!
//! Each event is routed inside its own spawned task and awaited by the
//! worker, so a panic while handling one event is logged and the worker moves
//! on to the next.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::TransportError;
use crate::router::{IncomingMessage, Router};
use crate::store::ChatId;

/// Boxed future returned by [`Transport::reply`].
pub type ReplyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TransportError>> + Send + 'a>>;

/// Outgoing side of the chat transport.
pub trait Transport: Send + Sync {
    /// Deliver `text` to `chat`.
    fn reply<'a>(&'a self, chat: ChatId, text: &'a str) -> ReplyFuture<'a>;
}

struct Worker {
    tx: mpsc::UnboundedSender<IncomingMessage>,
    handle: JoinHandle<()>,
}

/// Fans incoming events out to per-chat workers.
pub struct Dispatcher {
    router: Arc<Router>,
    transport: Arc<dyn Transport>,
    workers: DashMap<ChatId, Worker>,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>, transport: Arc<dyn Transport>) -> Self {
        Self {
            router,
            transport,
            workers: DashMap::new(),
        }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Queue `message` behind earlier events of the same chat.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, message: IncomingMessage) {
        let chat = message.chat_id;
        let worker = self.workers.entry(chat).or_insert_with(|| {
            debug!(chat = %chat, "Spawning chat worker");
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = tokio::spawn(run_worker(
                chat,
                rx,
                self.router.clone(),
                self.transport.clone(),
            ));
            Worker { tx, handle }
        });
        if worker.tx.send(message).is_err() {
            error!(chat = %chat, "Chat worker is gone; dropping event");
        }
    }

    /// Number of chats with a live worker.
    pub fn active_chats(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting events and wait for every queued event to finish.
    pub async fn shutdown(self) {
        let workers: Vec<(ChatId, Worker)> = self.workers.into_iter().collect();
        let mut handles = Vec::with_capacity(workers.len());
        for (chat, Worker { tx, handle }) in workers {
            drop(tx);
            handles.push((chat, handle));
        }
        for (chat, handle) in handles {
            if let Err(e) = handle.await {
                error!(chat = %chat, "Chat worker ended abnormally: {e}");
            }
        }
    }
}

async fn run_worker(
    chat: ChatId,
    mut rx: mpsc::UnboundedReceiver<IncomingMessage>,
    router: Arc<Router>,
    transport: Arc<dyn Transport>,
) {
    while let Some(message) = rx.recv().await {
        let router = router.clone();
        let routed = tokio::spawn(async move { router.handle(&message).await }).await;

        let routed = match routed {
            Ok(routed) => routed,
            Err(e) => {
                error!(chat = %chat, "Event handling failed: {e}");
                continue;
            }
        };

        if let Some(text) = routed.reply() {
            if let Err(e) = transport.reply(chat, text).await {
                warn!(chat = %chat, "Reply delivery failed: {e}");
            }
        }
    }
    debug!(chat = %chat, "Chat worker stopped");
}
