//! Cart persistence adapter.
//!
//! Mirrors the cart's line items to a [`KeyValueStore`] under a single key so
//! the cart survives restarts.
//!
//! - [`CartPersistence::hydrate`] reads the stored value once at startup and
//!   replaces the cart with it. Missing, unreadable or corrupt data leaves the
//!   cart empty.
//! - [`CartPersistence::attach`] subscribes to the store. Every successful
//!   transition is serialized and handed to a background writer task, which
//!   coalesces bursts and writes only the newest snapshot.
//!
//! Storage failures are logged and swallowed; they never reach the cart.

mod storage;

pub use storage::{FileStore, KeyValueStore, MemoryStore};

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::error::PersistenceError;
use crate::item::LineItem;
use crate::store::CartStore;

/// Storage key holding the serialized cart.
pub const CART_STORAGE_KEY: &str = "paradise_nursery_cart";

/// Reads and writes the cart to durable storage.
#[derive(Debug)]
pub struct CartPersistence<S> {
    storage: Arc<S>,
}

impl<S> Clone for CartPersistence<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: KeyValueStore + 'static> CartPersistence<S> {
    /// Persist under [`CART_STORAGE_KEY`].
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// The backing store.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read the stored items without touching any cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if storage cannot be read or the stored
    /// value is not a JSON array of line items.
    pub fn load(&self) -> Result<Option<Vec<LineItem>>, PersistenceError> {
        let Some(raw) = self.storage.get(CART_STORAGE_KEY)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Replace the cart in `store` with the stored items.
    ///
    /// Returns `true` if a stored cart was restored. Anything else (no stored
    /// value, a read failure, corrupt JSON, items that break cart invariants)
    /// is logged and leaves `store` as it was.
    #[instrument(skip_all, fields(key = CART_STORAGE_KEY))]
    pub fn hydrate(&self, store: &mut CartStore) -> bool {
        let items = match self.load() {
            Ok(Some(items)) => items,
            Ok(None) => {
                debug!("No stored cart");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable stored cart");
                return false;
            }
        };

        match store.set_cart(items) {
            Ok(state) => {
                info!(items = state.items().len(), "Restored cart from storage");
                true
            }
            Err(e) => {
                store.clear_error();
                warn!(error = %PersistenceError::from(e), "Ignoring invalid stored cart");
                false
            }
        }
    }

    /// Mirror every successful change of `store` to storage.
    ///
    /// Spawns the writer task, so this must be called from within a Tokio
    /// runtime. The task runs until [`PersistenceHandle::shutdown`] or until
    /// both the handle and `store` are dropped.
    pub fn attach(&self, store: &mut CartStore) -> PersistenceHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_writer(self.clone(), rx));

        let sender = tx.clone();
        store.subscribe(move |state| match serde_json::to_string(state.items()) {
            Ok(raw) => {
                if sender.send(WriterMessage::Snapshot(raw)).is_err() {
                    debug!("Cart writer stopped; snapshot dropped");
                }
            }
            Err(e) => {
                warn!(error = %PersistenceError::from(e), "Failed to serialize cart");
            }
        });

        PersistenceHandle { tx, task }
    }
}

enum WriterMessage {
    Snapshot(String),
    Flush(oneshot::Sender<()>),
}

/// Control handle for the background writer.
#[derive(Debug)]
pub struct PersistenceHandle {
    tx: mpsc::UnboundedSender<WriterMessage>,
    task: JoinHandle<()>,
}

impl PersistenceHandle {
    /// Wait until every snapshot sent so far has been written (or has failed
    /// and been logged).
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(WriterMessage::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Flush pending writes and stop the writer.
    ///
    /// Snapshots sent afterwards by the store's subscriber are dropped.
    pub async fn shutdown(self) {
        self.flush().await;
        self.task.abort();
        let _ = self.task.await;
    }
}

impl std::fmt::Debug for WriterMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Snapshot(raw) => f.debug_tuple("Snapshot").field(&raw.len()).finish(),
            Self::Flush(_) => f.write_str("Flush"),
        }
    }
}

async fn run_writer<S: KeyValueStore + 'static>(
    persistence: CartPersistence<S>,
    mut rx: mpsc::UnboundedReceiver<WriterMessage>,
) {
    debug!(key = CART_STORAGE_KEY, "Cart writer started");

    while let Some(message) = rx.recv().await {
        let mut latest = None;
        let mut ack = None;
        match message {
            WriterMessage::Snapshot(raw) => latest = Some(raw),
            WriterMessage::Flush(tx) => ack = Some(tx),
        }

        // Only the newest queued snapshot matters. Stop at a flush so it is
        // acknowledged after everything sent before it.
        if ack.is_none() {
            while let Ok(message) = rx.try_recv() {
                match message {
                    WriterMessage::Snapshot(raw) => latest = Some(raw),
                    WriterMessage::Flush(tx) => {
                        ack = Some(tx);
                        break;
                    }
                }
            }
        }

        if let Some(raw) = latest {
            write_snapshot(&persistence, raw).await;
        }
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
    }

    debug!(key = CART_STORAGE_KEY, "Cart writer stopped");
}

async fn write_snapshot<S: KeyValueStore + 'static>(persistence: &CartPersistence<S>, raw: String) {
    let storage = Arc::clone(&persistence.storage);
    let bytes = raw.len();

    match tokio::task::spawn_blocking(move || storage.set(CART_STORAGE_KEY, &raw)).await {
        Ok(Ok(())) => debug!(key = CART_STORAGE_KEY, bytes, "Cart saved"),
        Ok(Err(e)) => {
            warn!(
                key = CART_STORAGE_KEY,
                error = %PersistenceError::from(e),
                "Failed to save cart"
            );
        }
        Err(e) => error!(key = CART_STORAGE_KEY, error = %e, "Cart write task failed"),
    }
}
