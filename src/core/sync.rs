//! Debounced write queue for the remote cart document.
//!
//! A background task owns the pending snapshot. Every `schedule` replaces it
//! and pushes the deadline out by the debounce period; when the deadline
//! passes, only the latest snapshot is written. `flush` writes immediately and
//! reports the result, `shutdown` flushes before stopping and `abandon` stops
//! without writing.

use crate::core::documents::DocumentStore;
use crate::core::models::CartItem;
use crate::errors::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

/// Default quiet period before a scheduled cart write is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug)]
enum SyncCommand {
    Schedule(Vec<CartItem>),
    Flush(oneshot::Sender<Result<()>>),
}

#[derive(Debug)]
pub struct CartSyncQueue {
    sender: mpsc::UnboundedSender<SyncCommand>,
    writing: Arc<AtomicBool>,
    worker: JoinHandle<()>,
}

fn worker_gone() -> Error {
    Error::Sync {
        message: "cart sync worker has stopped".to_string(),
    }
}

impl CartSyncQueue {
    /// Starts the worker for `user_id`'s cart document.
    pub fn spawn<D>(documents: Arc<D>, user_id: String, debounce: Duration) -> Self
    where
        D: DocumentStore + ?Sized + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let writing = Arc::new(AtomicBool::new(false));
        let worker = tokio::spawn(run_worker(
            documents,
            user_id,
            debounce,
            receiver,
            Arc::clone(&writing),
        ));
        Self {
            sender,
            writing,
            worker,
        }
    }

    /// Replaces the pending snapshot and restarts the debounce timer.
    pub fn schedule(&self, items: Vec<CartItem>) -> Result<()> {
        self.sender
            .send(SyncCommand::Schedule(items))
            .map_err(|_| worker_gone())
    }

    /// Writes the pending snapshot now, if there is one.
    pub async fn flush(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(SyncCommand::Flush(reply))
            .map_err(|_| worker_gone())?;
        response.await.map_err(|_| worker_gone())?
    }

    /// True while a write is in flight.
    #[must_use]
    pub fn is_writing(&self) -> bool {
        self.writing.load(Ordering::SeqCst)
    }

    /// Flushes, then stops the worker.
    pub async fn shutdown(self) -> Result<()> {
        let result = self.flush().await;
        drop(self.sender);
        if let Err(e) = self.worker.await {
            warn!("Cart sync worker ended abnormally: {}", e);
        }
        result
    }

    /// Stops the worker immediately; a pending snapshot is discarded.
    pub fn abandon(self) {
        self.worker.abort();
    }
}

async fn write_snapshot<D>(
    documents: &D,
    user_id: &str,
    items: &[CartItem],
    writing: &AtomicBool,
) -> Result<()>
where
    D: DocumentStore + ?Sized,
{
    writing.store(true, Ordering::SeqCst);
    let result = documents.put_cart(user_id, items).await;
    writing.store(false, Ordering::SeqCst);
    if result.is_ok() {
        debug!("Synced {} cart lines for {}", items.len(), user_id);
    }
    result
}

async fn run_worker<D>(
    documents: Arc<D>,
    user_id: String,
    debounce: Duration,
    mut receiver: mpsc::UnboundedReceiver<SyncCommand>,
    writing: Arc<AtomicBool>,
) where
    D: DocumentStore + ?Sized,
{
    let mut pending: Option<Vec<CartItem>> = None;
    let mut deadline = Instant::now();

    loop {
        tokio::select! {
            command = receiver.recv() => match command {
                Some(SyncCommand::Schedule(items)) => {
                    pending = Some(items);
                    deadline = Instant::now() + debounce;
                }
                Some(SyncCommand::Flush(reply)) => {
                    let result = match pending.take() {
                        Some(items) => {
                            write_snapshot(documents.as_ref(), &user_id, &items, &writing).await
                        }
                        None => Ok(()),
                    };
                    // The caller may have stopped waiting
                    let _ = reply.send(result);
                }
                None => break,
            },
            () = sleep_until(deadline), if pending.is_some() => {
                if let Some(items) = pending.take() {
                    if let Err(e) =
                        write_snapshot(documents.as_ref(), &user_id, &items, &writing).await
                    {
                        warn!("Cart sync for {} failed: {}", user_id, e);
                    }
                }
            }
        }
    }

    if pending.is_some() {
        debug!("Dropping unsent cart snapshot for {}", user_id);
    }
}
