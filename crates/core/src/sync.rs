//! Remote sync controller.
//!
//! Holds a live query on the remote message collection and republishes the
//! whole timeline on every snapshot. Snapshots are full result sets, never
//! diffs, so each delivery replaces the timeline outright.

use crate::chat::types::{Message, MessageRecord, Session, Timeline};
use crate::error::Result;
use crate::subscription::Subscription;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Stream of complete result sets, newest `createdAt` first.
pub type SnapshotStream = mpsc::UnboundedReceiver<Result<Vec<MessageRecord>>>;

/// Document-oriented message collection.
#[async_trait]
pub trait RemoteMessageStore: Send + Sync {
    /// Write one document.
    async fn add(&self, record: MessageRecord) -> Result<()>;

    /// Open a live query ordered by `createdAt` descending.
    ///
    /// Each item is the full result set at that moment. The current result
    /// set is delivered first. The query ends when the receiver is dropped.
    fn subscribe(&self) -> SnapshotStream;
}

/// Map a remote result set to a timeline, preserving order.
pub fn to_timeline(records: Vec<MessageRecord>) -> Timeline {
    records.into_iter().map(Message::from).collect()
}

/// Owns the live subscription to the remote collection.
#[derive(Clone)]
pub struct RemoteSync {
    store: Arc<dyn RemoteMessageStore>,
}

impl RemoteSync {
    pub fn new(store: Arc<dyn RemoteMessageStore>) -> Self {
        Self { store }
    }

    /// Attach the listener for `session`.
    ///
    /// `on_timeline` receives the complete re-derived timeline for every
    /// snapshot, in the order the store emits them. Listener errors are logged
    /// and the subscription stays attached. Nothing detaches automatically:
    /// the returned handle must be closed (or dropped) by the owner.
    ///
    /// No snapshot is handed to `on_timeline` once the handle is closed, but
    /// on a multi-thread runtime a call already in progress on another worker
    /// may still finish after `close` returns.
    pub fn attach<F>(&self, session: &Session, on_timeline: F) -> Subscription
    where
        F: Fn(Timeline) + Send + Sync + 'static,
    {
        let mut snapshots = self.store.subscribe();
        let detached = Arc::new(AtomicBool::new(false));
        let flag = detached.clone();
        let user_id = session.user_id.clone();

        tracing::info!("Attaching remote listener for {}", user_id);

        let task = tokio::spawn(async move {
            while let Some(snapshot) = snapshots.recv().await {
                match snapshot {
                    Ok(records) => {
                        tracing::debug!("Remote snapshot with {} messages", records.len());
                        let timeline = to_timeline(records);
                        if flag.load(Ordering::Acquire) {
                            break;
                        }
                        on_timeline(timeline);
                    }
                    Err(e) => tracing::warn!("Remote listener error for {}: {}", user_id, e),
                }
            }
            tracing::debug!("Remote snapshot stream ended");
        });

        let abort = task.abort_handle();
        Subscription::new("remote-sync", move || {
            detached.store(true, Ordering::Release);
            abort.abort();
        })
    }
}
