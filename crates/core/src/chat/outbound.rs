//! Outbound message pipeline.

use crate::chat::store::LocalCache;
use crate::chat::timeline::TimelineHandle;
use crate::chat::types::{Message, MessageRecord};
use crate::sync::RemoteMessageStore;
use std::sync::Arc;

/// Sends locally originated messages.
///
/// A send prepends optimistically, fires a remote write without waiting for
/// it, then persists the whole timeline. Nothing is rolled back or retried:
/// a rejected write is logged and the message stays visible.
#[derive(Clone)]
pub struct OutboundPipeline {
    timeline: TimelineHandle,
    remote: Arc<dyn RemoteMessageStore>,
    cache: LocalCache,
}

impl OutboundPipeline {
    pub fn new(
        timeline: TimelineHandle,
        remote: Arc<dyn RemoteMessageStore>,
        cache: LocalCache,
    ) -> Self {
        Self {
            timeline,
            remote,
            cache,
        }
    }

    /// Send an already stamped message.
    ///
    /// When this returns, `message` is at index 0 of the timeline and the
    /// snapshot save has been attempted. The remote write may still be in
    /// flight.
    pub async fn send(&self, message: Message) {
        let record = MessageRecord::from(&message);
        let message_id = message.id.clone();

        self.timeline.prepend(message);

        let remote = self.remote.clone();
        tokio::spawn(async move {
            match remote.add(record).await {
                Ok(()) => tracing::debug!("Remote write for {} accepted", message_id),
                Err(e) => tracing::warn!("Remote write for {} failed: {}", message_id, e),
            }
        });

        self.cache.save(&self.timeline.snapshot()).await;
    }

    pub fn timeline(&self) -> &TimelineHandle {
        &self.timeline
    }
}
