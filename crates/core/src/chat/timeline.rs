//! The in-memory timeline shared by the sync controller, the outbound
//! pipeline and whatever renders the screen.

use crate::chat::types::{Message, Timeline};
use tokio::sync::watch;

/// Shared, observable timeline.
///
/// Every write is either a full replace or a single prepend, so readers always
/// see a complete timeline. Cloning yields another handle to the same timeline.
#[derive(Debug, Clone)]
pub struct TimelineHandle {
    tx: watch::Sender<Timeline>,
}

impl Default for TimelineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineHandle {
    /// Create an empty timeline.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self { tx }
    }

    /// Discard the current contents and install `timeline`.
    pub fn replace(&self, timeline: Timeline) {
        self.tx.send_replace(timeline);
    }

    /// Insert a message at the head (newest position).
    pub fn prepend(&self, message: Message) {
        self.tx.send_modify(|timeline| timeline.insert(0, message));
    }

    /// Copy of the current timeline.
    pub fn snapshot(&self) -> Timeline {
        self.tx.borrow().clone()
    }

    /// Newest message, if any.
    pub fn latest(&self) -> Option<Message> {
        self.tx.borrow().first().cloned()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Receiver notified after every write.
    pub fn subscribe(&self) -> watch::Receiver<Timeline> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::{MessageDraft, Session};

    fn session() -> Session {
        Session {
            user_id: "u1".to_string(),
            display_name: "Ada".to_string(),
            avatar_url: String::new(),
        }
    }

    #[test]
    fn test_prepend_is_newest_first() {
        let timeline = TimelineHandle::new();
        let m1 = session().compose(MessageDraft::text("one"));
        let m2 = session().compose(MessageDraft::text("two"));

        timeline.prepend(m1.clone());
        timeline.prepend(m2.clone());

        assert_eq!(timeline.snapshot(), vec![m2.clone(), m1]);
        assert_eq!(timeline.latest(), Some(m2));
    }

    #[test]
    fn test_replace_discards_previous_contents() {
        let timeline = TimelineHandle::new();
        timeline.prepend(session().compose(MessageDraft::text("stale")));

        let fresh = vec![session().compose(MessageDraft::text("fresh"))];
        timeline.replace(fresh.clone());

        assert_eq!(timeline.snapshot(), fresh);
        assert_eq!(timeline.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_writes() {
        let timeline = TimelineHandle::new();
        let mut rx = timeline.subscribe();

        timeline.prepend(session().compose(MessageDraft::text("hi")));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}
