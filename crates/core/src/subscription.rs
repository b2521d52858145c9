//! Owned handles for live listeners.

use std::fmt;
use tokio::task::JoinHandle;

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Handle to a live listener.
///
/// The release action runs at most once: on the first [`close`](Self::close)
/// or when the handle is dropped, whichever comes first. Closing an already
/// closed handle does nothing.
pub struct Subscription {
    name: &'static str,
    release: Option<ReleaseFn>,
}

impl Subscription {
    /// Create a subscription that runs `release` when closed.
    pub fn new<F>(name: &'static str, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            name,
            release: Some(Box::new(release)),
        }
    }

    /// Create a subscription that aborts a listener task when closed.
    pub fn from_task(name: &'static str, task: JoinHandle<()>) -> Self {
        Self::new(name, move || task.abort())
    }

    /// Release the listener. Idempotent.
    pub fn close(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::debug!("Closing {} subscription", self.name);
            release();
        }
    }

    /// Whether the listener is still attached.
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("active", &self.is_active())
            .finish()
    }
}
