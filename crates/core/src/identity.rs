//! Anonymous identity session.
//!
//! The provider hands out opaque anonymous ids. The session binds whichever id
//! it gets to the display name typed on the start screen and a fixed avatar.

use crate::chat::types::Session;
use crate::error::{Error, Result};
use crate::subscription::Subscription;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Source of anonymous identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Id of the identity signed in right now, if any.
    async fn current_identity(&self) -> Option<String>;

    /// Create and sign in a new anonymous identity.
    async fn create_anonymous_identity(&self) -> Result<String>;

    /// Receiver that observes every identity change.
    fn watch_identity(&self) -> watch::Receiver<Option<String>>;
}

/// Resolves a [`Session`] from an [`IdentityProvider`].
#[derive(Clone)]
pub struct IdentitySession {
    provider: Arc<dyn IdentityProvider>,
    avatar_url: String,
}

impl IdentitySession {
    pub fn new(provider: Arc<dyn IdentityProvider>, avatar_url: impl Into<String>) -> Self {
        Self {
            provider,
            avatar_url: avatar_url.into(),
        }
    }

    /// Reuse the current identity or create one, then bind it to `display_name`.
    ///
    /// # Errors
    /// `Error::Auth` if a new identity had to be created and creation failed.
    pub async fn resolve(&self, display_name: &str) -> Result<Session> {
        let user_id = match self.provider.current_identity().await {
            Some(id) => id,
            None => self
                .provider
                .create_anonymous_identity()
                .await
                .map_err(|e| Error::Auth(e.to_string()))?,
        };
        Ok(bind(user_id, display_name, &self.avatar_url))
    }

    /// Follow identity changes, calling `on_session` for every signed-in id.
    ///
    /// When nobody is signed in the listener creates an anonymous identity.
    /// If that fails the failure is logged and `on_session` is never called;
    /// there is no retry and no timeout.
    pub fn listen<F>(&self, display_name: impl Into<String>, on_session: F) -> Subscription
    where
        F: Fn(Session) + Send + Sync + 'static,
    {
        let provider = self.provider.clone();
        let avatar_url = self.avatar_url.clone();
        let display_name = display_name.into();
        let mut changes = provider.watch_identity();

        let task = tokio::spawn(async move {
            loop {
                let current = changes.borrow_and_update().clone();
                match current {
                    Some(user_id) => {
                        tracing::info!("Identity {} resolved for {}", user_id, display_name);
                        on_session(bind(user_id, &display_name, &avatar_url));
                    }
                    None => {
                        if let Err(e) = provider.create_anonymous_identity().await {
                            tracing::warn!("Anonymous sign-in failed: {}", e);
                        }
                    }
                }

                if changes.changed().await.is_err() {
                    tracing::debug!("Identity provider closed its change feed");
                    break;
                }
            }
        });

        Subscription::from_task("identity", task)
    }
}

fn bind(user_id: String, display_name: &str, avatar_url: &str) -> Session {
    Session {
        user_id,
        display_name: display_name.to_string(),
        avatar_url: avatar_url.to_string(),
    }
}
