//! Chat screen: wires the gate, identity, sync, cache, outbound pipeline and
//! attachments together for one screen lifetime.
//!
//! Start-up flow:
//! 1. The connectivity gate picks [`Mode::Live`] or [`Mode::Cached`] once.
//! 2. Cached: the local snapshot is loaded into the timeline; no listener is
//!    ever opened.
//! 3. Live: the identity listener resolves a session, and only then is the
//!    remote listener attached. From that point every remote snapshot
//!    replaces the timeline.
//!
//! [`ChatScreen::close`] (or dropping the screen) releases both listeners.

use crate::attachment::{AttachmentAction, Attachments, BlobStore, ImagePicker, LocationFixer};
use crate::chat::outbound::OutboundPipeline;
use crate::chat::store::{KeyValueStore, LocalCache};
use crate::chat::timeline::TimelineHandle;
use crate::chat::types::{Message, MessageDraft, Session};
use crate::config::Config;
use crate::connectivity::{ConnectivityGate, ConnectivityProbe, Mode};
use crate::error::{Error, Result};
use crate::identity::{IdentityProvider, IdentitySession};
use crate::subscription::Subscription;
use crate::sync::{RemoteMessageStore, RemoteSync};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Every external collaborator the engine talks to, built once at start-up.
#[derive(Clone)]
pub struct ChatContext {
    pub config: Config,
    pub probe: Arc<dyn ConnectivityProbe>,
    pub identity: Arc<dyn IdentityProvider>,
    pub remote: Arc<dyn RemoteMessageStore>,
    pub local_store: Arc<dyn KeyValueStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub images: Arc<dyn ImagePicker>,
    pub location: Arc<dyn LocationFixer>,
}

/// Status line shown above the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenStatus {
    LoggingIn,
    Ready { greeting: String },
    Offline,
}

impl std::fmt::Display for ScreenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenStatus::LoggingIn => write!(f, "Logging in..."),
            ScreenStatus::Ready { greeting } => write!(f, "{}", greeting),
            ScreenStatus::Offline => write!(f, "You are offline"),
        }
    }
}

#[derive(Default)]
struct SyncSlot {
    subscription: Option<Subscription>,
    closed: bool,
}

/// One chat screen lifetime.
pub struct ChatScreen {
    mode: Mode,
    timeline: TimelineHandle,
    cache: LocalCache,
    outbound: OutboundPipeline,
    attachments: Attachments,
    session: watch::Sender<Option<Session>>,
    status: watch::Sender<ScreenStatus>,
    identity_sub: Option<Subscription>,
    sync_slot: Arc<Mutex<SyncSlot>>,
}

impl ChatScreen {
    /// Decide the mode and bring the screen up.
    ///
    /// # Errors
    /// `Error::Startup` if the connectivity probe fails. Every later failure
    /// is logged and leaves the screen running in a degraded state.
    pub async fn start(ctx: &ChatContext, display_name: &str) -> Result<Self> {
        let mode = ConnectivityGate::new(ctx.probe.clone())
            .determine_mode()
            .await?;

        let timeline = TimelineHandle::new();
        let cache = LocalCache::new(ctx.local_store.clone(), ctx.config.cache_key.clone());
        let outbound = OutboundPipeline::new(timeline.clone(), ctx.remote.clone(), cache.clone());
        let attachments = Attachments::new(
            ctx.images.clone(),
            ctx.location.clone(),
            ctx.blobs.clone(),
        );

        let mut screen = Self {
            mode,
            timeline,
            cache,
            outbound,
            attachments,
            session: watch::Sender::new(None),
            status: watch::Sender::new(ScreenStatus::LoggingIn),
            identity_sub: None,
            sync_slot: Arc::new(Mutex::new(SyncSlot::default())),
        };

        match mode {
            Mode::Cached => {
                let snapshot = screen.cache.load().await;
                tracing::info!("Offline: showing {} cached messages", snapshot.len());
                screen.timeline.replace(snapshot);
                screen.status.send_replace(ScreenStatus::Offline);
            }
            Mode::Live => {
                let identity =
                    IdentitySession::new(ctx.identity.clone(), ctx.config.avatar_url.clone());
                let on_session = screen.session_handler(RemoteSync::new(ctx.remote.clone()));
                screen.identity_sub = Some(identity.listen(display_name, on_session));
            }
        }

        Ok(screen)
    }

    /// Callback run by the identity listener for every resolved session.
    fn session_handler(&self, sync: RemoteSync) -> impl Fn(Session) + Send + Sync + 'static {
        let timeline = self.timeline.clone();
        let session_tx = self.session.clone();
        let status_tx = self.status.clone();
        let slot = self.sync_slot.clone();

        move |session: Session| {
            let mut slot = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if slot.closed {
                return;
            }

            status_tx.send_replace(ScreenStatus::Ready {
                greeting: session.greeting(),
            });

            if slot.subscription.is_none() {
                timeline.replace(Vec::new());
                let sink = timeline.clone();
                slot.subscription = Some(sync.attach(&session, move |t| sink.replace(t)));
            }

            session_tx.send_replace(Some(session));
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn timeline(&self) -> &TimelineHandle {
        &self.timeline
    }

    pub fn status(&self) -> ScreenStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ScreenStatus> {
        self.status.subscribe()
    }

    /// Current session, if one has resolved.
    pub fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    /// Wait until a session resolves.
    ///
    /// Never completes if anonymous sign-in fails; callers that cannot wait
    /// forever must add their own timeout.
    pub async fn wait_for_session(&self) -> Option<Session> {
        let mut rx = self.session.subscribe();
        let result = rx.wait_for(Option::is_some).await;
        result.ok().and_then(|session| session.clone())
    }

    /// Whether the compose input is shown. Hidden while offline.
    pub fn input_enabled(&self) -> bool {
        self.mode == Mode::Live
    }

    /// Number of listeners still attached.
    pub fn active_subscriptions(&self) -> usize {
        let identity = self
            .identity_sub
            .as_ref()
            .is_some_and(Subscription::is_active);
        let sync = self
            .sync_slot
            .lock()
            .map(|slot| slot.subscription.as_ref().is_some_and(Subscription::is_active))
            .unwrap_or(false);
        usize::from(identity) + usize::from(sync)
    }

    /// Stamp `draft` with a new id, the current time and the session author.
    ///
    /// # Errors
    /// `Error::Auth` if no session has resolved yet.
    pub fn compose(&self, draft: MessageDraft) -> Result<Message> {
        let session = self
            .session()
            .ok_or_else(|| Error::Auth("no session resolved".to_string()))?;
        Ok(session.compose(draft))
    }

    /// Send an already stamped message through the outbound pipeline.
    pub async fn send(&self, message: Message) {
        self.outbound.send(message).await;
    }

    /// Compose and send a draft.
    pub async fn send_draft(&self, draft: MessageDraft) -> Result<Message> {
        let message = self.compose(draft)?;
        self.send(message.clone()).await;
        Ok(message)
    }

    /// Run an attachment action and send whatever it produces.
    ///
    /// Returns `Ok(None)` when the capture yields nothing (cancelled, denied
    /// or failed); in that case nothing is sent.
    pub async fn capture(&self, action: AttachmentAction) -> Result<Option<Message>> {
        if self.session().is_none() {
            return Err(Error::Auth("no session resolved".to_string()));
        }

        match self.attachments.capture(action).await {
            Some(draft) => self.send_draft(draft).await.map(Some),
            None => Ok(None),
        }
    }

    /// Remove the cached snapshot. Maintenance only.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Release the identity and remote listeners. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut sub) = self.identity_sub.take() {
            sub.close();
        }

        let sync_sub = {
            let mut slot = self
                .sync_slot
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slot.closed = true;
            slot.subscription.take()
        };
        if let Some(mut sub) = sync_sub {
            sub.close();
        }
    }
}

impl Drop for ChatScreen {
    fn drop(&mut self) {
        self.close();
    }
}
