//! Common test utilities for integration tests.
//!
//! Builds a [`ChatContext`] from the in-memory collaborators and keeps typed
//! handles to them so tests can script failures and inspect side effects.

use gochat_core::memory::{
    MemoryBlobStore, MemoryIdentityProvider, MemoryKeyValueStore, MemoryMessageStore,
    ScriptedImagePicker, ScriptedLocationFixer, StaticProbe,
};
use gochat_core::{ChatContext, Config, Timeline, TimelineHandle};
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for test operations.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize test logging with appropriate filters.
///
/// Safe to call multiple times (subsequent calls are no-ops).
#[allow(dead_code)]
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gochat_core=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Run an async operation with a timeout, panicking if it does not finish.
#[allow(dead_code)]
pub async fn with_timeout<T, F>(fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, fut)
        .await
        .expect("Test operation timed out")
}

/// Wait until the timeline satisfies `pred`.
#[allow(dead_code, clippy::let_and_return)]
pub async fn wait_for_timeline<P>(timeline: &TimelineHandle, pred: P) -> Timeline
where
    P: FnMut(&Timeline) -> bool,
{
    let mut rx = timeline.subscribe();
    let result = with_timeout(rx.wait_for(pred)).await;
    let timeline = result.expect("timeline handle dropped").clone();
    timeline
}

/// In-memory collaborators plus the context wired from them.
#[allow(dead_code)]
pub struct Harness {
    pub identity: Arc<MemoryIdentityProvider>,
    pub remote: Arc<MemoryMessageStore>,
    pub local_store: Arc<MemoryKeyValueStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub images: Arc<ScriptedImagePicker>,
    pub location: Arc<ScriptedLocationFixer>,
    pub ctx: ChatContext,
}

impl Harness {
    #[allow(dead_code)]
    pub fn online() -> Self {
        Self::with_probe(StaticProbe::online(), MemoryIdentityProvider::new())
    }

    #[allow(dead_code)]
    pub fn offline() -> Self {
        Self::with_probe(StaticProbe::offline(), MemoryIdentityProvider::new())
    }

    pub fn with_probe(probe: StaticProbe, identity: MemoryIdentityProvider) -> Self {
        let identity = Arc::new(identity);
        let remote = Arc::new(MemoryMessageStore::new());
        let local_store = Arc::new(MemoryKeyValueStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let images = Arc::new(ScriptedImagePicker::new());
        let location = Arc::new(ScriptedLocationFixer::new());

        let ctx = ChatContext {
            config: Config::default(),
            probe: Arc::new(probe),
            identity: identity.clone(),
            remote: remote.clone(),
            local_store: local_store.clone(),
            blobs: blobs.clone(),
            images: images.clone(),
            location: location.clone(),
        };

        Self {
            identity,
            remote,
            local_store,
            blobs,
            images,
            location,
            ctx,
        }
    }
}
