//! In-process implementations of every collaborator trait.
//!
//! The CLI uses these to run the engine without a hosted backend, and the
//! tests use them to script connectivity, identity, remote and device
//! behaviour (including failures).

use crate::attachment::{BlobStore, CaptureOutcome, CapturedImage, ImagePicker, LocationFixer};
use crate::chat::store::KeyValueStore;
use crate::chat::types::{GeoPoint, MessageRecord};
use crate::connectivity::ConnectivityProbe;
use crate::error::{Error, Result};
use crate::identity::IdentityProvider;
use crate::sync::{RemoteMessageStore, SnapshotStream};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};

/// Probe with a fixed answer.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    answer: std::result::Result<bool, String>,
}

impl StaticProbe {
    pub fn online() -> Self {
        Self { answer: Ok(true) }
    }

    pub fn offline() -> Self {
        Self { answer: Ok(false) }
    }

    /// A probe that cannot run at all.
    pub fn broken(reason: impl Into<String>) -> Self {
        Self {
            answer: Err(reason.into()),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for StaticProbe {
    async fn is_connected(&self) -> Result<bool> {
        self.answer.clone().map_err(Error::Io)
    }
}

/// Identity provider holding at most one signed-in anonymous id.
#[derive(Debug)]
pub struct MemoryIdentityProvider {
    current: watch::Sender<Option<String>>,
    fail_creation: AtomicBool,
    created: AtomicUsize,
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentityProvider {
    /// Nobody signed in; creation succeeds.
    pub fn new() -> Self {
        Self {
            current: watch::Sender::new(None),
            fail_creation: AtomicBool::new(false),
            created: AtomicUsize::new(0),
        }
    }

    /// Already signed in as `user_id`.
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        let provider = Self::new();
        provider.current.send_replace(Some(user_id.into()));
        provider
    }

    /// Nobody signed in and every creation attempt fails.
    pub fn failing() -> Self {
        let provider = Self::new();
        provider.fail_creation.store(true, Ordering::SeqCst);
        provider
    }

    /// Number of identities created so far.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn sign_out(&self) {
        self.current.send_replace(None);
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn current_identity(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    async fn create_anonymous_identity(&self) -> Result<String> {
        if self.fail_creation.load(Ordering::SeqCst) {
            return Err(Error::Auth("anonymous sign-in is disabled".to_string()));
        }
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.created.fetch_add(1, Ordering::SeqCst);
        self.current.send_replace(Some(id.clone()));
        Ok(id)
    }

    fn watch_identity(&self) -> watch::Receiver<Option<String>> {
        self.current.subscribe()
    }
}

#[derive(Default)]
struct CollectionState {
    /// Records in insertion order.
    records: Vec<MessageRecord>,
    listeners: Vec<mpsc::UnboundedSender<Result<Vec<MessageRecord>>>>,
}

impl CollectionState {
    /// Full result set ordered by `createdAt` descending; later inserts win ties.
    fn ordered(&self) -> Vec<MessageRecord> {
        let mut records: Vec<_> = self.records.iter().rev().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    fn broadcast(&mut self, item: impl Fn() -> Result<Vec<MessageRecord>>) {
        self.listeners.retain(|tx| tx.send(item()).is_ok());
    }
}

/// Message collection whose live query emits the full result set on every
/// insert.
#[derive(Default)]
pub struct MemoryMessageStore {
    state: Mutex<CollectionState>,
    fail_writes: AtomicBool,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject (or accept again) every subsequent write.
    pub fn set_failing_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// Deliver a listener error to every open query.
    pub fn emit_listener_error(&self, reason: &str) {
        let mut state = self.lock();
        state.broadcast(|| Err(Error::Sync(reason.to_string())));
    }

    /// Stored records, newest first.
    pub fn records(&self) -> Vec<MessageRecord> {
        self.lock().ordered()
    }

    /// Number of open live queries.
    pub fn listener_count(&self) -> usize {
        let mut state = self.lock();
        state.listeners.retain(|tx| !tx.is_closed());
        state.listeners.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CollectionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RemoteMessageStore for MemoryMessageStore {
    async fn add(&self, record: MessageRecord) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Send(format!("write of {} rejected", record.id)));
        }

        let mut state = self.lock();
        state.records.push(record);
        let snapshot = state.ordered();
        state.broadcast(|| Ok(snapshot.clone()));
        Ok(())
    }

    fn subscribe(&self) -> SnapshotStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        if tx.send(Ok(state.ordered())).is_ok() {
            state.listeners.push(tx);
        }
        rx
    }
}

/// Key-value store kept in a map, with failure injection.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with an IO error until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(Error::Io("storage unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.check()?;
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        self.entries().remove(key);
        Ok(())
    }
}

/// Blob store keeping uploads in memory under `memory://blobs/<name>`.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.blobs().get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs().is_empty()
    }

    fn blobs(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Capture("network request failed".to_string()));
        }
        self.blobs().insert(name.to_string(), bytes);
        Ok(format!("memory://blobs/{}", name))
    }
}

/// Image picker replaying queued outcomes; an empty queue means "cancelled".
#[derive(Debug, Default)]
pub struct ScriptedImagePicker {
    library: Mutex<VecDeque<CaptureOutcome<CapturedImage>>>,
    camera: Mutex<VecDeque<CaptureOutcome<CapturedImage>>>,
}

impl ScriptedImagePicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_library(&self, outcome: CaptureOutcome<CapturedImage>) {
        next_queue(&self.library).push_back(outcome);
    }

    pub fn push_camera(&self, outcome: CaptureOutcome<CapturedImage>) {
        next_queue(&self.camera).push_back(outcome);
    }
}

#[async_trait]
impl ImagePicker for ScriptedImagePicker {
    async fn pick_from_library(&self) -> Result<CaptureOutcome<CapturedImage>> {
        Ok(next_queue(&self.library)
            .pop_front()
            .unwrap_or(CaptureOutcome::Cancelled))
    }

    async fn take_photo(&self) -> Result<CaptureOutcome<CapturedImage>> {
        Ok(next_queue(&self.camera)
            .pop_front()
            .unwrap_or(CaptureOutcome::Cancelled))
    }
}

/// Location fixer replaying queued outcomes; an empty queue means "denied".
#[derive(Debug, Default)]
pub struct ScriptedLocationFixer {
    fixes: Mutex<VecDeque<CaptureOutcome<GeoPoint>>>,
}

impl ScriptedLocationFixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, outcome: CaptureOutcome<GeoPoint>) {
        next_queue(&self.fixes).push_back(outcome);
    }
}

#[async_trait]
impl LocationFixer for ScriptedLocationFixer {
    async fn current_position(&self) -> Result<CaptureOutcome<GeoPoint>> {
        Ok(next_queue(&self.fixes)
            .pop_front()
            .unwrap_or(CaptureOutcome::Denied))
    }
}

fn next_queue<T>(queue: &Mutex<VecDeque<T>>) -> std::sync::MutexGuard<'_, VecDeque<T>> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
