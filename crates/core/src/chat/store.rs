//! Durable local snapshot of the timeline.
//!
//! The whole timeline is stored as one JSON string under a fixed key. There is
//! no append and no versioning: every save overwrites the previous snapshot.

use crate::chat::types::Timeline;
use crate::error::{Error, Result};
use async_trait::async_trait;
use sled::{Db, Tree};
use std::path::Path;
use std::sync::Arc;

/// String key-value store that survives restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Sled-based key-value store.
///
/// Database structure:
/// - `kv`: key -> UTF-8 value
pub struct SledKeyValueStore {
    #[allow(dead_code)]
    db: Db,
    kv: Tree,
}

impl SledKeyValueStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = sled::open(path)
            .map_err(|e| Error::Storage(format!("failed to open cache database: {}", e)))?;
        Self::from_db(db)
    }

    /// Open a throwaway database that is deleted on drop.
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| Error::Storage(format!("failed to open temporary database: {}", e)))?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self> {
        Ok(Self {
            kv: db.open_tree("kv")?,
            db,
        })
    }
}

#[async_trait]
impl KeyValueStore for SledKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.kv.get(key.as_bytes())? {
            Some(data) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|e| Error::Storage(format!("value for {} is not UTF-8: {}", key, e))),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.kv.insert(key.as_bytes(), value.into_bytes())?;
        self.kv.flush_async().await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.kv.remove(key.as_bytes())?;
        self.kv.flush_async().await?;
        Ok(())
    }
}

/// Local cache fallback for the timeline.
///
/// Every failure is logged and absorbed; the in-memory timeline stays
/// authoritative no matter what happens here.
#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl LocalCache {
    /// Create a cache storing its snapshot under `key`.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the last saved timeline.
    ///
    /// Returns an empty timeline if nothing was saved or the snapshot does not
    /// parse.
    pub async fn load(&self) -> Timeline {
        match self.try_load().await {
            Ok(timeline) => {
                tracing::debug!("Loaded {} cached messages", timeline.len());
                timeline
            }
            Err(e) => {
                tracing::warn!("Failed to load cached timeline: {}", e);
                Timeline::new()
            }
        }
    }

    /// Serialize `timeline` and overwrite the stored snapshot.
    pub async fn save(&self, timeline: &Timeline) {
        if let Err(e) = self.try_save(timeline).await {
            tracing::warn!("Failed to save timeline snapshot: {}", e);
        }
    }

    /// Remove the stored snapshot.
    pub async fn clear(&self) {
        match self.store.remove(&self.key).await {
            Ok(()) => tracing::info!("Cleared cached timeline"),
            Err(e) => tracing::warn!("Failed to clear cached timeline: {}", e),
        }
    }

    async fn try_load(&self) -> Result<Timeline> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(Timeline::new());
        };
        serde_json::from_str(&raw)
            .map_err(|e| Error::Cache(format!("failed to parse cached timeline: {}", e)))
    }

    async fn try_save(&self, timeline: &Timeline) -> Result<()> {
        let data = serde_json::to_string(timeline)
            .map_err(|e| Error::Cache(format!("failed to serialize timeline: {}", e)))?;
        self.store.set(&self.key, data).await?;
        tracing::debug!("Saved {} messages to local cache", timeline.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::{GeoPoint, MessageDraft, Session};
    use crate::memory::MemoryKeyValueStore;

    fn session() -> Session {
        Session {
            user_id: "u1".to_string(),
            display_name: "Ada".to_string(),
            avatar_url: "https://placeimg.com/140/140/any".to_string(),
        }
    }

    fn sample_timeline() -> Timeline {
        let s = session();
        vec![
            s.compose(MessageDraft::location(GeoPoint::new(-33.8688, 151.2093))),
            s.compose(MessageDraft::image("https://blobs.example/cat.jpg")),
            s.compose(MessageDraft::text("hello")),
        ]
    }

    #[tokio::test]
    async fn test_save_then_load_roundtrip() {
        let cache = LocalCache::new(Arc::new(MemoryKeyValueStore::new()), "messages");
        let timeline = sample_timeline();

        cache.save(&timeline).await;
        assert_eq!(cache.load().await, timeline);
    }

    #[tokio::test]
    async fn test_never_saved_loads_empty() {
        let cache = LocalCache::new(Arc::new(MemoryKeyValueStore::new()), "messages");
        assert!(cache.load().await.is_empty());

        cache.save(&Timeline::new()).await;
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_loads_empty() {
        let store = Arc::new(MemoryKeyValueStore::new());
        store
            .set("messages", "{not json".to_string())
            .await
            .unwrap();

        let cache = LocalCache::new(store, "messages");
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_snapshot() {
        let cache = LocalCache::new(Arc::new(MemoryKeyValueStore::new()), "messages");
        cache.save(&sample_timeline()).await;

        cache.clear().await;
        cache.clear().await;
        assert!(cache.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_io_failures_are_absorbed() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let cache = LocalCache::new(store.clone(), "messages");
        cache.save(&sample_timeline()).await;

        store.set_failing(true);
        cache.save(&Timeline::new()).await;
        cache.clear().await;
        assert!(cache.load().await.is_empty());

        store.set_failing(false);
        assert_eq!(cache.load().await.len(), 3);
    }

    #[tokio::test]
    async fn test_sled_store_backs_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Arc::new(SledKeyValueStore::open(&dir.path().join("cache.db")).unwrap());
        let timeline = sample_timeline();

        LocalCache::new(store.clone(), "messages").save(&timeline).await;

        let cache = LocalCache::new(store.clone(), "messages");
        assert_eq!(cache.load().await, timeline);
        assert!(store.get("messages").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sled_remove_missing_key() {
        let store = SledKeyValueStore::open_temporary().unwrap();
        store.remove("absent").await.unwrap();
        assert_eq!(store.get("absent").await.unwrap(), None);

        store.set("k", "v".to_string()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
