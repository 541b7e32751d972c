//! A small TTL cache for resource metadata.
//!
//! Entries are keyed by resource id and expire after a fixed time to live.
//! Expired entries are never returned and are dropped on the next write.

use mea::rwlock::RwLock;
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};
use tokio::time::Instant;

/// Time to live used when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Shared, async-safe map of resource id to value with per-entry expiry.
///
/// Clones share the same entries.
pub struct ResourceCache<V> {
    entries: Arc<RwLock<HashMap<String, Entry<V>>>>,
    ttl: Duration,
}

impl<V> Clone for ResourceCache<V> {
    fn clone(&self) -> Self {
        Self { entries: Arc::clone(&self.entries), ttl: self.ttl }
    }
}

impl<V> fmt::Debug for ResourceCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<V: Clone> ResourceCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the live value cached under `id`.
    pub async fn get(&self, id: &str) -> Option<V> {
        let entries = self.entries.read().await;
        let now = Instant::now();

        entries
            .get(id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    /// Caches `value` under `id` for the default time to live.
    pub async fn insert(&self, id: impl Into<String>, value: V) {
        self.insert_with_ttl(id, value, self.ttl).await
    }

    pub async fn insert_with_ttl(&self, id: impl Into<String>, value: V, ttl: Duration) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();

        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(id.into(), Entry { value, expires_at: now + ttl });
    }

    pub async fn invalidate(&self, id: &str) -> Option<V> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();

        entries
            .remove(id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        let now = Instant::now();

        entries.values().filter(|entry| entry.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<V: Clone> Default for ResourceCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
