//! In-process revocation cache.

use super::{ttl_seconds, CacheError, RevocationCache};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Eviction sweep runs once the map grows past this many entries.
const SWEEP_THRESHOLD: usize = 10_000;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Revocation cache held in a local map.
///
/// Entries expire lazily on read and are swept when the map grows large.
pub struct InMemoryRevocationCache {
    entries: RwLock<HashMap<String, Entry>>,
    open: AtomicBool,
}

impl Default for InMemoryRevocationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRevocationCache {
    /// Create a cache that is ready for use without calling `initialize`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            open: AtomicBool::new(true),
        }
    }

    /// Time left before `key` expires, if it is present.
    pub async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .and_then(|entry| entry.expires_at.checked_duration_since(Instant::now()))
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(CacheError::NotInitialized)
        }
    }
}

#[async_trait]
impl RevocationCache for InMemoryRevocationCache {
    async fn initialize(&self) -> Result<(), CacheError> {
        self.open.store(true, Ordering::Release);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.ensure_open()?;

        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.ensure_open()?;
        let secs = ttl_seconds(ttl)?;

        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(secs),
            },
        );

        if entries.len() > SWEEP_THRESHOLD {
            let now = Instant::now();
            entries.retain(|_, entry| entry.expires_at > now);
        }

        Ok(())
    }

    async fn close(&self) {
        self.open.store(false, Ordering::Release);
        self.entries.write().await.clear();
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
