//! Cache Store Module
//!
//! Store-provider capability injected into the dispatcher, plus the
//! in-memory implementation the gateway ships with.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheEntry, CacheStats};
use crate::error::Result;
use crate::network::HttpResponse;

// == Store Traits ==
/// A single named cache store: URL key to stored response.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Name the store was opened under.
    fn name(&self) -> &str;

    /// Returns a copy of the response stored under `key`, if any.
    async fn match_key(&self, key: &str) -> Result<Option<HttpResponse>>;

    /// Stores `response` under `key`, replacing any previous entry.
    async fn put(&self, key: String, response: HttpResponse) -> Result<()>;

    /// Stores every pair or none of them.
    async fn put_all(&self, entries: Vec<(String, HttpResponse)>) -> Result<()> {
        for (key, response) in entries {
            self.put(key, response).await?;
        }
        Ok(())
    }

    /// Keys currently stored.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Activity counters for this store.
    async fn stats(&self) -> Result<CacheStats>;
}

/// The collection of named stores (the host's cache storage).
#[async_trait]
pub trait CacheStorage: Send + Sync + 'static {
    /// Opens the store called `name`, creating it on first use.
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>>;

    /// Deletes the store called `name`. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Names of all existing stores.
    async fn keys(&self) -> Result<Vec<String>>;
}

// == Memory Cache ==
#[derive(Debug, Default)]
struct MemoryCacheInner {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

/// In-memory [`CacheStore`].
#[derive(Debug)]
pub struct MemoryCache {
    name: String,
    inner: RwLock<MemoryCacheInner>,
}

impl MemoryCache {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(MemoryCacheInner::default()),
        }
    }

    /// Returns the full entry, including its storage timestamp.
    pub async fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.inner.read().await.entries.get(key).cloned()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_key(&self, key: &str) -> Result<Option<HttpResponse>> {
        // Write lock: lookups update the hit/miss counters
        let mut inner = self.inner.write().await;
        let found = inner.entries.get(key).map(|entry| entry.response.clone());
        inner.stats.record_lookup(found.is_some());
        Ok(found)
    }

    async fn put(&self, key: String, response: HttpResponse) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.entries.insert(key, CacheEntry::new(response));
        let len = inner.entries.len();
        inner.stats.record_writes(1, len);
        Ok(())
    }

    async fn put_all(&self, entries: Vec<(String, HttpResponse)>) -> Result<()> {
        let mut inner = self.inner.write().await;
        let count = entries.len();
        for (key, response) in entries {
            inner.entries.insert(key, CacheEntry::new(response));
        }
        let len = inner.entries.len();
        inner.stats.record_writes(count, len);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let mut keys: Vec<String> = inner.entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn stats(&self) -> Result<CacheStats> {
        Ok(self.inner.read().await.stats.clone())
    }
}

// == Memory Cache Storage ==
/// In-memory [`CacheStorage`]; stores live for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    stores: RwLock<BTreeMap<String, Arc<MemoryCache>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>> {
        if let Some(store) = self.stores.read().await.get(name) {
            return Ok(store.clone());
        }

        let mut stores = self.stores.write().await;
        let store = stores
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCache::new(name)))
            .clone();
        Ok(store)
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.stores.write().await.remove(name).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.stores.read().await.keys().cloned().collect())
    }
}
