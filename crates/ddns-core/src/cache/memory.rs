// # Memory Cache Store
//
// In-memory implementation of CacheStore. Nothing survives the process;
// useful for embedding the engine and for tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::cache::Cache;
use crate::traits::cache_store::CacheStore;

/// In-memory cache store
///
/// Clones share the same slot, so a test can keep one handle and hand the
/// other to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    inner: Arc<RwLock<Option<Cache>>>,
}

impl MemoryCacheStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a cache
    pub fn with_cache(cache: Cache) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(cache))),
        }
    }

    /// Currently stored cache, `None` if nothing was saved or it was deleted
    pub async fn stored(&self) -> Option<Cache> {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn load(&self) -> Result<Cache, Error> {
        Ok(self.inner.read().await.clone().unwrap_or_default())
    }

    async fn save(&self, cache: &Cache) -> Result<(), Error> {
        *self.inner.write().await = Some(cache.clone());
        Ok(())
    }

    async fn delete(&self) -> Result<(), Error> {
        *self.inner.write().await = None;
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryCacheStore::new();
        assert!(store.load().await.unwrap().is_empty());
        assert!(store.stored().await.is_none());

        let mut cache = Cache::new();
        cache.ipv6.address = Some("2001:db8::1".parse().unwrap());
        store.save(&cache).await.unwrap();

        let handle = store.clone();
        assert_eq!(handle.load().await.unwrap(), cache);

        store.delete().await.unwrap();
        assert!(handle.stored().await.is_none());
    }
}
