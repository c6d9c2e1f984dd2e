// # Cache Store Trait
//
// Defines the interface for persisting the reconciliation cache.
//
// ## Purpose
//
// The cache makes repeated runs idempotent: it remembers the last applied
// address per family and the provider-side ids of every domain pushed under
// it, so unchanged runs make no provider calls at all.
//
// The store is read once at the start of a run and written at most once at
// the end. It does no locking; one run owns the cache at a time.

use async_trait::async_trait;

use crate::cache::Cache;

/// Trait for cache store implementations
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Load the cache left by the previous run
    ///
    /// # Returns
    ///
    /// - `Ok(Cache)`: The stored cache, or an empty one if nothing is stored
    /// - `Err(Error::InvalidCache)`: Stored data exists but does not parse
    /// - `Err(Error::Cache)`: Storage could not be read
    async fn load(&self) -> Result<Cache, crate::Error>;

    /// Replace the stored cache
    async fn save(&self, cache: &Cache) -> Result<(), crate::Error>;

    /// Remove the stored cache; removing nothing is not an error
    async fn delete(&self) -> Result<(), crate::Error>;

    /// Human-readable location for log messages
    fn location(&self) -> String;
}
