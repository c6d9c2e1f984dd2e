// # File Cache Store
//
// JSON file implementation of CacheStore.
//
// - Missing file: loads as an empty cache
// - Unparseable file: reported as `InvalidCache`, the engine deletes it
// - Writes: temp file then rename, so a crash never leaves a half-written
//   cache behind
// - Parent directories are created on save

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::cache::Cache;
use crate::traits::cache_store::CacheStore;

/// File-based cache store
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::cache::{Cache, FileCacheStore};
/// use ddns_core::traits::CacheStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileCacheStore::new("/var/cache/cloudflare-dyndns/ip.cache");
///
///     let mut cache = store.load().await?;
///     cache.ipv4.address = Some("192.0.2.1".parse()?);
///     store.save(&cache).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    path: PathBuf,
}

impl FileCacheStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }

    async fn ensure_parent(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tracing::debug!("Creating cache directory: {}", parent.display());
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::cache(format!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn load(&self) -> Result<Cache, Error> {
        tracing::info!("Loading cache from: {}", self.path.display());

        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("Cache file not found.");
                return Ok(Cache::new());
            }
            Err(e) => {
                return Err(Error::cache(format!(
                    "Failed to read cache file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let cache: Cache = serde_json::from_str(&content).map_err(|e| {
            tracing::debug!("Invalid cache content: {}", content);
            Error::invalid_cache(format!("{}: {}", self.path.display(), e))
        })?;

        tracing::debug!("Loaded cache: {:?}", cache);
        Ok(cache)
    }

    async fn save(&self, cache: &Cache) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(cache)
            .map_err(|e| Error::cache(format!("Failed to serialize cache: {}", e)))?;

        tracing::debug!("Saving cache: {}", json);
        tracing::info!("Saving cache to: {}", self.path.display());

        self.ensure_parent().await?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::cache(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::cache(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::cache(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::cache(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }

    async fn delete(&self) -> Result<(), Error> {
        tracing::warn!("Deleting cache at: {}", self.path.display());

        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::cache(format!(
                "Failed to delete cache file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
