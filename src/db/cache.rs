use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::models::AnimeRecord;

/// On-disk cache contents: cache key → catalog records
pub type CacheMap = BTreeMap<String, Vec<AnimeRecord>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Jikan by-genre listing for a genre id and page count
    Genre { genre_id: u32, pages: u32 },
    /// AniList search, keyed case-insensitively by query text
    AniListSearch(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Genre { genre_id, pages } => write!(f, "genre_{}_p{}", genre_id, pages),
            CacheKey::AniListSearch(query) => write!(f, "{}", query.to_lowercase()),
        }
    }
}

/// Reads a cache file
///
/// A missing file is an empty cache. An unreadable or malformed file is an
/// error; read-through callers downgrade it to an empty cache.
pub async fn load(path: &Path) -> AppResult<CacheMap> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CacheMap::new()),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&raw).map_err(|e| {
        AppError::Cache(format!(
            "Cache deserialization error in {}: {}",
            path.display(),
            e
        ))
    })
}

/// Overwrites a cache file with the full mapping, creating its directory first
pub async fn save(path: &Path, cache: &CacheMap) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(cache)
        .map_err(|e| AppError::Cache(format!("Cache serialization error: {}", e)))?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// Read-through JSON file cache
///
/// Entries never expire. Writes from this process are serialized; nothing
/// guards the file against other processes sharing the same cache directory.
#[derive(Debug, Clone)]
pub struct JsonCache {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file, treating a corrupt cache as empty
    async fn load_or_empty(&self) -> CacheMap {
        match load(&self.path).await {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %self.path.display(),
                    "Ignoring unreadable cache file"
                );
                CacheMap::new()
            }
        }
    }

    /// Retrieves cached records for a key, if present
    pub async fn get_from_cache(&self, key: &CacheKey) -> AppResult<Option<Vec<AnimeRecord>>> {
        let cache = self.load_or_empty().await;
        let hit = cache.get(&key.to_string()).cloned();

        tracing::debug!(
            key = %key,
            hit = hit.is_some(),
            path = %self.path.display(),
            "Cache lookup"
        );

        Ok(hit)
    }

    /// Stores records under a key, rewriting the whole file
    pub async fn set(&self, key: &CacheKey, value: &[AnimeRecord]) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut cache = self.load_or_empty().await;
        cache.insert(key.to_string(), value.to_vec());
        save(&self.path, &cache).await?;

        tracing::debug!(
            key = %key,
            records = value.len(),
            entries = cache.len(),
            "Cache entry written"
        );

        Ok(())
    }
}
