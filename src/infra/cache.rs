//! Persistent on-disk cache for the ferry catalog with TTL tracking.

use std::{
    fs,
    path::PathBuf,
    sync::OnceLock,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::domain::RawFerryRecord;

const CACHE_FILENAME: &str = "ferry_cache.json";

/// Cache TTL: 24 hours. The ferry list changes rarely, but tariffs do move.
pub const CATALOG_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cached raw ferry records. Raw records are stored (not parsed routes) so a
/// cache hit replays the exact same catalog load path as a remote fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogCache {
    /// Unix timestamp (seconds) when this cache was created.
    pub cached_at: u64,
    pub records: Vec<RawFerryRecord>,
}

impl CatalogCache {
    /// Create a new cache with current timestamp.
    pub fn new(records: Vec<RawFerryRecord>) -> Self {
        let cached_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self { cached_at, records }
    }

    /// Check if cache has expired (older than TTL).
    pub fn is_expired(&self) -> bool {
        self.age() > CATALOG_CACHE_TTL
    }

    /// Get cache age as Duration.
    pub fn age(&self) -> Duration {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Duration::from_secs(now.saturating_sub(self.cached_at))
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        let secs = self.age().as_secs();
        if secs < 60 {
            format!("{secs}s")
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h", secs / 3600)
        } else {
            format!("{}d", secs / 86400)
        }
    }
}

/// Get the cache file path (in app data directory).
fn cache_path() -> PathBuf {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("freight-cost-estimator");
        let _ = fs::create_dir_all(&base);
        base.join(CACHE_FILENAME)
    })
    .clone()
}

/// Load the catalog cache from disk, if it exists and has not expired.
pub fn load_catalog_cache() -> Option<CatalogCache> {
    let path = cache_path();

    if !path.exists() {
        println!("[cache] No ferry cache found at {}", path.display());
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str::<CatalogCache>(&content) {
            Ok(cache) => {
                if cache.is_expired() {
                    println!("[cache] Ferry cache expired (age: {})", cache.age_string());
                    return None;
                }
                println!(
                    "[cache] Loaded {} ferry records (age: {})",
                    cache.records.len(),
                    cache.age_string()
                );
                Some(cache)
            }
            Err(e) => {
                println!("[cache] Failed to parse ferry cache: {e}");
                None
            }
        },
        Err(e) => {
            println!("[cache] Failed to read ferry cache: {e}");
            None
        }
    }
}

/// Save the catalog cache to disk.
pub fn save_catalog_cache(cache: &CatalogCache) -> Result<(), std::io::Error> {
    let path = cache_path();
    let content = serde_json::to_string_pretty(cache)?;
    fs::write(&path, content)?;
    println!(
        "[cache] Saved {} ferry records to {}",
        cache.records.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cache_is_not_expired() {
        let cache = CatalogCache::new(Vec::new());
        assert!(!cache.is_expired());
        assert_eq!(cache.age_string(), "0s");
    }

    #[test]
    fn old_cache_expires_past_the_ttl() {
        let mut cache = CatalogCache::new(Vec::new());
        cache.cached_at -= CATALOG_CACHE_TTL.as_secs() + 90;
        assert!(cache.is_expired());
        assert_eq!(cache.age_string(), "1d");
    }
}
