use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Get the platform-appropriate cache directory for gridtable
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("gridtable/http-cache"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/gridtable/http-cache",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Remove the response cache directory
pub fn clear_cache(cache_path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// Serialized form of a cached response body
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: i64, // Unix timestamp
    body: Vec<u8>,
}

/// Disk-persistent response cache keyed by request URL.
///
/// Entries marked volatile (anything belonging to a season still in
/// progress) expire after `ttl`; all other entries are kept until the cache
/// is cleared, since results of finished seasons do not change.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache_path: PathBuf,
    ttl: Duration,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(cache_path: PathBuf, ttl: Duration) -> Self {
        Self {
            cache_path,
            ttl,
            enabled: true,
        }
    }

    /// A cache that never hits and never writes (--no-cache)
    pub fn disabled() -> Self {
        Self {
            cache_path: PathBuf::new(),
            ttl: Duration::ZERO,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    /// Look up a cached body. Returns `None` on miss, on an unreadable entry,
    /// or when a volatile entry is older than the TTL.
    pub fn get(&self, key: &str, volatile: bool) -> Option<Vec<u8>> {
        if !self.enabled {
            return None;
        }

        let bytes = cacache::read_sync(&self.cache_path, key).ok()?;
        let entry: CacheEntry = serde_json::from_slice(&bytes).ok()?;

        if volatile && !self.is_fresh(entry.fetched_at, Utc::now().timestamp()) {
            tracing::debug!(key, "cache entry expired");
            return None;
        }

        Some(entry.body)
    }

    /// Store a body. Write failures are logged and otherwise ignored; the
    /// cache is an optimisation, never a source of errors.
    pub fn put(&self, key: &str, body: &[u8]) {
        if !self.enabled {
            return;
        }

        let entry = CacheEntry {
            fetched_at: Utc::now().timestamp(),
            body: body.to_vec(),
        };
        match serde_json::to_vec(&entry) {
            Ok(serialized) => {
                if let Err(e) = cacache::write_sync(&self.cache_path, key, &serialized) {
                    tracing::warn!(key, error = %e, "failed to write cache entry");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "failed to serialize cache entry"),
        }
    }

    fn is_fresh(&self, fetched_at: i64, now: i64) -> bool {
        let age = now.saturating_sub(fetched_at).max(0) as u64;
        age < self.ttl.as_secs()
    }
}
