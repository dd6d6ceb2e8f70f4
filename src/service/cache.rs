//! Persistent description cache keyed by canonical URL.
//!
//! The on-disk form is a flat, pretty-printed JSON object so it can be
//! inspected and edited by hand between runs.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{HarvestError, Result};

#[derive(Debug, Default)]
pub struct DescriptionCache {
    entries: DashMap<String, String>,
}

impl DescriptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best-effort load. A missing, unreadable or corrupt file yields an empty cache.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("[CACHE] No cache file at {}, starting empty", path.display());
                return Self::new();
            }
            Err(e) => {
                tracing::warn!("[CACHE] Could not read {}: {}; starting empty", path.display(), e);
                return Self::new();
            }
        };

        match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
            Ok(map) => {
                tracing::info!("[CACHE] Loaded {} cached descriptions from {}", map.len(), path.display());
                Self {
                    entries: map.into_iter().collect(),
                }
            }
            Err(e) => {
                tracing::warn!("[CACHE] Ignoring corrupt cache {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Last write wins.
    pub fn put(&self, key: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(key.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted copy of every entry.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Writes the full mapping to `path` through a temporary file in the same
    /// directory followed by an atomic rename. A failed flush leaves the
    /// previous file untouched.
    pub fn flush(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| HarvestError::cache(format!("serialize: {}", e)))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_err = |e: std::io::Error| HarvestError::cache(format!("{}: {}", path.display(), e));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(body.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        tracing::info!("[CACHE] Flushed {} descriptions to {}", self.len(), path.display());
        Ok(())
    }
}

/// Scoped ownership of the cache file for one run: load on open, flush on
/// close, and flush from `Drop` if the run ends without closing.
pub struct CacheSession {
    path: PathBuf,
    cache: DescriptionCache,
    flushed: bool,
}

impl CacheSession {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = DescriptionCache::load(&path);
        Self {
            path,
            cache,
            flushed: false,
        }
    }

    pub fn cache(&self) -> &DescriptionCache {
        &self.cache
    }

    pub fn close(mut self) -> Result<()> {
        self.flushed = true;
        self.cache.flush(&self.path)
    }
}

impl Drop for CacheSession {
    fn drop(&mut self) {
        if self.flushed {
            return;
        }
        tracing::warn!("[CACHE] Run ended early, flushing partial progress");
        if let Err(e) = self.cache.flush(&self.path) {
            tracing::error!("[CACHE] Flush on exit failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DescriptionCache::load(&dir.path().join("absent.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{\"https://a\": \"desc\", truncated").unwrap();
        assert!(DescriptionCache::load(&path).is_empty());

        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(DescriptionCache::load(&path).is_empty());
    }

    #[test]
    fn test_put_overwrites() {
        let cache = DescriptionCache::new();
        cache.put("k", "first");
        cache.put("k", "second");
        assert_eq!(cache.get("k").as_deref(), Some("second"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn test_flush_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let cache = DescriptionCache::new();
        cache.put("https://www.site.test/viewjob?jk=1", "Remote SaaS role");
        cache.put("https://www.site.test/viewjob?jk=2", "Unicode ✓ \"quoted\"\nline");
        cache.flush(&path).unwrap();

        let reloaded = DescriptionCache::load(&path);
        assert_eq!(reloaded.snapshot(), cache.snapshot());
    }

    #[test]
    fn test_flush_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{\"old\": \"value\"}").unwrap();

        let cache = DescriptionCache::load(&path);
        cache.put("new", "value");
        cache.flush(&path).unwrap();

        let keys: Vec<_> = DescriptionCache::load(&path).snapshot().into_keys().collect();
        assert_eq!(keys, vec!["new".to_string(), "old".to_string()]);
        // No stray temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_session_flushes_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        {
            let session = CacheSession::open(&path);
            session.cache().put("k", "v");
        }

        assert_eq!(DescriptionCache::load(&path).get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_session_close_flushes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let session = CacheSession::open(&path);
        session.cache().put("k", "v");
        session.close().unwrap();

        let reopened = CacheSession::open(&path);
        assert_eq!(reopened.cache().get("k").as_deref(), Some("v"));
        reopened.close().unwrap();
    }
}
