//! Small key/value cache with expiry, kept next to the settings.
//!
//! Entries are only displayed by `tstats debug` and refreshed by `tstats update`;
//! the update pipeline itself never reads them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::StoreError;

/// Prefix of every key written by tstats.
pub const KEY_PREFIX: &str = "tstats_";

/// Key holding the last update outcome of a project in a locale.
pub fn update_key(slug: &str, wp_locale: &str) -> String {
    format!("{KEY_PREFIX}update_{slug}_{wp_locale}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    /// Unix seconds; `None` never expires.
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

pub trait CacheStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError>;
    /// Returns whether the key existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
    /// Live entries whose key starts with `prefix`, sorted by key.
    fn list(&self, prefix: &str) -> Result<Vec<CacheEntry>, StoreError>;
    /// Delete every entry whose key starts with `prefix`. Returns the count removed.
    fn clear(&self, prefix: &str) -> Result<usize, StoreError>;
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One JSON document per key in a directory.
pub struct FsCacheStore {
    dir: PathBuf,
}

impl FsCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn read_entry(&self, path: &Path, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(path)(e)),
        };
        let entry: CacheEntry = serde_json::from_str(&content).map_err(|source| StoreError::CacheEntry {
            key: key.to_string(),
            source,
        })?;

        if entry.is_expired(unix_now()) {
            tracing::trace!(key = %key, "Cache entry expired");
            let _ = fs::remove_file(path);
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_error(&self.dir)(e)),
        };
        let mut keys: Vec<String> = entries
            .flatten()
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_suffix(".json"))
                    .map(str::to_string)
            })
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }
}

impl CacheStore for FsCacheStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.entry_path(key)?;
        Ok(self.read_entry(&path, key)?.map(|entry| entry.value))
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(&self.dir).map_err(Self::io_error(&self.dir))?;

        let entry = CacheEntry {
            key: key.to_string(),
            value,
            expires_at: ttl.map(|ttl| unix_now() + ttl.as_secs()),
        };
        let content = serde_json::to_string_pretty(&entry).map_err(|source| StoreError::CacheEntry {
            key: key.to_string(),
            source,
        })?;
        fs::write(&path, content).map_err(Self::io_error(&path))?;
        tracing::trace!(key = %key, "Cache entry stored");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_error(&path)(e)),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<CacheEntry>, StoreError> {
        let mut entries = Vec::new();
        for key in self.keys()?.into_iter().filter(|key| key.starts_with(prefix)) {
            let path = self.entry_path(&key)?;
            match self.read_entry(&path, &key) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(e) => tracing::warn!(key = %key, error = %e, "Skipping unreadable cache entry"),
            }
        }
        Ok(entries)
    }

    fn clear(&self, prefix: &str) -> Result<usize, StoreError> {
        let mut removed = 0;
        for key in self.keys()?.into_iter().filter(|key| key.starts_with(prefix)) {
            if self.delete(&key)? {
                removed += 1;
            }
        }
        tracing::debug!(prefix = %prefix, removed, "Cache cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsCacheStore::new(dir.path().join("cache"));

        assert_eq!(cache.get("tstats_x").unwrap(), None);
        cache.set("tstats_x", json!({"a": 1}), None).unwrap();
        assert_eq!(cache.get("tstats_x").unwrap(), Some(json!({"a": 1})));
        assert!(cache.delete("tstats_x").unwrap());
        assert!(!cache.delete("tstats_x").unwrap());
    }

    #[test]
    fn expired_entries_are_gone() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsCacheStore::new(dir.path());
        cache.set("tstats_old", json!(1), Some(Duration::ZERO)).unwrap();
        cache.set("tstats_new", json!(2), Some(Duration::from_secs(3600))).unwrap();

        assert_eq!(cache.get("tstats_old").unwrap(), None);
        let keys: Vec<_> = cache.list(KEY_PREFIX).unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["tstats_new"]);
    }

    #[test]
    fn list_and_clear_respect_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsCacheStore::new(dir.path());
        cache.set(&update_key("akismet", "pt_PT"), json!(true), None).unwrap();
        cache.set(&update_key("jetpack", "pt_PT"), json!(true), None).unwrap();
        cache.set("other_key", json!(true), None).unwrap();

        let listed = cache.list(KEY_PREFIX).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, "tstats_update_akismet_pt_PT");

        assert_eq!(cache.clear(KEY_PREFIX).unwrap(), 2);
        assert!(cache.list(KEY_PREFIX).unwrap().is_empty());
        assert_eq!(cache.get("other_key").unwrap(), Some(json!(true)));
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsCacheStore::new(dir.path());
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(cache.get(key), Err(StoreError::InvalidKey(_))), "{key:?}");
        }
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsCacheStore::new(dir.path().join("nope"));
        assert!(cache.list(KEY_PREFIX).unwrap().is_empty());
        assert_eq!(cache.clear(KEY_PREFIX).unwrap(), 0);
    }
}
