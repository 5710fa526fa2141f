// src/cache/disk.rs
//! File-backed cache: one JSON file per key under a directory per namespace.

use super::keys::sanitize;
use super::ContentCache;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// What is written to disk. There is no expiry; the next successful fetch
/// overwrites the entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    cached_at: DateTime<Utc>,
    data: Value,
}

pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$XDG_CACHE_HOME/notion-content`, falling back to `~/.cache`.
    pub fn default_dir() -> PathBuf {
        std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".cache")
            })
            .join("notion-content")
    }

    fn entry_path(&self, key: &str, namespace: &str) -> PathBuf {
        self.root
            .join(sanitize(namespace))
            .join(format!("{}.json", sanitize(key)))
    }

    async fn write_entry(&self, path: &Path, entry: &CacheEntry) -> Result<(), AppError> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_vec(entry)?;

        // Write beside the target and rename so readers never see a torn file.
        let tmp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl ContentCache for FileCache {
    async fn get(&self, key: &str, namespace: &str) -> Result<Option<Value>, AppError> {
        let path = self.entry_path(key, namespace);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Cache {
                    message: format!("{}: {}", path.display(), e),
                })
            }
        };

        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) => Ok(Some(entry.data)),
            Err(e) => {
                log::warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &Value, namespace: &str) {
        let path = self.entry_path(key, namespace);
        let entry = CacheEntry {
            cached_at: Utc::now(),
            data: value.clone(),
        };
        if let Err(e) = self.write_entry(&path, &entry).await {
            log::warn!("Cache write to {} failed: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn stores_entries_per_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());

        cache.set("my post", &json!({"slug": "my-post"}), "post").await;

        let path = dir.path().join("post").join("my_post.json");
        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["data"], json!({"slug": "my-post"}));
        assert!(on_disk["cachedAt"].is_string());

        assert_eq!(
            cache.get("my post", "post").await.unwrap(),
            Some(json!({"slug": "my-post"}))
        );
        assert_eq!(cache.get("my post", "posts").await.unwrap(), None);
    }

    #[tokio::test]
    async fn later_writes_replace_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());

        cache.set("k", &json!(1), "ns").await;
        cache.set("k", &json!(2), "ns").await;

        assert_eq!(cache.get("k", "ns").await.unwrap(), Some(json!(2)));
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("ns"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn corrupt_files_read_as_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        std::fs::create_dir_all(dir.path().join("ns")).unwrap();
        std::fs::write(dir.path().join("ns").join("k.json"), "{not json").unwrap();

        assert_eq!(cache.get("k", "ns").await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_failures_are_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the namespace directory should be.
        std::fs::write(dir.path().join("ns"), "occupied").unwrap();
        let cache = FileCache::new(dir.path());

        cache.set("k", &json!(1), "ns").await;
        assert!(cache.get("k", "ns").await.is_err());
    }
}
