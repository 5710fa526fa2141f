// src/cache/mod.rs
//! Namespaced key/value cache for fetched content.
//!
//! The cache only ever holds validated domain values, serialized as JSON.
//! Reads re-check every value before handing it out, so a corrupt or stale
//! entry behaves like a miss, while a store that cannot be read at all fails
//! the read. Writes never fail from the caller's point of view.

mod disk;
pub mod keys;
mod memory;

pub use disk::FileCache;
pub use memory::MemoryCache;

use crate::config::RuntimeMode;
use crate::error::AppError;
use crate::model::{GroupedBlock, MediaItem, Post, PostListItem};
use crate::types::ValidationError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// A store of JSON values addressed by `(namespace, key)`.
#[async_trait]
pub trait ContentCache: Send + Sync {
    /// `Ok(None)` on a miss. `Err` only when the store itself could not be read.
    async fn get(&self, key: &str, namespace: &str) -> Result<Option<Value>, AppError>;

    /// Stores `value`, replacing any previous entry. Failures are logged, not returned.
    async fn set(&self, key: &str, value: &Value, namespace: &str);
}

/// A cache that does nothing. Used outside development.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

#[async_trait]
impl ContentCache for NoCache {
    async fn get(&self, _key: &str, _namespace: &str) -> Result<Option<Value>, AppError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &Value, _namespace: &str) {}
}

/// Passes reads and writes through to `inner` only in development mode.
pub struct DevOnlyCache {
    inner: Arc<dyn ContentCache>,
    mode: RuntimeMode,
}

impl DevOnlyCache {
    pub fn new(inner: Arc<dyn ContentCache>, mode: RuntimeMode) -> Self {
        Self { inner, mode }
    }
}

#[async_trait]
impl ContentCache for DevOnlyCache {
    async fn get(&self, key: &str, namespace: &str) -> Result<Option<Value>, AppError> {
        if !self.mode.uses_cache() {
            return Ok(None);
        }
        self.inner.get(key, namespace).await
    }

    async fn set(&self, key: &str, value: &Value, namespace: &str) {
        if self.mode.uses_cache() {
            self.inner.set(key, value, namespace).await;
        }
    }
}

/// A value that may be stored in the cache and must be re-validated on the way out.
pub trait CacheRecord: Serialize + DeserializeOwned {
    fn check(&self) -> Result<(), ValidationError>;
}

impl CacheRecord for PostListItem {
    fn check(&self) -> Result<(), ValidationError> {
        self.validate()
    }
}

impl CacheRecord for Post {
    fn check(&self) -> Result<(), ValidationError> {
        self.validate()
    }
}

impl CacheRecord for MediaItem {
    fn check(&self) -> Result<(), ValidationError> {
        self.validate()
    }
}

impl CacheRecord for GroupedBlock {
    fn check(&self) -> Result<(), ValidationError> {
        self.validate()
    }
}

impl<T: CacheRecord> CacheRecord for Vec<T> {
    fn check(&self) -> Result<(), ValidationError> {
        self.iter().try_for_each(CacheRecord::check)
    }
}

/// Reads and re-validates a cached value.
///
/// A store that cannot be read is an error. An entry that does not
/// deserialize or fails its invariants is a miss.
pub async fn read_cached<T: CacheRecord>(
    cache: &dyn ContentCache,
    key: &str,
    namespace: &str,
) -> Result<Option<T>, AppError> {
    let Some(value) = cache.get(key, namespace).await? else {
        log::debug!("Cache miss: {}/{}", namespace, key);
        return Ok(None);
    };

    let record = match serde_json::from_value::<T>(value) {
        Ok(record) => record,
        Err(e) => {
            log::warn!("Discarding unreadable cache entry {}/{}: {}", namespace, key, e);
            return Ok(None);
        }
    };
    if let Err(e) = record.check() {
        log::warn!("Discarding invalid cache entry {}/{}: {}", namespace, key, e);
        return Ok(None);
    }

    log::debug!("Cache hit: {}/{}", namespace, key);
    Ok(Some(record))
}

pub async fn write_cached<T: CacheRecord>(
    cache: &dyn ContentCache,
    key: &str,
    namespace: &str,
    record: &T,
) {
    match serde_json::to_value(record) {
        Ok(value) => cache.set(key, &value, namespace).await,
        Err(e) => log::warn!("Could not serialize {}/{} for the cache: {}", namespace, key, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn item(slug: &str) -> PostListItem {
        PostListItem {
            id: "id".to_string(),
            slug: slug.to_string(),
            title: "Title".to_string(),
            description: None,
            first_published: "2024-01-01".to_string(),
            featured_image: None,
            feed_id: None,
        }
    }

    #[tokio::test]
    async fn gate_disables_the_cache_outside_development() {
        let backing = Arc::new(MemoryCache::new());
        backing.set("k", &json!(1), "ns").await;

        let production = DevOnlyCache::new(backing.clone(), RuntimeMode::Production);
        assert_eq!(production.get("k", "ns").await.unwrap(), None);
        production.set("other", &json!(2), "ns").await;
        assert_eq!(backing.get("other", "ns").await.unwrap(), None);

        let development = DevOnlyCache::new(backing.clone(), RuntimeMode::Development);
        assert_eq!(development.get("k", "ns").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn records_round_trip_through_the_cache() {
        let cache = MemoryCache::new();
        let items = vec![item("a"), item("b")];
        write_cached(&cache, "all", "posts", &items).await;

        let back: Option<Vec<PostListItem>> = read_cached(&cache, "all", "posts").await.unwrap();
        assert_eq!(back, Some(items));
    }

    #[tokio::test]
    async fn invalid_entries_read_as_misses() {
        let cache = MemoryCache::new();
        cache.set("wrong-shape", &json!({"nope": true}), "posts").await;
        write_cached(&cache, "bad-date", "posts", &vec![item("a")]).await;
        let mut stale = serde_json::to_value(vec![item("a")]).unwrap();
        stale[0]["firstPublished"] = json!("yesterday");
        cache.set("bad-date", &stale, "posts").await;

        assert_eq!(
            read_cached::<Vec<PostListItem>>(&cache, "wrong-shape", "posts")
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            read_cached::<Vec<PostListItem>>(&cache, "bad-date", "posts")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn corrupt_block_trees_read_as_misses() {
        let cache = MemoryCache::new();
        cache
            .set(
                "blocks",
                &json!([
                    {"type": "image", "id": "i", "url": "ftp://evil/x.png", "alt": "", "caption": []},
                    {"type": "bulleted_list", "items": []}
                ]),
                "posts",
            )
            .await;

        assert_eq!(
            read_cached::<Vec<GroupedBlock>>(&cache, "blocks", "posts")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn posts_with_corrupt_blocks_read_as_misses() {
        let cache = MemoryCache::new();
        let mut post = Post::new(item("a"), "2024-06-01T12:00:00Z".parse().unwrap());
        post.blocks = vec![GroupedBlock::list(
            crate::model::ListKind::Numbered,
            vec![crate::model::TextBlock {
                id: "n1".to_string(),
                rich_text: vec![],
            }],
        )];
        write_cached(&cache, "a", "post", &post).await;
        assert_eq!(
            read_cached::<Post>(&cache, "a", "post").await.unwrap(),
            Some(post.clone())
        );

        let mut corrupt = serde_json::to_value(&post).unwrap();
        corrupt["blocks"][0]["items"] = json!([]);
        cache.set("a", &corrupt, "post").await;
        assert_eq!(read_cached::<Post>(&cache, "a", "post").await.unwrap(), None);
    }
}
