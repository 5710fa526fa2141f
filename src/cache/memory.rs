use super::ContentCache;
use crate::error::AppError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

/// Process-local cache. Concurrent writers to one key: last one wins.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<(String, String), Value>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ContentCache for MemoryCache {
    async fn get(&self, key: &str, namespace: &str) -> Result<Option<Value>, AppError> {
        Ok(self
            .entries
            .get(&(namespace.to_string(), key.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &Value, namespace: &str) {
        self.entries
            .insert((namespace.to_string(), key.to_string()), value.clone());
    }
}
