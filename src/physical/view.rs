use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::{Storage, StorageError, StorageResult};

/// A view over another storage that confines every key to a prefix.
///
/// Each mount gets its own view so a backend can only see its namespace.
#[derive(Clone)]
pub struct StorageView {
    inner: Arc<dyn Storage>,
    prefix: String,
}

impl StorageView {
    pub fn new(inner: Arc<dyn Storage>, prefix: impl Into<String>) -> Self {
        Self { inner, prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Narrow this view further.
    pub fn sub_view(&self, prefix: &str) -> Self {
        Self { inner: Arc::clone(&self.inner), prefix: format!("{}{}", self.prefix, prefix) }
    }

    fn expand_key(&self, key: &str) -> StorageResult<String> {
        if key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(format!("{}{}", self.prefix, key))
    }
}

impl fmt::Debug for StorageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageView").field("prefix", &self.prefix).finish()
    }
}

#[async_trait]
impl Storage for StorageView {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(&self.expand_key(key)?).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.inner.put(&self.expand_key(key)?, value).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(&self.expand_key(key)?).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        // Children are already relative to the expanded prefix.
        self.inner.list(&self.expand_key(prefix)?).await
    }
}
