//! Storage handles attached to requests at dispatch time.
//!
//! The router never reads or writes through these; it only hands each
//! backend the view scoped to its own mount.

pub mod error;
pub mod inmem;
pub mod view;

use async_trait::async_trait;
#[cfg(any(test, feature = "mockall"))]
use mockall::automock;

pub use error::{StorageError, StorageResult};
pub use inmem::InmemStorage;
pub use view::StorageView;

/// Key/value storage addressed by slash-separated keys.
#[cfg_attr(any(test, feature = "mockall"), automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    async fn put(&self, key: &str, value: Vec<u8>) -> StorageResult<()>;
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Immediate children of `prefix`. Sub-directories keep their trailing `/`.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;
}
