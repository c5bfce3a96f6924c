use std::sync::Arc;

use super::entry::MountEntry;
use super::error::{RouterError, RouterResult};
use super::prefix_map::PrefixMap;

/// Registered mounts keyed by prefix.
///
/// Mounts never nest, so at most one prefix can ever match a given path;
/// longest-prefix lookup only guards that invariant.
#[derive(Debug, Default)]
pub struct MountTable {
    mounts: PrefixMap<Arc<MountEntry>>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, prefix: impl Into<String>, entry: Arc<MountEntry>) {
        self.mounts.insert(prefix, entry);
    }

    pub fn delete(&mut self, prefix: &str) -> Option<Arc<MountEntry>> {
        self.mounts.delete(prefix)
    }

    pub fn get(&self, prefix: &str) -> Option<&Arc<MountEntry>> {
        self.mounts.get(prefix)
    }

    pub fn longest_prefix(&self, path: &str) -> Option<(&str, &Arc<MountEntry>)> {
        self.mounts.longest_prefix(path)
    }

    /// Fails if `prefix` would sit under an existing mount or over one.
    pub fn check_conflict(&self, prefix: &str) -> RouterResult<()> {
        if let Some((existing, _)) = self.mounts.longest_prefix(prefix) {
            return Err(RouterError::NestedMount { existing: existing.to_string() });
        }
        if let Some((existing, _)) = self.mounts.first_with_prefix(prefix) {
            return Err(RouterError::NestedUnder { existing: existing.to_string() });
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<MountEntry>)> {
        self.mounts.iter()
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }
}
