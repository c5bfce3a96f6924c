use sha1::{Digest, Sha1};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::logical::Backend;
use crate::physical::Storage;

use super::path_matcher::PathMatcher;

/// Fresh random salt for a new mount.
pub fn generate_salt() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A backend registered at a prefix.
pub struct MountEntry {
    salt: String,
    backend: Arc<dyn Backend>,
    view: Arc<dyn Storage>,
    tainted: AtomicBool,
    root_paths: PathMatcher,
    login_paths: PathMatcher,
}

impl MountEntry {
    /// Builds the entry, deriving the special path matchers once from the
    /// backend's declaration.
    pub fn new(backend: Arc<dyn Backend>, salt: impl Into<String>, view: Arc<dyn Storage>) -> Self {
        let paths = backend.special_paths().unwrap_or_default();
        Self {
            salt: salt.into(),
            root_paths: PathMatcher::new(&paths.root),
            login_paths: PathMatcher::new(&paths.unauthenticated),
            backend,
            view,
            tainted: AtomicBool::new(false),
        }
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn view(&self) -> &Arc<dyn Storage> {
        &self.view
    }

    pub fn root_paths(&self) -> &PathMatcher {
        &self.root_paths
    }

    pub fn login_paths(&self) -> &PathMatcher {
        &self.login_paths
    }

    pub fn is_tainted(&self) -> bool {
        self.tainted.load(Ordering::Acquire)
    }

    pub(crate) fn set_tainted(&self, tainted: bool) {
        self.tainted.store(tainted, Ordering::Release);
    }

    /// Hex SHA-1 of `salt + id`. Not reversible, and differs per mount.
    pub fn salt_id(&self, id: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(id.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Debug for MountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountEntry")
            .field("tainted", &self.is_tainted())
            .field("root_paths", &self.root_paths.len())
            .field("login_paths", &self.login_paths.len())
            .finish_non_exhaustive()
    }
}
