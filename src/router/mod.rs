//! Prefix-based routing of logical requests to mounted backends.
//!
//! The mount table sits behind a single reader/writer lock. Lookups hold the
//! read lock only while consulting the table; backends are always invoked
//! with no lock held, so a request already dispatched to a mount finishes
//! against that entry even if the mount is removed or tainted meanwhile.

pub mod dispatch;
pub mod entry;
pub mod error;
pub mod mount_table;
pub mod path_matcher;
pub mod prefix_map;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::RouterConfig;
use crate::logical::{Backend, Request, Response};
use crate::metrics::RouterMetrics;
use crate::physical::Storage;

use dispatch::{DispatchGuard, DispatchState};

pub use entry::{MountEntry, generate_salt};
pub use error::{RouterError, RouterResult};
pub use mount_table::MountTable;
pub use path_matcher::{MatchMode, PathMatcher, PatternMatch};

/// Requests under this prefix reach the token backend with raw tokens.
pub const TOKEN_BACKEND_PREFIX: &str = "auth/token/";

/// Summary of a registered mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub path: String,
    pub salt: String,
    pub tainted: bool,
}

/// Routes requests to the backend mounted at the longest matching prefix.
pub struct Router {
    table: RwLock<MountTable>,
    token_prefix: String,
    metrics: Option<RouterMetrics>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("token_prefix", &self.token_prefix)
            .field("mounts", &self.read_table().len())
            .finish()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(MountTable::new()),
            token_prefix: TOKEN_BACKEND_PREFIX.to_string(),
            metrics: None,
        }
    }

    pub fn with_metrics(metrics: RouterMetrics) -> Self {
        Self { metrics: Some(metrics), ..Self::new() }
    }

    /// Router honoring `config`, which is validated first: an empty token
    /// prefix would let every token through unsalted.
    pub fn with_config(
        config: &RouterConfig,
        metrics: Option<RouterMetrics>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            table: RwLock::new(MountTable::new()),
            token_prefix: config.token_backend_prefix.clone(),
            metrics,
        })
    }

    // Table mutations cannot leave it half-updated, so a poisoned lock is
    // still safe to use.
    fn read_table(&self) -> RwLockReadGuard<'_, MountTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_table(&self) -> RwLockWriteGuard<'_, MountTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Owning mount prefix and a snapshot of its entry.
    fn resolve(&self, path: &str) -> Option<(String, Arc<MountEntry>)> {
        let table = self.read_table();
        table.longest_prefix(path).map(|(prefix, entry)| (prefix.to_string(), Arc::clone(entry)))
    }

    /// Expose `backend` at `prefix`, salting tokens with `salt` and handing
    /// requests `view` as their storage.
    pub fn mount(
        &self,
        backend: Arc<dyn Backend>,
        prefix: &str,
        salt: &str,
        view: Arc<dyn Storage>,
    ) -> RouterResult<()> {
        let entry = Arc::new(MountEntry::new(backend, salt, view));

        let mut table = self.write_table();
        table.check_conflict(prefix)?;
        table.insert(prefix, entry);

        info!(prefix = %prefix, "Mounted backend");
        Ok(())
    }

    /// Remove the mount at exactly `prefix`. Absent prefixes are not an error.
    pub fn unmount(&self, prefix: &str) -> RouterResult<()> {
        let removed = self.write_table().delete(prefix).is_some();
        if removed {
            info!(prefix = %prefix, "Unmounted backend");
        } else {
            debug!(prefix = %prefix, "Unmount of absent prefix ignored");
        }
        Ok(())
    }

    /// Move the mount at `src` to `dst`, keeping its salt, backend, view and
    /// taint status.
    pub fn remount(&self, src: &str, dst: &str) -> RouterResult<()> {
        let mut table = self.write_table();

        let entry =
            table.delete(src).ok_or_else(|| RouterError::NoMount { path: src.to_string() })?;
        if let Err(err) = table.check_conflict(dst) {
            table.insert(src, entry);
            return Err(err);
        }
        table.insert(dst, entry);

        info!(src = %src, dst = %dst, "Remounted backend");
        Ok(())
    }

    /// Mark the mount owning `path` as being torn down. Only revoke and
    /// rollback requests reach it afterwards.
    pub fn taint(&self, path: &str) -> RouterResult<()> {
        self.set_tainted(path, true);
        Ok(())
    }

    pub fn untaint(&self, path: &str) -> RouterResult<()> {
        self.set_tainted(path, false);
        Ok(())
    }

    fn set_tainted(&self, path: &str, tainted: bool) {
        let table = self.write_table();
        match table.longest_prefix(path) {
            Some((prefix, entry)) => {
                entry.set_tainted(tainted);
                info!(prefix = %prefix, tainted, "Updated mount taint");
            }
            None => debug!(path = %path, tainted, "No mount to update taint for"),
        }
    }

    pub fn is_tainted(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|(_, entry)| entry.is_tainted())
    }

    /// Prefix of the mount that would serve `path`, or an empty string.
    pub fn matching_mount(&self, path: &str) -> String {
        self.resolve(path).map(|(prefix, _)| prefix).unwrap_or_default()
    }

    /// Storage view of the mount that would serve `path`.
    pub fn matching_view(&self, path: &str) -> Option<Arc<dyn Storage>> {
        self.resolve(path).map(|(_, entry)| Arc::clone(entry.view()))
    }

    pub fn mounts(&self) -> Vec<MountInfo> {
        self.read_table()
            .iter()
            .map(|(path, entry)| MountInfo {
                path: path.to_string(),
                salt: entry.salt().to_string(),
                tainted: entry.is_tainted(),
            })
            .collect()
    }

    /// Whether `path` requires root privileges on its mount.
    pub fn root_path(&self, path: &str) -> bool {
        self.classify(path, |entry, rest| entry.root_paths().matches_dir(rest))
    }

    /// Whether `path` is reachable without an established identity.
    pub fn login_path(&self, path: &str) -> bool {
        self.classify(path, |entry, rest| entry.login_paths().matches(rest))
    }

    fn classify(&self, path: &str, check: impl Fn(&MountEntry, &str) -> bool) -> bool {
        let Some((prefix, entry)) = self.resolve(path) else {
            return false;
        };
        check(&entry, &path[prefix.len()..])
    }

    /// Dispatch `req` to its backend.
    ///
    /// The backend sees the path relative to its mount, its own storage view,
    /// a per-mount digest of the client token (raw only for the token
    /// backend) and connection metadata only on login paths. All of it is
    /// undone before this returns.
    pub async fn route(&self, req: &mut Request) -> RouterResult<Response> {
        // "foo" at the root level means "foo/".
        let path = if req.path.contains('/') { req.path.clone() } else { format!("{}/", req.path) };

        let (mount, entry) =
            self.resolve(&path).ok_or_else(|| RouterError::NoRoute { path: path.clone() })?;
        let started = Instant::now();

        if entry.is_tainted() && !req.operation.allowed_when_tainted() {
            warn!(operation = %req.operation, mount = %mount, "Rejected request to tainted mount");
            if let Some(metrics) = &self.metrics {
                metrics.record_route(req.operation.as_str(), &mount, started.elapsed(), false);
            }
            return Err(RouterError::NoRoute { path });
        }

        let remaining = &path[mount.len()..];
        let login = entry.login_paths().matches(remaining);
        let relative = if remaining == "/" { String::new() } else { remaining.to_string() };

        let client_token = if path.starts_with(&self.token_prefix) {
            req.client_token.clone()
        } else {
            entry.salt_id(&req.client_token)
        };

        debug!(operation = %req.operation, mount = %mount, login, "Routing request");

        let operation = req.operation;
        let result = {
            let mut guard = DispatchGuard::apply(
                req,
                DispatchState {
                    path: relative,
                    storage: Arc::clone(entry.view()),
                    client_token,
                    keep_connection: login,
                },
            );
            entry.backend().handle_request(&mut guard).await
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_route(operation.as_str(), &mount, started.elapsed(), result.is_ok());
        }

        result.map_err(RouterError::Backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::{MockBackend, Operation, Paths};
    use crate::physical::InmemStorage;

    fn noop_backend() -> Arc<dyn Backend> {
        let mut backend = MockBackend::new();
        backend.expect_special_paths().return_const(None::<Paths>);
        Arc::new(backend)
    }

    fn storage() -> Arc<dyn Storage> {
        Arc::new(InmemStorage::new())
    }

    #[test]
    fn test_mount_and_matching_mount() {
        let router = Router::new();
        router.mount(noop_backend(), "secret/", "salt", storage()).unwrap();

        assert_eq!(router.matching_mount("secret/foo"), "secret/");
        assert_eq!(router.matching_mount("sys/foo"), "");
        assert!(router.matching_view("secret/foo").is_some());
        assert!(router.matching_view("sys/foo").is_none());
    }

    #[test]
    fn test_mount_rejects_nesting_both_ways() {
        let router = Router::new();
        router.mount(noop_backend(), "secret/", "a", storage()).unwrap();

        let err = router.mount(noop_backend(), "secret/nested/", "b", storage()).unwrap_err();
        assert!(matches!(err, RouterError::NestedMount { .. }));

        let err = router.mount(noop_backend(), "secret/", "b", storage()).unwrap_err();
        assert!(err.is_nested_mount());

        let err = router.mount(noop_backend(), "sec", "b", storage()).unwrap_err();
        assert!(matches!(err, RouterError::NestedUnder { .. }));

        assert_eq!(router.mounts().len(), 1);
    }

    #[test]
    fn test_unmount_absent_is_ok() {
        let router = Router::new();
        assert!(router.unmount("nothing/").is_ok());

        router.mount(noop_backend(), "secret/", "salt", storage()).unwrap();
        router.unmount("secret/").unwrap();
        assert_eq!(router.matching_mount("secret/foo"), "");
    }

    #[test]
    fn test_unmount_requires_exact_prefix() {
        let router = Router::new();
        router.mount(noop_backend(), "secret/", "salt", storage()).unwrap();
        router.unmount("secret/foo").unwrap();
        assert_eq!(router.matching_mount("secret/foo"), "secret/");
    }

    #[test]
    fn test_remount_missing_source() {
        let router = Router::new();
        let err = router.remount("old/", "new/").unwrap_err();
        assert_eq!(err.to_string(), "no mount at 'old/'");
    }

    #[test]
    fn test_remount_into_conflict_keeps_source() {
        let router = Router::new();
        router.mount(noop_backend(), "a/", "salt-a", storage()).unwrap();
        router.mount(noop_backend(), "b/", "salt-b", storage()).unwrap();

        let err = router.remount("a/", "b/inner/").unwrap_err();
        assert!(err.is_nested_mount());
        assert_eq!(router.matching_mount("a/x"), "a/");
    }

    #[test]
    fn test_remount_to_nested_self_path() {
        let router = Router::new();
        router.mount(noop_backend(), "a/", "salt", storage()).unwrap();
        router.remount("a/", "a/b/").unwrap();
        assert_eq!(router.matching_mount("a/b/c"), "a/b/");
        assert_eq!(router.matching_mount("a/c"), "");
    }

    #[test]
    fn test_taint_by_any_path_under_mount() {
        let router = Router::new();
        router.mount(noop_backend(), "secret/", "salt", storage()).unwrap();

        router.taint("secret/deep/path").unwrap();
        assert!(router.is_tainted("secret/"));
        assert!(router.mounts()[0].tainted);

        router.untaint("secret/other").unwrap();
        assert!(!router.is_tainted("secret/"));
    }

    #[test]
    fn test_taint_unmatched_is_noop() {
        let router = Router::new();
        assert!(router.taint("nowhere/").is_ok());
        assert!(router.untaint("nowhere/").is_ok());
        assert!(!router.is_tainted("nowhere/"));
    }

    #[test]
    fn test_root_and_login_paths_without_mount() {
        let router = Router::new();
        assert!(!router.root_path("bar/config"));
        assert!(!router.login_path("bar/login"));
    }

    #[test]
    fn test_with_config_token_prefix() {
        let config = RouterConfig { token_backend_prefix: "auth/tok/".to_string() };
        let router = Router::with_config(&config, None).unwrap();
        assert_eq!(router.token_prefix, "auth/tok/");
        assert_eq!(Router::new().token_prefix, TOKEN_BACKEND_PREFIX);
    }

    #[test]
    fn test_with_config_rejects_invalid_prefix() {
        let empty = RouterConfig { token_backend_prefix: String::new() };
        assert!(Router::with_config(&empty, None).is_err());

        let unterminated = RouterConfig { token_backend_prefix: "auth/token".to_string() };
        assert!(Router::with_config(&unterminated, None).is_err());
    }

    #[tokio::test]
    async fn test_tainted_rejection_records_metrics() {
        let mut backend = MockBackend::new();
        backend.expect_special_paths().return_const(None::<Paths>);
        backend.expect_handle_request().never();

        let registry = Arc::new(prometheus::Registry::new());
        let metrics = RouterMetrics::new(registry).unwrap();
        let router = Router::with_metrics(metrics.clone());
        router.mount(Arc::new(backend), "secret/", "salt", storage()).unwrap();
        router.taint("secret/").unwrap();

        let err = router.route(&mut Request::new(Operation::Read, "secret/x")).await.unwrap_err();
        assert!(err.is_no_route());
        assert_eq!(
            metrics.route_requests.with_label_values(&["read", "secret-", "error"]).get(),
            1.0
        );
        assert_eq!(
            metrics.route_duration.with_label_values(&["read", "secret-"]).get_sample_count(),
            1
        );
    }

    #[test]
    fn test_mount_reads_special_paths_before_conflict_check() {
        let router = Router::new();
        router.mount(noop_backend(), "secret/", "a", storage()).unwrap();

        let mut backend = MockBackend::new();
        backend.expect_special_paths().times(1).return_const(None::<Paths>);
        let err = router.mount(Arc::new(backend), "secret/", "b", storage()).unwrap_err();
        assert!(err.is_nested_mount());
        assert_eq!(router.mounts()[0].salt, "a");
    }

    #[tokio::test]
    async fn test_route_rewrites_path() {
        let mut backend = MockBackend::new();
        backend.expect_special_paths().return_const(None::<Paths>);
        backend
            .expect_handle_request()
            .withf(|req| req.path == "foo/bar" && req.storage.is_some())
            .times(1)
            .returning(|_| Ok(Response::default()));

        let router = Router::new();
        router.mount(Arc::new(backend), "secret/", "salt", storage()).unwrap();

        let mut req = Request::new(Operation::Read, "secret/foo/bar");
        router.route(&mut req).await.unwrap();
        assert_eq!(req.path, "secret/foo/bar");
        assert!(req.storage.is_none());
    }

    #[tokio::test]
    async fn test_route_mount_root_gets_empty_path() {
        let mut backend = MockBackend::new();
        backend.expect_special_paths().return_const(None::<Paths>);
        backend
            .expect_handle_request()
            .withf(|req| req.path.is_empty())
            .times(2)
            .returning(|_| Ok(Response::default()));

        let router = Router::new();
        router.mount(Arc::new(backend), "sys/", "salt", storage()).unwrap();

        let mut bare = Request::new(Operation::Read, "sys");
        router.route(&mut bare).await.unwrap();
        assert_eq!(bare.path, "sys");

        let mut slashed = Request::new(Operation::Read, "sys/");
        router.route(&mut slashed).await.unwrap();
    }

    #[tokio::test]
    async fn test_route_no_handler() {
        let router = Router::new();
        let mut req = Request::new(Operation::Read, "missing");
        let err = router.route(&mut req).await.unwrap_err();
        assert_eq!(err.to_string(), "no handler for route 'missing/'");
        assert_eq!(req.path, "missing");
    }

    #[tokio::test]
    async fn test_route_records_metrics() {
        let mut backend = MockBackend::new();
        backend.expect_special_paths().return_const(None::<Paths>);
        backend.expect_handle_request().returning(|_| Ok(Response::default()));

        let registry = Arc::new(prometheus::Registry::new());
        let metrics = RouterMetrics::new(registry).unwrap();
        let router = Router::with_metrics(metrics.clone());
        router.mount(Arc::new(backend), "secret/", "salt", storage()).unwrap();

        router.route(&mut Request::new(Operation::Write, "secret/x")).await.unwrap();
        assert_eq!(
            metrics.route_requests.with_label_values(&["write", "secret-", "ok"]).get(),
            1.0
        );
    }
}
