use anyhow::Result;
use async_trait::async_trait;
#[cfg(any(test, feature = "mockall"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

use super::{Request, Response};

/// Paths a backend wants treated specially.
///
/// A trailing `*` turns a pattern into a prefix match; otherwise it must
/// match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paths {
    /// Paths that require root privileges.
    #[serde(default)]
    pub root: Vec<String>,
    /// Paths reachable without an established identity.
    #[serde(default)]
    pub unauthenticated: Vec<String>,
}

/// A pluggable secrets backend.
///
/// Requests arrive with the mount prefix stripped from `path`, the mount's
/// storage view attached and (outside the token backend) a salted token.
#[cfg_attr(any(test, feature = "mockall"), automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    async fn handle_request(&self, req: &mut Request) -> Result<Response>;

    /// `None` means the backend declares no special paths.
    fn special_paths(&self) -> Option<Paths>;
}
