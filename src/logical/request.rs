use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::physical::Storage;

/// Kind of operation a request performs against a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Read,
    Write,
    Delete,
    List,
    Help,
    Revoke,
    Renew,
    Rollback,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::List => "list",
            Self::Help => "help",
            Self::Revoke => "revoke",
            Self::Renew => "renew",
            Self::Rollback => "rollback",
        }
    }

    /// Operations still admitted on a mount that is being torn down.
    pub fn allowed_when_tainted(&self) -> bool {
        matches!(self, Self::Revoke | Self::Rollback)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "delete" => Ok(Self::Delete),
            "list" => Ok(Self::List),
            "help" => Ok(Self::Help),
            "revoke" => Ok(Self::Revoke),
            "renew" => Ok(Self::Renew),
            "rollback" => Ok(Self::Rollback),
            _ => Err(format!("Invalid operation: {}", s)),
        }
    }
}

/// Metadata about the client connection a request arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Connection {
    pub remote_addr: String,
}

impl Connection {
    pub fn new(remote_addr: impl Into<String>) -> Self {
        Self { remote_addr: remote_addr.into() }
    }
}

/// A logical request travelling through the router.
///
/// The router only touches `path`, `client_token`, `storage` and `connection`,
/// and puts every one of them back before returning. `data` is passed through.
#[derive(Clone, Default)]
pub struct Request {
    pub operation: Operation,
    pub path: String,
    pub client_token: String,
    pub storage: Option<Arc<dyn Storage>>,
    pub connection: Option<Connection>,
    pub data: Map<String, Value>,
}

impl Request {
    pub fn new(operation: Operation, path: impl Into<String>) -> Self {
        Self { operation, path: path.into(), ..Default::default() }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.client_token = token.into();
        self
    }

    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

// Tokens never end up in logs through Debug.
impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("operation", &self.operation)
            .field("path", &self.path)
            .field("client_token", &if self.client_token.is_empty() { "" } else { "<redacted>" })
            .field("storage", &self.storage.as_ref().map(|_| "<view>"))
            .field("connection", &self.connection)
            .field("data", &self.data)
            .finish()
    }
}
