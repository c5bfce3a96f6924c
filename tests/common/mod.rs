// Shared helpers for router integration tests.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use vault_router::physical::InmemStorage;
use vault_router::{Backend, Connection, Operation, Paths, Request, Response, StorageView};

/// What a backend observed for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
    pub operation: Operation,
    pub path: String,
    pub client_token: String,
    pub connection: Option<Connection>,
    pub has_storage: bool,
}

/// Backend that records every request it receives and persists writes
/// through the attached storage view.
#[derive(Default)]
pub struct RecordingBackend {
    paths: Option<Paths>,
    fail_with: Option<String>,
    seen: Mutex<Vec<Observed>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paths(root: &[&str], unauthenticated: &[&str]) -> Self {
        Self {
            paths: Some(Paths {
                root: root.iter().map(|p| p.to_string()).collect(),
                unauthenticated: unauthenticated.iter().map(|p| p.to_string()).collect(),
            }),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self { fail_with: Some(message.to_string()), ..Self::default() }
    }

    pub fn seen(&self) -> Vec<Observed> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Observed {
        self.seen().pop().expect("backend was never called")
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn handle_request(&self, req: &mut Request) -> Result<Response> {
        self.seen.lock().unwrap().push(Observed {
            operation: req.operation,
            path: req.path.clone(),
            client_token: req.client_token.clone(),
            connection: req.connection.clone(),
            has_storage: req.storage.is_some(),
        });

        if let Some(message) = &self.fail_with {
            anyhow::bail!("{}", message);
        }

        if req.operation == Operation::Write
            && let Some(storage) = &req.storage
        {
            let body = serde_json::to_vec(&req.data)?;
            storage.put(&req.path, body).await?;
        }

        Ok(Response::with_data("path", req.path.clone().into()))
    }

    fn special_paths(&self) -> Option<Paths> {
        self.paths.clone()
    }
}

/// A view scoped to one mount's namespace on a shared physical store.
pub fn mount_view(physical: &Arc<InmemStorage>, mount_id: &str) -> Arc<StorageView> {
    Arc::new(StorageView::new(physical.clone(), format!("logical/{}/", mount_id)))
}

pub fn sha1_hex(input: &str) -> String {
    use sha1::{Digest, Sha1};
    hex::encode(Sha1::digest(input.as_bytes()))
}
