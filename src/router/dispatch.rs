use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::logical::{Connection, Request};
use crate::physical::Storage;

/// Request fields as the backend should see them.
pub(crate) struct DispatchState {
    pub path: String,
    pub storage: Arc<dyn Storage>,
    pub client_token: String,
    pub keep_connection: bool,
}

/// Scoped mutation of a request for the duration of a backend call.
///
/// The caller's path, token and connection are put back on drop, and the
/// storage handle is cleared, whether the backend succeeded, failed,
/// panicked or the dispatch future was dropped.
pub(crate) struct DispatchGuard<'r> {
    req: &'r mut Request,
    saved_path: String,
    saved_token: String,
    saved_connection: Option<Connection>,
}

impl<'r> DispatchGuard<'r> {
    pub(crate) fn apply(req: &'r mut Request, state: DispatchState) -> Self {
        let saved_path = mem::replace(&mut req.path, state.path);
        let saved_token = mem::replace(&mut req.client_token, state.client_token);
        let saved_connection =
            if state.keep_connection { req.connection.clone() } else { req.connection.take() };
        req.storage = Some(state.storage);

        Self { req, saved_path, saved_token, saved_connection }
    }
}

impl Deref for DispatchGuard<'_> {
    type Target = Request;

    fn deref(&self) -> &Request {
        &*self.req
    }
}

impl DerefMut for DispatchGuard<'_> {
    fn deref_mut(&mut self) -> &mut Request {
        &mut *self.req
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.req.path = mem::take(&mut self.saved_path);
        self.req.client_token = mem::take(&mut self.saved_token);
        self.req.connection = self.saved_connection.take();
        self.req.storage = None;
    }
}
