//! Request vocabulary shared between the router and the backends it dispatches to.

pub mod backend;
pub mod request;
pub mod response;

pub use backend::{Backend, Paths};
pub use request::{Connection, Operation, Request};
pub use response::Response;

#[cfg(any(test, feature = "mockall"))]
pub use backend::MockBackend;
