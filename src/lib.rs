//! Prefix router for a pluggable secrets store.
//!
//! Maps each logical request to the backend mounted at the longest matching
//! prefix, keeping mounts from nesting, gating torn-down mounts, salting
//! client tokens per mount and classifying root and login paths.

pub mod config;
pub mod logical;
pub mod metrics;
pub mod physical;
pub mod router;

pub use config::Config;
pub use logical::{Backend, Connection, Operation, Paths, Request, Response};
pub use physical::{InmemStorage, Storage, StorageView};
pub use router::{Router, RouterError, RouterResult};
