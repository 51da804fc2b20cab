//! # relgraph cache
//!
//! The client-side resource graph engine for relgraph.
//!
//! This crate provides:
//! - State tracker (per-node hydration state machine, tracked-attribute
//!   ledger, in-flight fetch de-duplication)
//! - Identity-keyed cache store with a sparse-node factory
//! - Query dispatcher resolving navigation requests into a fixed set
//!   of fetch/traverse strategies
//! - Synchronizer reconciling a local collection against a canonical
//!   server-provided one
//!
//! ## Architecture
//!
//! A [`Cache`] session wraps a [`ResourceClient`] collaborator that
//! supplies exactly two operations: fetch a representation by URI and
//! submit a create/update/delete. Navigation goes through
//! [`Cache::resolve`]; reconciliation through [`Cache::sync`].
//!
//! ## Key invariants
//!
//! - One node (and one state entry) per distinct resource identity
//! - Hydration status only advances; deletion is terminal
//! - Hydration only adds data, never clobbering caller-set attributes
//! - At most one concurrent fetch per resource identity: concurrent
//!   callers join the in-flight operation and share its outcome

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod client;
mod config;
mod error;
mod query;
mod state;
mod store;
mod sync;

pub use cache::Cache;
pub use client::{Method, MockClient, ResourceClient, Submission};
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult, SyncFailure};
pub use query::{QueryOptions, QueryTarget, Resolved, Where};
pub use state::{SharedFetch, Slot, Status, Tracker, TrackerStats};
pub use store::{Defaults, Store};
pub use sync::{default_matcher, SyncReport};
