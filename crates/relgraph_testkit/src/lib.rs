//! # relgraph testkit
//!
//! Test utilities for relgraph.
//!
//! This crate provides:
//! - Fixtures: representation builders and preloaded cache sessions
//!   over a scripted mock collaborator
//! - Property-based generators using proptest
//! - Cross-crate integration scenarios
//!
//! ## Usage
//!
//! ```rust
//! use relgraph_testkit::prelude::*;
//! use relgraph_cache::{Defaults, QueryOptions};
//!
//! # async fn example() {
//! let session = TestSession::new();
//! session.serve(named_singleton("/todo/1", "groceries"));
//!
//! let node = session.cache.sparse_singleton("/todo/1", Defaults::new());
//! let resolved = session.cache.resolve(&node, QueryOptions::new()).await;
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use integration::*;
