//! # relgraph model
//!
//! The data model for the relgraph hypermedia client: resources linked
//! by typed relations, discovered rather than hard-coded.
//!
//! This crate provides:
//! - `Uri`: resource identity
//! - `Link` and `RelationMatcher`: typed pointers and relation selectors
//! - `Representation`: the JSON wire document (`links`, `items`,
//!   flattened attributes)
//! - `Resource`: the shared mutable in-cache node, keyed by `NodeKey`
//!
//! Everything here is a pure data shape plus identity lookup; network
//! access and state tracking live in `relgraph_cache`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod link;
mod representation;
mod resource;
mod uri;

pub use link::{Link, RelationMatcher, SELF_REL};
pub use representation::Representation;
pub use resource::{NodeKey, Resource};
pub use uri::Uri;
