//! Collaborator abstraction for network access.

use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use relgraph_model::{Representation, Uri};
use std::collections::HashMap;
use std::fmt;

/// The mutation verb for a submit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Create a new resource under the target URI.
    Create,
    /// Replace the resource at the target URI.
    Update,
    /// Remove the resource at the target URI.
    Delete,
}

impl Method {
    /// Returns the lowercase verb name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Create => "create",
            Method::Update => "update",
            Method::Delete => "delete",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The external collaborator the cache talks to.
///
/// The cache consumes exactly two operations: fetch a representation
/// by URI, and submit a mutation. Everything else (controllers,
/// persistence, auth, timeouts) is the collaborator's concern. Once a
/// call is dispatched it runs to completion; the cache never cancels
/// an underlying operation.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetches the representation at `uri` (GET semantics).
    async fn fetch(&self, uri: &Uri) -> CacheResult<Representation>;

    /// Submits a mutation against `uri`, optionally carrying a body.
    ///
    /// Create and update may return the resulting representation;
    /// delete returns nothing.
    async fn submit(
        &self,
        uri: &Uri,
        method: Method,
        body: Option<&Representation>,
    ) -> CacheResult<Option<Representation>>;
}

/// A recorded submit call.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The target URI.
    pub uri: Uri,
    /// The verb used.
    pub method: Method,
    /// The body, if one was sent.
    pub body: Option<Representation>,
}

#[derive(Default)]
struct MockState {
    representations: HashMap<Uri, Representation>,
    failures: HashMap<Uri, CacheError>,
    fetch_counts: HashMap<Uri, u64>,
    submissions: Vec<Submission>,
}

/// A scripted client for tests.
///
/// Representations are served by URI; failures can be injected per
/// URI; every fetch and submit is recorded so tests can assert on
/// exact collaborator traffic.
#[derive(Default)]
pub struct MockClient {
    state: Mutex<MockState>,
}

impl MockClient {
    /// Creates an empty mock client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `representation` for fetches of `uri`.
    pub fn serve(&self, uri: impl Into<Uri>, representation: Representation) {
        self.state
            .lock()
            .representations
            .insert(uri.into(), representation);
    }

    /// Fails fetches and submits of `uri` with `error`.
    pub fn fail(&self, uri: impl Into<Uri>, error: CacheError) {
        self.state.lock().failures.insert(uri.into(), error);
    }

    /// Clears an injected failure.
    pub fn recover(&self, uri: &Uri) {
        self.state.lock().failures.remove(uri);
    }

    /// Number of fetches issued for `uri`.
    #[must_use]
    pub fn fetch_count(&self, uri: &Uri) -> u64 {
        self.state.lock().fetch_counts.get(uri).copied().unwrap_or(0)
    }

    /// Total number of fetches issued.
    #[must_use]
    pub fn total_fetches(&self) -> u64 {
        self.state.lock().fetch_counts.values().sum()
    }

    /// All recorded submit calls, in issue order.
    #[must_use]
    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().submissions.clone()
    }

    /// Recorded submit calls using `method`.
    #[must_use]
    pub fn submissions_with(&self, method: Method) -> Vec<Submission> {
        self.state
            .lock()
            .submissions
            .iter()
            .filter(|s| s.method == method)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ResourceClient for MockClient {
    async fn fetch(&self, uri: &Uri) -> CacheResult<Representation> {
        // Yield first so concurrent callers interleave the way a real
        // network client would.
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        *state.fetch_counts.entry(uri.clone()).or_insert(0) += 1;

        if let Some(error) = state.failures.get(uri) {
            return Err(error.clone());
        }
        state
            .representations
            .get(uri)
            .cloned()
            .ok_or_else(|| CacheError::not_found(uri.clone()))
    }

    async fn submit(
        &self,
        uri: &Uri,
        method: Method,
        body: Option<&Representation>,
    ) -> CacheResult<Option<Representation>> {
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        if let Some(error) = state.failures.get(uri) {
            return Err(error.clone());
        }
        state.submissions.push(Submission {
            uri: uri.clone(),
            method,
            body: body.cloned(),
        });

        match method {
            Method::Delete => Ok(None),
            Method::Create | Method::Update => Ok(body.cloned()),
        }
    }
}
