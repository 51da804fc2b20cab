//! Test fixtures and session helpers.
//!
//! Provides convenience builders for representations and preloaded
//! cache sessions over a scripted mock collaborator.

use relgraph_cache::{Cache, CacheConfig, MockClient};
use relgraph_model::{Representation, Uri};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_URI: AtomicU64 = AtomicU64::new(1);

/// Installs a `RUST_LOG`-filtered subscriber writing to the test
/// harness. Safe to call from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Returns a unique URI under the given prefix.
///
/// Each call increments a process-wide counter, so fixtures never
/// collide on identity across tests.
pub fn unique_uri(prefix: &str) -> Uri {
    let n = NEXT_URI.fetch_add(1, Ordering::Relaxed);
    Uri::new(format!("{}/{n}", prefix.trim_end_matches('/')))
}

/// Builds a singleton representation with a self link and a `name`.
pub fn named_singleton(uri: impl Into<Uri>, name: &str) -> Representation {
    Representation::singleton(uri.into()).with_attribute("name", name)
}

/// Builds a collection representation whose items are sparse entries
/// for the given URIs.
pub fn collection_of(uri: impl Into<Uri>, item_uris: &[&str]) -> Representation {
    Representation::collection(uri.into()).with_items(
        item_uris
            .iter()
            .map(|item| Representation::singleton(*item))
            .collect(),
    )
}

/// A cache session over a scripted mock collaborator.
pub struct TestSession {
    /// The cache under test.
    pub cache: Arc<Cache>,
    /// The collaborator, for scripting responses and asserting traffic.
    pub client: Arc<MockClient>,
}

impl TestSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a session with the given configuration.
    #[must_use]
    pub fn with_config(config: CacheConfig) -> Self {
        let client = Arc::new(MockClient::new());
        let cache = Arc::new(Cache::new(config, Arc::clone(&client) as _));
        Self { cache, client }
    }

    /// Scripts a representation to be served, keyed by its self URI.
    ///
    /// # Panics
    ///
    /// Panics if the representation has no self link.
    pub fn serve(&self, representation: Representation) -> &Self {
        let uri = representation
            .self_uri()
            .expect("fixture representation needs a self link")
            .clone();
        self.client.serve(uri, representation);
        self
    }
}

impl Default for TestSession {
    fn default() -> Self {
        Self::new()
    }
}
