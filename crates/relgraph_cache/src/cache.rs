//! The cache session object.

use crate::client::{Method, ResourceClient};
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::state::Tracker;
use crate::store::{Defaults, Store};
use relgraph_model::{Representation, Resource, Uri};
use std::sync::Arc;
use tracing::debug;

/// The client-side resource graph engine.
///
/// A `Cache` owns the identity registry, the state tracker, and the
/// collaborator handle. One instance is constructed at application or
/// session start and passed explicitly to whoever navigates the graph;
/// [`Cache::reset`] is the explicit teardown used between test cases
/// and at session end.
pub struct Cache {
    config: CacheConfig,
    client: Arc<dyn ResourceClient>,
    store: Store,
    tracker: Arc<Tracker>,
}

impl Cache {
    /// Creates a cache session over the given collaborator.
    #[must_use]
    pub fn new(config: CacheConfig, client: Arc<dyn ResourceClient>) -> Self {
        let tracker = Arc::new(Tracker::new());
        Self {
            config,
            client,
            store: Store::new(Arc::clone(&tracker)),
            tracker,
        }
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The collaborator used for fetches and submits.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn ResourceClient> {
        &self.client
    }

    /// The identity-keyed node registry.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The per-node state registry.
    #[must_use]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Builds (or returns) a location-only singleton for `uri`.
    pub fn sparse_singleton(&self, uri: impl Into<Uri>, defaults: Defaults) -> Resource {
        self.store.sparse_singleton(uri, defaults)
    }

    /// Builds (or returns) a location-only collection for `uri`.
    pub fn sparse_collection(&self, uri: impl Into<Uri>, defaults: Defaults) -> Resource {
        self.store.sparse_collection(uri, defaults)
    }

    /// Appends a sparse singleton for `uri` to the collection's items.
    pub fn add_item_by_uri(
        &self,
        collection: &Resource,
        uri: impl Into<Uri>,
        defaults: Defaults,
    ) -> Resource {
        self.store.add_item_by_uri(collection, uri, defaults)
    }

    /// Creates a resource under the collection through the collaborator
    /// and appends the resulting node to the collection's items.
    pub async fn create(
        &self,
        collection: &Resource,
        body: &Representation,
    ) -> CacheResult<Resource> {
        let uri = self.identity_of(collection)?;
        debug!(%uri, "create");
        let response = self
            .client
            .submit(&uri, Method::Create, Some(body))
            .await?;

        let representation = response.unwrap_or_else(|| body.clone());
        let node = self.store.materialize(&representation);
        let already_present = collection
            .items()
            .is_some_and(|items| items.iter().any(|i| i.same_node(&node)));
        if !already_present {
            collection.push_item(node.clone());
        }
        Ok(node)
    }

    /// Replaces the resource through the collaborator and mirrors the
    /// new attribute set onto the local node.
    pub async fn update(&self, node: &Resource, body: &Representation) -> CacheResult<()> {
        let uri = self.identity_of(node)?;
        debug!(%uri, "update");
        self.client.submit(&uri, Method::Update, Some(body)).await?;
        node.replace_attributes(body.attributes.clone());
        self.tracker.mark_hydrated(node, body);
        Ok(())
    }

    /// Deletes the resource through the collaborator and retires the
    /// local node. The node's state becomes terminal.
    pub async fn delete(&self, node: &Resource) -> CacheResult<()> {
        let uri = self.identity_of(node)?;
        debug!(%uri, "delete");
        self.client.submit(&uri, Method::Delete, None).await?;
        self.tracker.mark_deleted(node);
        self.store.remove(&uri);
        Ok(())
    }

    /// Clears the registry and all tracked state.
    pub fn reset(&self) {
        self.store.reset();
    }

    pub(crate) fn identity_of(&self, node: &Resource) -> CacheResult<Uri> {
        node.self_uri()
            .ok_or_else(|| CacheError::item_not_found(format!("self link on {}", node.key())))
    }
}
