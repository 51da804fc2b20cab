//! Identity-keyed node registry and sparse-node factory.

use crate::state::Tracker;
use parking_lot::RwLock;
use relgraph_model::{Representation, Resource, Uri};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Default attributes spliced into a newly built node.
pub type Defaults = Map<String, Value>;

/// The identity-keyed node registry.
///
/// At most one node exists per distinct URI within one store lifetime;
/// every construction primitive first consults the registry. The store
/// lives for the application/session and is explicitly reset at
/// teardown. Construction never performs network access.
pub struct Store {
    registry: RwLock<HashMap<Uri, Resource>>,
    tracker: Arc<Tracker>,
}

impl Store {
    /// Creates an empty store sharing the given tracker.
    #[must_use]
    pub fn new(tracker: Arc<Tracker>) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            tracker,
        }
    }

    /// Returns the node registered for `uri`, if any.
    #[must_use]
    pub fn get(&self, uri: &Uri) -> Option<Resource> {
        self.registry.read().get(uri).cloned()
    }

    /// Number of registered identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.read().len()
    }

    /// Returns true if no identity is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.read().is_empty()
    }

    /// Builds (or returns) a location-only singleton for `uri`.
    ///
    /// A node already registered under the URI is returned unchanged;
    /// defaults apply only to a fresh node.
    pub fn sparse_singleton(&self, uri: impl Into<Uri>, defaults: Defaults) -> Resource {
        self.sparse(uri.into(), defaults, false)
    }

    /// Builds (or returns) a location-only collection for `uri`, with
    /// an empty `items` sequence.
    pub fn sparse_collection(&self, uri: impl Into<Uri>, defaults: Defaults) -> Resource {
        self.sparse(uri.into(), defaults, true)
    }

    /// Appends a sparse singleton for `uri` to the collection's items
    /// and returns it. If a node for the URI already exists it is
    /// reused, and it is not appended twice.
    pub fn add_item_by_uri(
        &self,
        collection: &Resource,
        uri: impl Into<Uri>,
        defaults: Defaults,
    ) -> Resource {
        let item = self.sparse_singleton(uri, defaults);
        let already_present = collection
            .items()
            .is_some_and(|items| items.iter().any(|i| i.same_node(&item)));
        if !already_present {
            collection.push_item(item.clone());
        }
        item
    }

    /// Builds a hydrated node from a full representation.
    ///
    /// If the representation's identity is already registered, the
    /// representation is merged into the existing node instead of a
    /// duplicate being created. Item entries of a collection document
    /// become sparse nodes carrying the entry's attributes.
    pub fn materialize(&self, representation: &Representation) -> Resource {
        let node = match representation.self_uri() {
            Some(uri) => {
                if representation.is_collection() {
                    self.sparse_collection(uri.clone(), Defaults::new())
                } else {
                    self.sparse_singleton(uri.clone(), Defaults::new())
                }
            }
            None => {
                // Anonymous representation; the node has no registry
                // identity and is tracked standalone.
                let node = if representation.is_collection() {
                    Resource::collection()
                } else {
                    Resource::singleton()
                };
                self.tracker.track(&node);
                node
            }
        };
        self.tracker.mark_hydrated(&node, representation);
        if let Some(items) = &representation.items {
            self.splice_items(&node, items);
        }
        node
    }

    /// Replaces the collection's items with sparse nodes for the given
    /// feed entries, reusing registered nodes per identity.
    pub fn splice_items(&self, collection: &Resource, entries: &[Representation]) {
        let items = entries
            .iter()
            .map(|entry| match entry.self_uri() {
                Some(uri) => self.sparse_singleton(uri.clone(), entry.attributes.clone()),
                None => {
                    let node = Resource::singleton();
                    node.merge_attributes(&entry.attributes);
                    node.extend_links(&entry.links);
                    self.tracker.track(&node);
                    node
                }
            })
            .collect();
        collection.set_items(items);
    }

    /// Removes the registry entry for `uri`, returning the node.
    ///
    /// The node's tracked state is kept; a deleted node stays terminal
    /// even if a handle to it survives.
    pub fn remove(&self, uri: &Uri) -> Option<Resource> {
        self.registry.write().remove(uri)
    }

    /// Clears the registry and every tracked state. The explicit
    /// teardown used between test cases and at session end.
    pub fn reset(&self) {
        self.registry.write().clear();
        self.tracker.reset();
    }

    fn sparse(&self, uri: Uri, defaults: Defaults, collection: bool) -> Resource {
        if let Some(existing) = self.get(&uri) {
            return existing;
        }

        let node = if collection {
            Resource::collection()
        } else {
            Resource::singleton()
        };
        node.merge_attributes(&defaults);
        self.tracker.track(&node);
        self.tracker.mark_location_only(&node, &uri);
        trace!(%uri, key = %node.key(), "sparse node registered");

        self.registry.write().insert(uri, node.clone());
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Status;

    fn store() -> (Store, Arc<Tracker>) {
        let tracker = Arc::new(Tracker::new());
        (Store::new(Arc::clone(&tracker)), tracker)
    }

    #[test]
    fn sparse_singleton_is_location_only() {
        let (store, tracker) = store();
        let mut defaults = Defaults::new();
        defaults.insert("name".into(), Value::from("n"));

        let node = store.sparse_singleton("/todo/1", defaults);
        assert_eq!(node.self_uri().unwrap().as_str(), "/todo/1");
        assert_eq!(node.attribute("name").unwrap(), "n");
        assert!(!node.is_collection());
        assert_eq!(tracker.status(&node).unwrap(), Status::LocationOnly);
    }

    #[test]
    fn one_node_per_identity() {
        let (store, _) = store();
        let a = store.sparse_singleton("/todo/1", Defaults::new());
        let mut defaults = Defaults::new();
        defaults.insert("ignored".into(), Value::from(true));
        let b = store.sparse_singleton("/todo/1", defaults);

        assert!(a.same_node(&b));
        assert!(!b.has_attribute("ignored"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn sparse_collection_has_empty_items() {
        let (store, _) = store();
        let coll = store.sparse_collection("/todos", Defaults::new());
        assert!(coll.is_collection());
        assert!(coll.items().unwrap().is_empty());
    }

    #[test]
    fn add_item_by_uri_appends_once() {
        let (store, tracker) = store();
        let coll = store.sparse_collection("/todos", Defaults::new());

        let item = store.add_item_by_uri(&coll, "/todo/1", Defaults::new());
        assert_eq!(tracker.status(&item).unwrap(), Status::LocationOnly);
        assert_eq!(coll.items().unwrap().len(), 1);

        let again = store.add_item_by_uri(&coll, "/todo/1", Defaults::new());
        assert!(again.same_node(&item));
        assert_eq!(coll.items().unwrap().len(), 1);
    }

    #[test]
    fn materialize_reuses_registered_identity() {
        let (store, tracker) = store();
        let sparse = store.sparse_singleton("/todo/1", Defaults::new());

        let rep = Representation::singleton("/todo/1").with_attribute("name", "a");
        let node = store.materialize(&rep);

        assert!(node.same_node(&sparse));
        assert_eq!(node.attribute("name").unwrap(), "a");
        assert_eq!(tracker.status(&node).unwrap(), Status::Hydrated);
    }

    #[test]
    fn materialize_collection_splices_sparse_items() {
        let (store, tracker) = store();
        let rep = Representation::collection("/todos").with_items(vec![
            Representation::singleton("/todo/1").with_attribute("title", "a"),
            Representation::singleton("/todo/2"),
        ]);

        let coll = store.materialize(&rep);
        let items = coll.items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].attribute("title").unwrap(), "a");
        assert_eq!(tracker.status(&items[0]).unwrap(), Status::LocationOnly);
        // Items are registered by identity.
        assert!(store.get(&Uri::from("/todo/2")).unwrap().same_node(&items[1]));
    }

    #[test]
    fn reset_clears_registry_and_tracker() {
        let (store, tracker) = store();
        let node = store.sparse_singleton("/todo/1", Defaults::new());
        store.reset();

        assert!(store.is_empty());
        assert!(tracker.try_status(&node).is_none());
    }
}
