//! In-cache resource nodes.

use crate::link::{Link, RelationMatcher};
use crate::representation::Representation;
use crate::uri::Uri;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Stable identity key for a tracked node.
///
/// Keys are assigned from a process-wide counter when the node is
/// constructed and never reused. The state table is keyed by `NodeKey`
/// so it can associate state with a node without owning it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(u64);

impl NodeKey {
    fn next() -> Self {
        Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw key value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// The mutable content of a resource node.
#[derive(Debug, Default)]
struct ResourceNode {
    links: Vec<Link>,
    attributes: Map<String, Value>,
    named: BTreeMap<String, Resource>,
    items: Option<Vec<Resource>>,
}

/// A shared handle to a node in the resource graph.
///
/// Cloning a `Resource` clones the handle, not the node; all clones
/// observe the same mutations. Two handles refer to the same node iff
/// their keys are equal. Accessors return owned data; no lock guard
/// ever escapes a method.
#[derive(Clone)]
pub struct Resource {
    key: NodeKey,
    node: Arc<RwLock<ResourceNode>>,
}

impl Resource {
    /// Creates an empty singleton node.
    #[must_use]
    pub fn singleton() -> Self {
        Self {
            key: NodeKey::next(),
            node: Arc::new(RwLock::new(ResourceNode::default())),
        }
    }

    /// Creates an empty collection node (an empty `items` sequence).
    #[must_use]
    pub fn collection() -> Self {
        let resource = Self::singleton();
        resource.node.write().items = Some(Vec::new());
        resource
    }

    /// Returns the node's identity key.
    #[must_use]
    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// Returns true if `other` is a handle to this same node.
    #[must_use]
    pub fn same_node(&self, other: &Resource) -> bool {
        self.key == other.key
    }

    /// Returns the target of the node's first "self" link, if any.
    #[must_use]
    pub fn self_uri(&self) -> Option<Uri> {
        self.node
            .read()
            .links
            .iter()
            .find(|l| l.is_self())
            .map(|l| l.href.clone())
    }

    /// Finds the first link accepted by the matcher.
    #[must_use]
    pub fn find_link(&self, matcher: &RelationMatcher) -> Option<Link> {
        matcher.find_in(&self.node.read().links).cloned()
    }

    /// Returns a copy of the link sequence.
    #[must_use]
    pub fn links(&self) -> Vec<Link> {
        self.node.read().links.clone()
    }

    /// Appends a link.
    pub fn add_link(&self, link: Link) {
        self.node.write().links.push(link);
    }

    /// Appends any of `links` whose (rel, href) pair is not yet present.
    pub fn extend_links(&self, links: &[Link]) {
        let mut node = self.node.write();
        for link in links {
            if !node.links.contains(link) {
                node.links.push(link.clone());
            }
        }
    }

    /// Returns an attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.node.read().attributes.get(name).cloned()
    }

    /// Returns true if the node carries the attribute.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.node.read().attributes.contains_key(name)
    }

    /// Sets an attribute value.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.node.write().attributes.insert(name.into(), value.into());
    }

    /// Returns a copy of the attribute map.
    #[must_use]
    pub fn attributes(&self) -> Map<String, Value> {
        self.node.read().attributes.clone()
    }

    /// Inserts only the attributes the node does not already carry.
    ///
    /// Existing values win; the node's attribute set only grows.
    pub fn merge_attributes(&self, incoming: &Map<String, Value>) {
        let mut node = self.node.write();
        for (name, value) in incoming {
            node.attributes
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Replaces the attribute map wholesale.
    pub fn replace_attributes(&self, attributes: Map<String, Value>) {
        self.node.write().attributes = attributes;
    }

    /// Returns the child the cache attached under `name`, if any.
    #[must_use]
    pub fn named(&self, name: &str) -> Option<Resource> {
        self.node.read().named.get(name).cloned()
    }

    /// Attaches a child under `name`, replacing any previous child.
    pub fn set_named(&self, name: impl Into<String>, child: Resource) {
        self.node.write().named.insert(name.into(), child);
    }

    /// Returns true if this node is a collection.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.node.read().items.is_some()
    }

    /// Returns a copy of the item handles, if this node is a collection.
    #[must_use]
    pub fn items(&self) -> Option<Vec<Resource>> {
        self.node.read().items.clone()
    }

    /// Appends an item, promoting the node to a collection if needed.
    pub fn push_item(&self, item: Resource) {
        self.node.write().items.get_or_insert_with(Vec::new).push(item);
    }

    /// Replaces the item sequence, promoting the node to a collection.
    pub fn set_items(&self, items: Vec<Resource>) {
        self.node.write().items = Some(items);
    }

    /// Captures the node's current content as a wire representation.
    ///
    /// Named children are cache attachments, not document content, and
    /// are not included. Items are captured recursively.
    #[must_use]
    pub fn snapshot(&self) -> Representation {
        let node = self.node.read();
        Representation {
            links: node.links.clone(),
            items: node
                .items
                .as_ref()
                .map(|items| items.iter().map(Resource::snapshot).collect()),
            attributes: node.attributes.clone(),
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.read();
        f.debug_struct("Resource")
            .field("key", &self.key)
            .field("links", &node.links)
            .field("attributes", &node.attributes)
            .field("items", &node.items.as_ref().map(Vec::len))
            .finish()
    }
}
