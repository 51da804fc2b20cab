//! Wire representations of resources.

use crate::link::{Link, RelationMatcher};
use crate::uri::Uri;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A hypermedia document as it crosses the wire.
///
/// A representation is what the collaborator returns from a fetch and
/// what mutations submit: a `links` sequence, an optional `items`
/// sequence (present iff the document describes a collection), and an
/// open attribute map flattened into the document body.
///
/// ```json
/// { "links": [{"rel": "self", "href": "/todo/1"}], "name": "groceries" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Representation {
    /// The link sequence. Order is preserved.
    #[serde(default)]
    pub links: Vec<Link>,
    /// Child representations, present only for collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Representation>>,
    /// All other attributes of the document.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Representation {
    /// Creates an empty singleton representation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a singleton representation with a self link.
    pub fn singleton(uri: impl Into<Uri>) -> Self {
        Self {
            links: vec![Link::self_link(uri)],
            items: None,
            attributes: Map::new(),
        }
    }

    /// Creates a collection representation with a self link and no items.
    pub fn collection(uri: impl Into<Uri>) -> Self {
        Self {
            links: vec![Link::self_link(uri)],
            items: Some(Vec::new()),
            attributes: Map::new(),
        }
    }

    /// Appends a link.
    #[must_use]
    pub fn with_link(mut self, rel: impl Into<String>, href: impl Into<Uri>) -> Self {
        self.links.push(Link::new(rel, href));
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Sets the item sequence, making this a collection representation.
    #[must_use]
    pub fn with_items(mut self, items: Vec<Representation>) -> Self {
        self.items = Some(items);
        self
    }

    /// Returns the target of the first "self" link, if any.
    #[must_use]
    pub fn self_uri(&self) -> Option<&Uri> {
        self.links.iter().find(|l| l.is_self()).map(|l| &l.href)
    }

    /// Finds the first link accepted by the matcher.
    #[must_use]
    pub fn find_link(&self, matcher: &RelationMatcher) -> Option<&Link> {
        matcher.find_in(&self.links)
    }

    /// Returns true if this document describes a collection.
    ///
    /// The distinction is structural: a collection carries an `items`
    /// sequence, even when empty.
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.items.is_some()
    }

    /// Returns an attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns the `name` attribute as a string, if present.
    ///
    /// `name` is the conventional business identity used when a
    /// document carries no self link.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }
}
