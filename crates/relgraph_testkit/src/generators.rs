//! Property-based test generators.

use proptest::collection::vec;
use proptest::prelude::*;
use relgraph_model::{Link, Representation, Uri};
use serde_json::{Map, Value};

/// Strategy for URI path segments.
fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,8}"
}

/// Strategy for absolute-path URIs.
pub fn uri() -> impl Strategy<Value = Uri> {
    vec(segment(), 1..4).prop_map(|segments| Uri::new(format!("/{}", segments.join("/"))))
}

/// Strategy for attribute values: strings, numbers, and booleans.
pub fn attribute_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

/// Strategy for attribute maps.
pub fn attributes() -> impl Strategy<Value = Map<String, Value>> {
    vec(("[a-z][a-z_]{0,8}", attribute_value()), 0..5).prop_map(|pairs| {
        let mut map = Map::new();
        for (name, value) in pairs {
            // The reserved wire fields never appear as attributes.
            if name != "links" && name != "items" {
                map.insert(name, value);
            }
        }
        map
    })
}

/// Strategy for singleton representations carrying a self link.
pub fn singleton() -> impl Strategy<Value = Representation> {
    (uri(), attributes()).prop_map(|(uri, attributes)| Representation {
        links: vec![Link::self_link(uri)],
        items: None,
        attributes,
    })
}

/// Strategy for shallow collections of singletons.
pub fn collection() -> impl Strategy<Value = Representation> {
    (uri(), attributes(), vec(singleton(), 0..4)).prop_map(|(uri, attributes, items)| {
        Representation {
            links: vec![Link::self_link(uri)],
            items: Some(items),
            attributes,
        }
    })
}
