//! Cross-crate integration scenarios.
//!
//! End-to-end exercises of the cache engine over a scripted
//! collaborator: the navigation strategies, the fetch de-duplication
//! guarantee, and the synchronizer's diff semantics.

use crate::fixtures::TestSession;
use relgraph_model::Representation;

/// Scripts a small todo API graph onto the session: a root singleton
/// linking to a todo collection with the given item URIs, each item
/// served as a named singleton.
pub fn script_todo_graph(session: &TestSession, item_uris: &[&str]) {
    session.serve(
        Representation::singleton("/").with_link("todos", "/todos"),
    );
    session.serve(Representation::collection("/todos").with_items(
        item_uris
            .iter()
            .map(|uri| Representation::singleton(*uri))
            .collect(),
    ));
    for (n, uri) in item_uris.iter().enumerate() {
        session.serve(
            Representation::singleton(*uri).with_attribute("name", format!("todo {n}")),
        );
    }
}
