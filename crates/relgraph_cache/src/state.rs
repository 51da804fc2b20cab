//! Per-node hydration state and in-flight de-duplication.

use crate::error::{CacheError, CacheResult};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use relgraph_model::{Link, NodeKey, Representation, Resource, Uri};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// How much of a node's content is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The node exists but nothing is known about it yet.
    Unknown,
    /// Only the node's identity (self URI) is known.
    LocationOnly,
    /// The node's representation has been fetched.
    Hydrated,
    /// The node has been deleted. Terminal.
    Deleted,
}

impl Status {
    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Deleted)
    }

    /// Returns true if the node still needs a fetch before its content
    /// can be used.
    #[must_use]
    pub fn needs_fetch(&self) -> bool {
        matches!(self, Status::Unknown | Status::LocationOnly)
    }

    /// Returns true if a transition to `next` is allowed.
    ///
    /// Status only advances: unknown → locationOnly → hydrated.
    /// Deleted is reachable from anywhere and terminal. Re-hydration
    /// (hydrated → hydrated) is allowed; it only adds data.
    #[must_use]
    pub fn can_advance_to(&self, next: Status) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Status::Unknown => false,
            Status::LocationOnly => matches!(self, Status::Unknown | Status::LocationOnly),
            Status::Hydrated | Status::Deleted => true,
        }
    }
}

/// A fetch whose outcome is shared by every waiter that joined it.
pub type SharedFetch = Shared<BoxFuture<'static, CacheResult<Representation>>>;

struct NodeState {
    status: Status,
    tracked: BTreeSet<String>,
    pending: Option<(u64, SharedFetch)>,
}

impl NodeState {
    fn new() -> Self {
        Self {
            status: Status::Unknown,
            tracked: BTreeSet::new(),
            pending: None,
        }
    }

    fn status(&self) -> Status {
        self.status
    }
}

/// Counters describing tracker activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    /// Fetch operations actually started.
    pub fetches_started: u64,
    /// Callers that joined an already in-flight fetch.
    pub dedup_joins: u64,
    /// Nodes that reached hydrated status.
    pub hydrations: u64,
}

/// Outcome of attaching a child under a parent attribute name.
#[derive(Debug, Clone)]
pub enum Slot {
    /// The slot holds a cache-managed child (now, or from before).
    Child(Resource),
    /// The slot holds caller data, left untouched and untracked.
    Occupied(Value),
}

/// The per-node state registry.
///
/// One state entry exists per tracked node key; entries associate
/// hydration status, the tracked-attribute ledger, and any in-flight
/// fetch with a node without owning it. All mutation is atomic with
/// respect to the cooperative interleaving model: locks are never held
/// across an await point.
pub struct Tracker {
    states: RwLock<HashMap<NodeKey, NodeState>>,
    next_generation: AtomicU64,
    stats: Mutex<TrackerStats>,
}

impl Tracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
            stats: Mutex::new(TrackerStats::default()),
        }
    }

    /// Returns the node's status, failing if it was never registered.
    pub fn status(&self, node: &Resource) -> CacheResult<Status> {
        self.try_status(node)
            .ok_or(CacheError::NotTracked { key: node.key() })
    }

    /// Returns the node's status, or `None` if it was never registered.
    #[must_use]
    pub fn try_status(&self, node: &Resource) -> Option<Status> {
        self.states.read().get(&node.key()).map(NodeState::status)
    }

    /// Registers a node, idempotently.
    ///
    /// A new registration starts at `Unknown`; an existing one is
    /// returned unchanged.
    pub fn track(&self, node: &Resource) -> Status {
        let mut states = self.states.write();
        states
            .entry(node.key())
            .or_insert_with(NodeState::new)
            .status()
    }

    /// Records that only the node's identity is known.
    ///
    /// Ensures the node carries a self link for `uri`. A node already
    /// hydrated keeps its status; hydration is monotonic.
    pub fn mark_location_only(&self, node: &Resource, uri: &Uri) {
        if node.self_uri().is_none() {
            node.add_link(Link::self_link(uri.clone()));
        }
        self.advance(node, Status::LocationOnly);
    }

    /// Merges a fetched representation into the node and advances it
    /// to `Hydrated`.
    ///
    /// Attributes the node already carries win on conflict; hydration
    /// only adds data. Links are extended with previously-unseen
    /// targets.
    pub fn mark_hydrated(&self, node: &Resource, representation: &Representation) {
        node.merge_attributes(&representation.attributes);
        node.extend_links(&representation.links);
        if self.advance(node, Status::Hydrated) {
            self.stats.lock().hydrations += 1;
            trace!(key = %node.key(), "node hydrated");
        }
    }

    /// Marks the node deleted. Terminal.
    pub fn mark_deleted(&self, node: &Resource) {
        self.advance(node, Status::Deleted);
    }

    /// Returns true if `attribute` on the node was created by the cache.
    #[must_use]
    pub fn is_tracked(&self, node: &Resource, attribute: &str) -> bool {
        self.states
            .read()
            .get(&node.key())
            .is_some_and(|state| state.tracked.contains(attribute))
    }

    /// Attaches `child` at `parent[attribute]` if the slot is free.
    ///
    /// If the slot already holds a cache-managed child, that child is
    /// returned and nothing changes. If the caller populated the
    /// attribute with plain data, the data is returned untouched and
    /// no tracking occurs. Otherwise the child is attached, the
    /// attribute is recorded in the parent's tracked ledger, and the
    /// child is registered.
    pub fn add_tracked(&self, parent: &Resource, attribute: &str, child: Resource) -> Slot {
        if let Some(existing) = parent.named(attribute) {
            return Slot::Child(existing);
        }
        if let Some(value) = parent.attribute(attribute) {
            return Slot::Occupied(value);
        }

        self.track(parent);
        self.track(&child);
        parent.set_named(attribute, child.clone());
        self.states
            .write()
            .entry(parent.key())
            .or_insert_with(NodeState::new)
            .tracked
            .insert(attribute.to_owned());
        Slot::Child(child)
    }

    /// Runs `fetch` exclusively for the node identified by `key`.
    ///
    /// The installed entry moves through an explicit lifecycle: absent
    /// (idle), installed and in flight, and installed with a memoized
    /// outcome once the shared future completes. A caller arriving
    /// while the entry is installed joins it — in flight or already
    /// complete — and `fetch` is dropped unstarted; every waiter
    /// observes the same terminal outcome. Only the installing caller
    /// retires the entry, after its own await resumes, so a waiter
    /// whose poll drives the future to completion cannot strand later
    /// concurrent callers into starting fresh fetches. This is what
    /// guarantees at most one concurrent fetch per resource identity.
    pub async fn run_exclusive<F>(&self, key: NodeKey, fetch: F) -> CacheResult<Representation>
    where
        F: Future<Output = CacheResult<Representation>> + Send + 'static,
    {
        let (generation, shared, installed) = {
            let mut states = self.states.write();
            let state = states
                .get_mut(&key)
                .ok_or(CacheError::NotTracked { key })?;
            match &state.pending {
                Some((generation, shared)) => (*generation, shared.clone(), false),
                None => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let shared = fetch.boxed().shared();
                    state.pending = Some((generation, shared.clone()));
                    (generation, shared, true)
                }
            }
        };

        if installed {
            self.stats.lock().fetches_started += 1;
            debug!(%key, "fetch started");
        } else {
            self.stats.lock().dedup_joins += 1;
            trace!(%key, "joined in-flight fetch");
        }

        let result = shared.await;

        // Only the installer retires the entry; the generation token
        // protects a newer entry in case the state was evicted and the
        // key re-registered in between.
        if installed {
            let mut states = self.states.write();
            if let Some(state) = states.get_mut(&key) {
                if matches!(&state.pending, Some((g, _)) if *g == generation) {
                    state.pending = None;
                }
            }
        }

        result
    }

    /// Drops the state entry for `key`.
    pub fn evict(&self, key: NodeKey) {
        self.states.write().remove(&key);
    }

    /// Drops every state entry. Counters are kept.
    pub fn reset(&self) {
        self.states.write().clear();
    }

    /// Returns a snapshot of the activity counters.
    #[must_use]
    pub fn stats(&self) -> TrackerStats {
        *self.stats.lock()
    }

    /// Advances the node's status, returning whether a transition
    /// happened. Disallowed transitions are ignored.
    fn advance(&self, node: &Resource, next: Status) -> bool {
        let mut states = self.states.write();
        let state = states.entry(node.key()).or_insert_with(NodeState::new);
        let current = state.status();
        if current != next && current.can_advance_to(next) {
            state.status = next;
            true
        } else {
            false
        }
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}
