//! Navigation queries over the resource graph.

use crate::cache::Cache;
use crate::error::{CacheError, CacheResult};
use crate::state::{Slot, Status};
use crate::store::Defaults;
use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use relgraph_model::{RelationMatcher, Representation, Resource, Uri};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Identifies an item inside a collection.
#[derive(Debug, Clone)]
pub enum Where {
    /// The item whose self URI equals the given URI.
    Uri(Uri),
    /// The item matching the given representation: by self URI when
    /// both sides carry one, falling back to the `name` attribute.
    Matching(Representation),
}

impl Where {
    fn describe(&self) -> String {
        match self {
            Where::Uri(uri) => uri.to_string(),
            Where::Matching(rep) => rep
                .self_uri()
                .map(Uri::to_string)
                .or_else(|| rep.name().map(str::to_owned))
                .unwrap_or_else(|| "<anonymous representation>".into()),
        }
    }
}

/// Options controlling how a navigation request is satisfied.
///
/// All fields are optional; the combination selects one of a fixed set
/// of resolution strategies (see [`Cache::resolve`]).
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// The link relation to follow from the target.
    pub rel: Option<RelationMatcher>,
    /// The attribute name the followed resource is attached under.
    /// Defaults from `rel` when that is an exact name; otherwise the
    /// matched link's own relation name is used.
    pub name: Option<String>,
    /// Identifies a single item within the (resulting) collection.
    pub where_: Option<Where>,
    /// Eagerly hydrate every item of the resulting collection.
    pub include_items: bool,
    /// For a list target, apply the full option set to each element
    /// instead of plainly hydrating each one.
    pub iterate_over: bool,
    /// Concurrency bound for set hydration: `Some(1)` is strictly
    /// sequential, `None`/`Some(0)` unbounded. Falls back to the
    /// session's configured default when absent.
    pub batch_size: Option<usize>,
    /// On fetch failure, hydrate from this value instead of failing.
    pub default_representation: Option<Representation>,
}

impl QueryOptions {
    /// Creates empty options (plain resolution).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the link relation to follow.
    #[must_use]
    pub fn with_rel(mut self, rel: impl Into<RelationMatcher>) -> Self {
        self.rel = Some(rel.into());
        self
    }

    /// Sets the attribute name the followed resource is attached under.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Selects an item by its self URI.
    #[must_use]
    pub fn with_where_uri(mut self, uri: impl Into<Uri>) -> Self {
        self.where_ = Some(Where::Uri(uri.into()));
        self
    }

    /// Selects an item matching a representation.
    #[must_use]
    pub fn with_where_matching(mut self, representation: Representation) -> Self {
        self.where_ = Some(Where::Matching(representation));
        self
    }

    /// Eagerly hydrates the resulting collection's items.
    #[must_use]
    pub fn with_include_items(mut self) -> Self {
        self.include_items = true;
        self
    }

    /// Applies the option set to each element of a list target.
    #[must_use]
    pub fn with_iterate_over(mut self) -> Self {
        self.iterate_over = true;
        self
    }

    /// Sets the concurrency bound for set hydration.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Sets the fallback representation for fetch failures.
    #[must_use]
    pub fn with_default_representation(mut self, representation: Representation) -> Self {
        self.default_representation = Some(representation);
        self
    }
}

/// The subject of a navigation request: one resource or a flat set.
#[derive(Debug, Clone)]
pub enum QueryTarget {
    /// A single resource.
    One(Resource),
    /// A flat set of resources the caller already holds.
    Many(Vec<Resource>),
}

impl From<Resource> for QueryTarget {
    fn from(resource: Resource) -> Self {
        QueryTarget::One(resource)
    }
}

impl From<&Resource> for QueryTarget {
    fn from(resource: &Resource) -> Self {
        QueryTarget::One(resource.clone())
    }
}

impl From<Vec<Resource>> for QueryTarget {
    fn from(resources: Vec<Resource>) -> Self {
        QueryTarget::Many(resources)
    }
}

/// The outcome of a navigation request.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A single resolved resource.
    One(Resource),
    /// A resolved set, in target order.
    Many(Vec<Resource>),
}

impl Resolved {
    /// Returns the single resource, if the request resolved to one.
    #[must_use]
    pub fn into_one(self) -> Option<Resource> {
        match self {
            Resolved::One(resource) => Some(resource),
            Resolved::Many(_) => None,
        }
    }

    /// Returns the resolved set; a single resource becomes a set of one.
    #[must_use]
    pub fn into_many(self) -> Vec<Resource> {
        match self {
            Resolved::One(resource) => vec![resource],
            Resolved::Many(resources) => resources,
        }
    }
}

impl Cache {
    /// Resolves a navigation request.
    ///
    /// The options select one of a fixed set of strategies, evaluated
    /// in this precedence:
    ///
    /// 1. list target without `iterate_over`: plainly hydrate each
    ///    element, bounded by `batch_size`
    /// 2. no `rel`: plain resolution of the target itself
    /// 3. `rel` on a singleton target: attach and hydrate the linked
    ///    resource under the derived attribute name
    /// 4. `rel` on a collection target: as (3), the attached node
    ///    being a lazily hydrated collection
    /// 5. `rel` with `include_items`: as (4), then hydrate every item
    /// 6. `where_`: locate one item (of the target, or of the resource
    ///    the `rel` led to) and hydrate it
    ///
    /// Every path that touches the network runs under the tracker's
    /// exclusive in-flight handle, so concurrent requests for the same
    /// identity collapse into one fetch. With `default_representation`
    /// set, a failed fetch hydrates from the default instead of
    /// failing.
    pub async fn resolve(
        &self,
        target: impl Into<QueryTarget>,
        options: QueryOptions,
    ) -> CacheResult<Resolved> {
        match target.into() {
            QueryTarget::Many(list) => {
                let batch = self.effective_batch(&options);
                let resolved = if options.iterate_over {
                    self.resolve_each(list, &options, batch).await?
                } else {
                    self.hydrate_each(list, options.default_representation.as_ref(), batch)
                        .await?
                };
                Ok(Resolved::Many(resolved))
            }
            QueryTarget::One(resource) => self
                .resolve_single(resource, &options)
                .await
                .map(Resolved::One),
        }
    }

    /// Resolves a single target by the option precedence.
    async fn resolve_single(
        &self,
        target: Resource,
        options: &QueryOptions,
    ) -> CacheResult<Resource> {
        if let Some(rel) = &options.rel {
            let child = self.resolve_named(&target, rel, options).await?;
            if options.include_items {
                let items = child.items().unwrap_or_default();
                self.hydrate_each(items, None, self.effective_batch(options))
                    .await?;
            }
            if let Some(selector) = &options.where_ {
                let item = self.locate_item(&child, selector)?;
                return self
                    .plain(item, options.default_representation.as_ref())
                    .await;
            }
            return Ok(child);
        }

        if let Some(selector) = &options.where_ {
            let target = self.plain(target, None).await?;
            let item = self.locate_item(&target, selector)?;
            return self
                .plain(item, options.default_representation.as_ref())
                .await;
        }

        self.plain(target, options.default_representation.as_ref())
            .await
    }

    /// Follows a link relation, attaching the linked resource under an
    /// attribute name on the target.
    async fn resolve_named(
        &self,
        target: &Resource,
        rel: &RelationMatcher,
        options: &QueryOptions,
    ) -> CacheResult<Resource> {
        self.ensure_tracked(target);

        // A location-only target may carry the link only in its served
        // document; hydrate it and look again before giving up.
        let link = match target.find_link(rel) {
            Some(link) => link,
            None => {
                if self.tracker().status(target)?.needs_fetch() {
                    self.plain(target.clone(), None).await?;
                }
                target.find_link(rel).ok_or_else(|| {
                    CacheError::item_not_found(format!(
                        "link matching {rel:?} on {}",
                        target.key()
                    ))
                })?
            }
        };
        let name = options
            .name
            .clone()
            .or_else(|| rel.default_name().map(str::to_owned))
            .unwrap_or_else(|| link.rel.clone());

        // The named node is a collection when the caller asks for
        // items or navigates from a collection; a singleton otherwise.
        // Hydration promotes the node if the document proves it wrong.
        let sparse = if options.include_items || target.is_collection() {
            self.store().sparse_collection(link.href.clone(), Defaults::new())
        } else {
            self.store().sparse_singleton(link.href.clone(), Defaults::new())
        };

        let child = match self.tracker().add_tracked(target, &name, sparse) {
            Slot::Child(child) => child,
            Slot::Occupied(_) => return Err(CacheError::AttributeOccupied { name }),
        };
        trace!(rel = %link.rel, name = %name, "following link");

        self.plain(child, options.default_representation.as_ref())
            .await
    }

    /// Plain resolution: return the node hydrated, fetching it if only
    /// its location is known.
    async fn plain(
        &self,
        node: Resource,
        default: Option<&Representation>,
    ) -> CacheResult<Resource> {
        self.ensure_tracked(&node);

        let status = self.tracker().status(&node)?;
        match status {
            Status::Hydrated => Ok(node),
            Status::Deleted => {
                let error = self.miss_error(&node);
                self.apply_fallback(&node, default, error)
            }
            Status::Unknown | Status::LocationOnly => {
                let Some(uri) = node.self_uri() else {
                    let error = self.miss_error(&node);
                    return self.apply_fallback(&node, default, error);
                };

                let client = Arc::clone(self.client());
                let outcome = self
                    .tracker()
                    .run_exclusive(node.key(), async move { client.fetch(&uri).await })
                    .await;

                match outcome {
                    Ok(representation) => {
                        self.hydrate(&node, &representation);
                        Ok(node)
                    }
                    Err(error) => self.apply_fallback(&node, default, error),
                }
            }
        }
    }

    /// Plainly hydrates a set of nodes under the concurrency bound.
    async fn hydrate_each(
        &self,
        nodes: Vec<Resource>,
        default: Option<&Representation>,
        batch: usize,
    ) -> CacheResult<Vec<Resource>> {
        match batch {
            1 => {
                let mut resolved = Vec::with_capacity(nodes.len());
                for node in nodes {
                    resolved.push(self.plain(node, default).await?);
                }
                Ok(resolved)
            }
            0 => join_all(nodes.into_iter().map(|node| self.plain(node, default)))
                .await
                .into_iter()
                .collect(),
            bound => {
                stream::iter(nodes.into_iter().map(|node| self.plain(node, default)))
                    .buffered(bound)
                    .collect::<Vec<_>>()
                    .await
                    .into_iter()
                    .collect()
            }
        }
    }

    /// Applies the full option set to each element of a list target.
    async fn resolve_each(
        &self,
        targets: Vec<Resource>,
        options: &QueryOptions,
        batch: usize,
    ) -> CacheResult<Vec<Resource>> {
        match batch {
            1 => {
                let mut resolved = Vec::with_capacity(targets.len());
                for target in targets {
                    resolved.push(self.resolve_single(target, options).await?);
                }
                Ok(resolved)
            }
            0 => join_all(
                targets
                    .into_iter()
                    .map(|target| self.resolve_single(target, options)),
            )
            .await
            .into_iter()
            .collect(),
            bound => {
                stream::iter(
                    targets
                        .into_iter()
                        .map(|target| self.resolve_single(target, options)),
                )
                .buffered(bound)
                .collect::<Vec<_>>()
                .await
                .into_iter()
                .collect()
            }
        }
    }

    /// Finds the item the selector identifies within the collection.
    fn locate_item(&self, collection: &Resource, selector: &Where) -> CacheResult<Resource> {
        let items = collection.items().ok_or_else(|| {
            CacheError::item_not_found(format!("items on non-collection {}", collection.key()))
        })?;

        items
            .into_iter()
            .find(|item| match selector {
                Where::Uri(uri) => item.self_uri().as_ref() == Some(uri),
                Where::Matching(rep) => match (item.self_uri(), rep.self_uri()) {
                    (Some(a), Some(b)) => a == *b,
                    _ => {
                        let item_name = item.attribute("name");
                        let item_name = item_name.as_ref().and_then(Value::as_str);
                        rep.name().is_some() && item_name == rep.name()
                    }
                },
            })
            .ok_or_else(|| CacheError::item_not_found(selector.describe()))
    }

    /// Registers a node the caller constructed outside the factory.
    fn ensure_tracked(&self, node: &Resource) {
        if self.tracker().try_status(node).is_none() {
            self.tracker().track(node);
            if let Some(uri) = node.self_uri() {
                self.tracker().mark_location_only(node, &uri);
            }
        }
    }

    /// Merges a fetched representation into the node, splicing items
    /// for collection documents.
    fn hydrate(&self, node: &Resource, representation: &Representation) {
        self.tracker().mark_hydrated(node, representation);
        if let Some(items) = &representation.items {
            self.store().splice_items(node, items);
        }
    }

    fn apply_fallback(
        &self,
        node: &Resource,
        default: Option<&Representation>,
        error: CacheError,
    ) -> CacheResult<Resource> {
        match default {
            Some(representation) if error.is_fetch_miss() => {
                trace!(key = %node.key(), "fetch missed, hydrating from default");
                self.hydrate(node, representation);
                Ok(node.clone())
            }
            _ => Err(error),
        }
    }

    fn miss_error(&self, node: &Resource) -> CacheError {
        match node.self_uri() {
            Some(uri) => CacheError::not_found(uri),
            None => CacheError::item_not_found(format!("self link on {}", node.key())),
        }
    }

    fn effective_batch(&self, options: &QueryOptions) -> usize {
        options
            .batch_size
            .unwrap_or(self.config().default_batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockClient;
    use crate::config::CacheConfig;
    use crate::error::CacheError;

    fn session() -> (Arc<Cache>, Arc<MockClient>) {
        let client = Arc::new(MockClient::new());
        let cache = Arc::new(Cache::new(CacheConfig::default(), Arc::clone(&client) as _));
        (cache, client)
    }

    #[tokio::test]
    async fn plain_resolution_hydrates_location_only() {
        let (cache, client) = session();
        client.serve(
            "/todo/1",
            Representation::singleton("/todo/1").with_attribute("name", "a"),
        );

        let node = cache.sparse_singleton("/todo/1", Defaults::new());
        let resolved = cache
            .resolve(&node, QueryOptions::new())
            .await
            .unwrap()
            .into_one()
            .unwrap();

        assert!(resolved.same_node(&node));
        assert_eq!(resolved.attribute("name").unwrap(), "a");
        assert_eq!(cache.tracker().status(&node).unwrap(), Status::Hydrated);
    }

    #[tokio::test]
    async fn hydrated_node_is_returned_without_fetching() {
        let (cache, client) = session();
        client.serve("/todo/1", Representation::singleton("/todo/1"));

        let node = cache.sparse_singleton("/todo/1", Defaults::new());
        cache.resolve(&node, QueryOptions::new()).await.unwrap();
        cache.resolve(&node, QueryOptions::new()).await.unwrap();

        assert_eq!(client.fetch_count(&Uri::from("/todo/1")), 1);
    }

    #[tokio::test]
    async fn concurrent_resolves_collapse_into_one_fetch() {
        let (cache, client) = session();
        client.serve(
            "/todo/1",
            Representation::singleton("/todo/1").with_attribute("name", "a"),
        );
        let node = cache.sparse_singleton("/todo/1", Defaults::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let node = node.clone();
            handles.push(tokio::spawn(async move {
                cache.resolve(&node, QueryOptions::new()).await
            }));
        }
        for handle in handles {
            let resolved = handle.await.unwrap().unwrap().into_one().unwrap();
            assert!(resolved.same_node(&node));
            assert_eq!(resolved.attribute("name").unwrap(), "a");
        }

        assert_eq!(client.fetch_count(&Uri::from("/todo/1")), 1);
    }

    #[tokio::test]
    async fn concurrent_resolves_share_one_failing_fetch() {
        let (cache, client) = session();
        client.fail("/todo/1", CacheError::transport_fatal("unreachable"));
        let node = cache.sparse_singleton("/todo/1", Defaults::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let node = node.clone();
            handles.push(tokio::spawn(async move {
                cache.resolve(&node, QueryOptions::new()).await
            }));
        }
        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, CacheError::Transport { .. }));
        }
        // The whole burst shares one collaborator invocation.
        assert_eq!(client.fetch_count(&Uri::from("/todo/1")), 1);

        // The entry was retired with the burst; a later resolve is a
        // fresh fetch.
        let err = cache.resolve(&node, QueryOptions::new()).await.unwrap_err();
        assert!(matches!(err, CacheError::Transport { .. }));
        assert_eq!(client.fetch_count(&Uri::from("/todo/1")), 2);
    }

    #[tokio::test]
    async fn missing_resource_fails_without_default() {
        let (cache, _client) = session();
        let node = cache.sparse_singleton("/gone", Defaults::new());

        let err = cache
            .resolve(&node, QueryOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::ResourceNotFound { .. }));
    }

    #[tokio::test]
    async fn default_representation_absorbs_the_miss() {
        let (cache, _client) = session();
        let node = cache.sparse_singleton("/gone", Defaults::new());

        let fallback = Representation::new().with_attribute("name", "fallback");
        let resolved = cache
            .resolve(&node, QueryOptions::new().with_default_representation(fallback))
            .await
            .unwrap()
            .into_one()
            .unwrap();

        assert_eq!(resolved.attribute("name").unwrap(), "fallback");
        assert_eq!(cache.tracker().status(&node).unwrap(), Status::Hydrated);
    }

    #[tokio::test]
    async fn default_does_not_absorb_item_not_found() {
        let (cache, client) = session();
        client.serve(
            "/todos",
            Representation::collection("/todos")
                .with_items(vec![Representation::singleton("/todo/1")]),
        );
        let coll = cache.sparse_collection("/todos", Defaults::new());

        let err = cache
            .resolve(
                &coll,
                QueryOptions::new()
                    .with_where_uri("/todo/9")
                    .with_default_representation(Representation::new()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::ItemNotFound { .. }));
    }

    #[tokio::test]
    async fn named_singleton_attaches_under_rel_name() {
        let (cache, client) = session();
        client.serve("/user/1", Representation::singleton("/user/1"));
        client.serve(
            "/user/1/avatar",
            Representation::singleton("/user/1/avatar").with_attribute("size", 64),
        );

        let user = cache.sparse_singleton("/user/1", Defaults::new());
        user.add_link(relgraph_model::Link::new("avatar", "/user/1/avatar"));

        let avatar = cache
            .resolve(&user, QueryOptions::new().with_rel("avatar"))
            .await
            .unwrap()
            .into_one()
            .unwrap();

        assert_eq!(avatar.attribute("size").unwrap(), 64);
        assert!(user.named("avatar").unwrap().same_node(&avatar));
        assert!(cache.tracker().is_tracked(&user, "avatar"));

        // A second resolve reuses the attached node.
        cache
            .resolve(&user, QueryOptions::new().with_rel("avatar"))
            .await
            .unwrap();
        assert_eq!(client.fetch_count(&Uri::from("/user/1/avatar")), 1);
    }

    #[tokio::test]
    async fn pattern_rel_follows_the_first_matching_link() {
        let (cache, client) = session();
        client.serve(
            "/todo/1/tags",
            Representation::collection("/todo/1/tags"),
        );

        let todo = cache.sparse_singleton("/todo/1", Defaults::new());
        todo.add_link(relgraph_model::Link::new("notes", "/todo/1/notes"));
        todo.add_link(relgraph_model::Link::new("tags", "/todo/1/tags"));

        let pattern = regex::Regex::new("^tag").expect("valid pattern");
        let tags = cache
            .resolve(
                &todo,
                // No explicit name: the matched link's own rel is used.
                QueryOptions::new().with_rel(RelationMatcher::from(pattern)),
            )
            .await
            .unwrap()
            .into_one()
            .unwrap();

        assert_eq!(tags.self_uri().unwrap().as_str(), "/todo/1/tags");
        assert!(todo.named("tags").unwrap().same_node(&tags));
    }

    #[tokio::test]
    async fn named_resolution_without_link_fails() {
        let (cache, client) = session();
        client.serve("/todo/1", Representation::singleton("/todo/1"));
        let node = cache.sparse_singleton("/todo/1", Defaults::new());

        let err = cache
            .resolve(&node, QueryOptions::new().with_rel("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::ItemNotFound { .. }));
    }

    #[tokio::test]
    async fn named_resolution_never_clobbers_caller_attribute() {
        let (cache, _client) = session();
        let node = cache.sparse_singleton("/todo/1", Defaults::new());
        node.add_link(relgraph_model::Link::new("tags", "/tags/1"));
        node.set_attribute("tags", "caller data");

        let err = cache
            .resolve(&node, QueryOptions::new().with_rel("tags"))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::AttributeOccupied { .. }));
        assert_eq!(node.attribute("tags").unwrap(), "caller data");
    }

    #[tokio::test]
    async fn named_collection_is_lazily_hydrated() {
        let (cache, client) = session();
        client.serve(
            "/tags/1",
            Representation::collection("/tags/1").with_items(vec![
                Representation::singleton("/tag/a"),
                Representation::singleton("/tag/b"),
            ]),
        );

        let todo = cache.sparse_singleton("/todo/1", Defaults::new());
        todo.add_link(relgraph_model::Link::new("tags", "/tags/1"));

        let tags = cache
            .resolve(&todo, QueryOptions::new().with_rel("tags"))
            .await
            .unwrap()
            .into_one()
            .unwrap();

        assert!(tags.is_collection());
        let items = tags.items().unwrap();
        assert_eq!(items.len(), 2);
        // Items are sparse; only the collection document was fetched.
        assert_eq!(
            cache.tracker().status(&items[0]).unwrap(),
            Status::LocationOnly
        );
        assert_eq!(client.total_fetches(), 1);
    }

    #[tokio::test]
    async fn include_items_hydrates_every_item() {
        let (cache, client) = session();
        client.serve(
            "/tags/1",
            Representation::collection("/tags/1").with_items(vec![
                Representation::singleton("/tag/a"),
                Representation::singleton("/tag/b"),
                Representation::singleton("/tag/c"),
            ]),
        );
        for tag in ["a", "b", "c"] {
            let uri = format!("/tag/{tag}");
            client.serve(
                uri.as_str(),
                Representation::singleton(uri.as_str()).with_attribute("label", tag),
            );
        }

        let todo = cache.sparse_singleton("/todo/1", Defaults::new());
        todo.add_link(relgraph_model::Link::new("tags", "/tags/1"));

        let tags = cache
            .resolve(
                &todo,
                QueryOptions::new().with_rel("tags").with_include_items(),
            )
            .await
            .unwrap()
            .into_one()
            .unwrap();

        let items = tags.items().unwrap();
        assert_eq!(items.len(), 3);
        for item in &items {
            assert_eq!(cache.tracker().status(item).unwrap(), Status::Hydrated);
        }
        // One fetch for the collection plus one per item.
        assert_eq!(client.total_fetches(), 1 + 3);
    }

    #[tokio::test]
    async fn where_locates_item_by_uri() {
        let (cache, client) = session();
        client.serve(
            "/todos",
            Representation::collection("/todos").with_items(vec![
                Representation::singleton("/a"),
                Representation::singleton("/b"),
            ]),
        );
        client.serve("/b", Representation::singleton("/b").with_attribute("name", "B"));

        let coll = cache.sparse_collection("/todos", Defaults::new());
        let item = cache
            .resolve(&coll, QueryOptions::new().with_where_uri("/b"))
            .await
            .unwrap()
            .into_one()
            .unwrap();

        assert_eq!(item.self_uri().unwrap().as_str(), "/b");
        assert_eq!(item.attribute("name").unwrap(), "B");
        assert_eq!(cache.tracker().status(&item).unwrap(), Status::Hydrated);

        let err = cache
            .resolve(&coll, QueryOptions::new().with_where_uri("/c"))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::ItemNotFound { .. }));
    }

    #[tokio::test]
    async fn where_locates_item_by_representation_name() {
        let (cache, client) = session();
        client.serve("/x", Representation::singleton("/x"));

        let coll = cache.sparse_collection("/todos", Defaults::new());
        let item = cache.add_item_by_uri(&coll, "/x", Defaults::new());
        item.set_attribute("name", "X");
        cache.tracker().mark_hydrated(&coll, &Representation::collection("/todos"));

        let selector = Representation::new().with_attribute("name", "X");
        let located = cache
            .resolve(&coll, QueryOptions::new().with_where_matching(selector))
            .await
            .unwrap()
            .into_one()
            .unwrap();
        assert!(located.same_node(&item));
    }

    #[tokio::test]
    async fn list_target_hydrates_each_element() {
        let (cache, client) = session();
        for n in 1..=3 {
            let uri = format!("/todo/{n}");
            client.serve(
                uri.as_str(),
                Representation::singleton(uri.as_str()).with_attribute("n", n),
            );
        }

        let nodes: Vec<Resource> = (1..=3)
            .map(|n| cache.sparse_singleton(format!("/todo/{n}").as_str(), Defaults::new()))
            .collect();

        let resolved = cache
            .resolve(nodes.clone(), QueryOptions::new())
            .await
            .unwrap()
            .into_many();

        assert_eq!(resolved.len(), 3);
        for (node, resolved) in nodes.iter().zip(&resolved) {
            assert!(node.same_node(resolved));
            assert_eq!(cache.tracker().status(node).unwrap(), Status::Hydrated);
        }
        assert_eq!(client.total_fetches(), 3);
    }

    #[tokio::test]
    async fn sequential_batch_preserves_order() {
        let (cache, client) = session();
        for n in 1..=4 {
            let uri = format!("/r/{n}");
            client.serve(uri.as_str(), Representation::singleton(uri.as_str()));
        }
        let nodes: Vec<Resource> = (1..=4)
            .map(|n| cache.sparse_singleton(format!("/r/{n}").as_str(), Defaults::new()))
            .collect();

        let resolved = cache
            .resolve(nodes.clone(), QueryOptions::new().with_batch_size(1))
            .await
            .unwrap()
            .into_many();

        let uris: Vec<String> = resolved
            .iter()
            .map(|r| r.self_uri().unwrap().into_string())
            .collect();
        assert_eq!(uris, vec!["/r/1", "/r/2", "/r/3", "/r/4"]);
    }

    #[tokio::test]
    async fn iterate_over_applies_options_per_element() {
        let (cache, client) = session();
        for n in 1..=2 {
            let todo = format!("/todo/{n}");
            let tags = format!("/todo/{n}/tags");
            client.serve(
                todo.as_str(),
                Representation::singleton(todo.as_str()).with_link("tags", tags.as_str()),
            );
            client.serve(tags.as_str(), Representation::collection(tags.as_str()));
        }

        let nodes: Vec<Resource> = (1..=2)
            .map(|n| {
                let node =
                    cache.sparse_singleton(format!("/todo/{n}").as_str(), Defaults::new());
                node.add_link(relgraph_model::Link::new(
                    "tags",
                    format!("/todo/{n}/tags").as_str(),
                ));
                node
            })
            .collect();

        let resolved = cache
            .resolve(
                nodes.clone(),
                QueryOptions::new().with_rel("tags").with_iterate_over(),
            )
            .await
            .unwrap()
            .into_many();

        assert_eq!(resolved.len(), 2);
        for (node, tags) in nodes.iter().zip(&resolved) {
            assert!(tags.is_collection());
            assert!(node.named("tags").unwrap().same_node(tags));
        }
    }
}
