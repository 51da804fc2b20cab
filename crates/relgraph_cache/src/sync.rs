//! Reconciliation of a local collection against a canonical one.

use crate::cache::Cache;
use crate::client::Method;
use crate::error::{CacheError, CacheResult, SyncFailure};
use futures_util::future::join_all;
use relgraph_model::{Representation, Resource, Uri};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

/// Summary of a completed sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Items created.
    pub created: usize,
    /// Items removed.
    pub removed: usize,
    /// Items whose attributes were updated.
    pub updated: usize,
    /// Wall time of the sync.
    pub duration: Duration,
}

impl SyncReport {
    /// Returns true if the sync changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.removed == 0 && self.updated == 0
    }
}

/// The default identity matcher: equal self URIs, falling back to an
/// equal `name` attribute when either side lacks a self link.
#[must_use]
pub fn default_matcher(local: &Resource, canonical: &Representation) -> bool {
    match (local.self_uri(), canonical.self_uri()) {
        (Some(a), Some(b)) => a == *b,
        _ => {
            let local_name = local.attribute("name");
            let local_name = local_name.as_ref().and_then(Value::as_str);
            local_name.is_some() && local_name == canonical.name()
        }
    }
}

enum Plan {
    Keep(Resource),
    Create,
}

impl Cache {
    /// Reconciles the local collection with the canonical one using
    /// the default identity matcher.
    pub async fn sync(
        &self,
        local: &Resource,
        canonical: &Representation,
    ) -> CacheResult<SyncReport> {
        self.sync_with(local, canonical, default_matcher).await
    }

    /// Reconciles the local collection with the canonical one.
    ///
    /// Canonical items absent locally are created, local items absent
    /// canonically are deleted, and kept items whose attribute sets
    /// differ are updated, all through the collaborator. The three
    /// batches run concurrently; operations within a batch target
    /// distinct identities and are order-insensitive. Afterwards the
    /// local `items` are spliced to the canonical identities in
    /// canonical order, reusing kept nodes (a hydrated node is never
    /// replaced by a sparse one).
    ///
    /// Per-item failures are collected into a `SyncAggregate` error;
    /// successfully applied items are not rolled back.
    pub async fn sync_with<M>(
        &self,
        local: &Resource,
        canonical: &Representation,
        matcher: M,
    ) -> CacheResult<SyncReport>
    where
        M: Fn(&Resource, &Representation) -> bool,
    {
        let start = Instant::now();
        let collection_uri = self.identity_of(local)?;
        let local_items = local.items().ok_or_else(|| {
            CacheError::item_not_found(format!("items on non-collection {}", local.key()))
        })?;
        let canonical_items = canonical.items.as_deref().unwrap_or(&[]);

        // Diff: pair each canonical item with its local match; locals
        // with no pair are removed.
        let mut matched = vec![false; local_items.len()];
        let plans: Vec<Plan> = canonical_items
            .iter()
            .map(|item| {
                let found = local_items
                    .iter()
                    .enumerate()
                    .find(|(i, node)| !matched[*i] && matcher(node, item));
                match found {
                    Some((i, node)) => {
                        matched[i] = true;
                        Plan::Keep(node.clone())
                    }
                    None => Plan::Create,
                }
            })
            .collect();
        let to_remove: Vec<Resource> = local_items
            .iter()
            .zip(&matched)
            .filter(|(_, kept)| !**kept)
            .map(|(node, _)| node.clone())
            .collect();
        let to_update: Vec<(Resource, &Representation)> = plans
            .iter()
            .zip(canonical_items)
            .filter_map(|(plan, item)| match plan {
                Plan::Keep(node) if node.attributes() != item.attributes => {
                    Some((node.clone(), item))
                }
                _ => None,
            })
            .collect();

        debug!(
            collection = %collection_uri,
            creates = plans.iter().filter(|p| matches!(p, Plan::Create)).count(),
            removes = to_remove.len(),
            updates = to_update.len(),
            "sync diff computed"
        );

        let mut failures: Vec<SyncFailure> = Vec::new();
        let mut report = SyncReport::default();

        let create_batch = join_all(plans.iter().zip(canonical_items).map(|(plan, item)| {
            let collection_uri = &collection_uri;
            async move {
                if !matches!(plan, Plan::Create) {
                    return None;
                }
                let outcome = self
                    .client()
                    .submit(collection_uri, Method::Create, Some(item))
                    .await;
                Some(match outcome {
                    Ok(response) => Ok(response.unwrap_or_else(|| item.clone())),
                    Err(error) => Err(SyncFailure {
                        uri: sync_identity(item),
                        operation: "create",
                        message: error.to_string(),
                    }),
                })
            }
        }));

        let remove_batch = join_all(to_remove.iter().map(|node| async move {
            let Some(uri) = node.self_uri() else {
                // A purely local item has no remote identity; it is
                // dropped by the splice alone.
                return Ok(());
            };
            match self.client().submit(&uri, Method::Delete, None).await {
                Ok(_) => Ok(()),
                Err(error) => Err(SyncFailure {
                    uri,
                    operation: "delete",
                    message: error.to_string(),
                }),
            }
        }));

        let update_batch = join_all(to_update.iter().map(|(node, item)| async move {
            let uri = match node.self_uri() {
                Some(uri) => uri,
                None => sync_identity(item),
            };
            match self.client().submit(&uri, Method::Update, Some(*item)).await {
                Ok(_) => {
                    node.replace_attributes(item.attributes.clone());
                    self.tracker().mark_hydrated(node, item);
                    Ok(())
                }
                Err(error) => Err(SyncFailure {
                    uri,
                    operation: "update",
                    message: error.to_string(),
                }),
            }
        }));

        let (create_results, remove_results, update_results) =
            tokio::join!(create_batch, remove_batch, update_batch);

        // Splice: canonical order, kept nodes reused, created nodes
        // materialized, failed creates omitted.
        let mut next_items: Vec<Resource> = Vec::with_capacity(canonical_items.len());
        for (plan, created) in plans.iter().zip(create_results) {
            match (plan, created) {
                (Plan::Keep(node), _) => next_items.push(node.clone()),
                (Plan::Create, Some(Ok(representation))) => {
                    next_items.push(self.store().materialize(&representation));
                    report.created += 1;
                }
                (Plan::Create, Some(Err(failure))) => failures.push(failure),
                // A create plan always yields a create result.
                (Plan::Create, None) => {}
            }
        }
        for (node, result) in to_remove.iter().zip(remove_results) {
            match result {
                Ok(()) => {
                    self.tracker().mark_deleted(node);
                    if let Some(uri) = node.self_uri() {
                        self.store().remove(&uri);
                    }
                    report.removed += 1;
                }
                Err(failure) => {
                    failures.push(failure);
                    // The delete did not land; the item stays in the
                    // local collection.
                    next_items.push(node.clone());
                }
            }
        }
        for result in update_results {
            match result {
                Ok(()) => report.updated += 1,
                Err(failure) => failures.push(failure),
            }
        }
        local.set_items(next_items);

        report.duration = start.elapsed();
        if failures.is_empty() {
            debug!(collection = %collection_uri, ?report, "sync complete");
            Ok(report)
        } else {
            Err(CacheError::SyncAggregate { failures })
        }
    }
}

/// The identity reported for a canonical item in failures: its self
/// URI, falling back to its `name`.
fn sync_identity(item: &Representation) -> Uri {
    item.self_uri().cloned().unwrap_or_else(|| {
        Uri::from(item.name().unwrap_or("<anonymous>"))
    })
}
