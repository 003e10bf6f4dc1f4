//! Full sync driver.
//!
//! Walks every resource syncer until each listing returns an empty token and
//! collects the result into a [`SyncGraph`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{ConnectorError, ConnectorResult};
use crate::resource::{Entitlement, Grant, Page, Resource, ResourceId, ResourceType};
use crate::traits::ResourceSyncer;

/// Default cap on pages fetched for a single listing.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Everything collected by one sync pass.
#[derive(Debug, Clone, Serialize)]
pub struct SyncGraph<P> {
    pub resource_types: Vec<ResourceType>,
    pub resources: Vec<Resource<P>>,
    pub entitlements: Vec<Entitlement<P>>,
    pub grants: Vec<Grant<P>>,
}

impl<P> Default for SyncGraph<P> {
    fn default() -> Self {
        Self {
            resource_types: Vec::new(),
            resources: Vec::new(),
            entitlements: Vec::new(),
            grants: Vec::new(),
        }
    }
}

impl<P> SyncGraph<P> {
    pub fn resource(&self, id: &ResourceId) -> Option<&Resource<P>> {
        self.resources.iter().find(|resource| &resource.id == id)
    }

    /// Grants whose principal or entitlement resource was never listed.
    pub fn dangling_grants(&self) -> Vec<&Grant<P>> {
        let listed: HashSet<&ResourceId> = self.resources.iter().map(|r| &r.id).collect();
        self.grants
            .iter()
            .filter(|grant| {
                !listed.contains(&grant.principal)
                    || !listed.contains(&grant.entitlement.resource.id)
            })
            .collect()
    }

    /// Grants held by a principal.
    pub fn grants_for(&self, principal: &ResourceId) -> Vec<&Grant<P>> {
        self.grants
            .iter()
            .filter(|grant| &grant.principal == principal)
            .collect()
    }
}

/// Drives a set of resource syncers through a complete sync.
pub struct SyncDriver<P>
where
    P: Send + Sync,
{
    syncers: Vec<Arc<dyn ResourceSyncer<P>>>,
    max_pages: usize,
}

impl<P> SyncDriver<P>
where
    P: Send + Sync,
{
    pub fn new(syncers: Vec<Arc<dyn ResourceSyncer<P>>>) -> Self {
        Self {
            syncers,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Cap the pages fetched for any one listing.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Run a full sync.
    ///
    /// Every syncer is asked for its root resources, then each resource's
    /// advertised child types are listed beneath it. Entitlements and grants
    /// are fetched for every resource whose type does not opt out.
    #[instrument(skip(self))]
    pub async fn run(&self) -> ConnectorResult<SyncGraph<P>> {
        let mut graph = SyncGraph {
            resource_types: self.syncers.iter().map(|s| s.resource_type()).collect(),
            ..SyncGraph::default()
        };

        let by_type: HashMap<String, &Arc<dyn ResourceSyncer<P>>> = self
            .syncers
            .iter()
            .map(|syncer| (syncer.resource_type().id, syncer))
            .collect();

        let mut seen: HashSet<ResourceId> = HashSet::new();
        let mut queue: VecDeque<Resource<P>> = VecDeque::new();

        for syncer in &self.syncers {
            let type_id = syncer.resource_type().id;
            let roots = self
                .drain(&type_id, |token| async move { syncer.list(None, &token).await })
                .await?;
            for resource in roots {
                if seen.insert(resource.id.clone()) {
                    queue.push_back(resource);
                }
            }
        }

        while let Some(resource) = queue.pop_front() {
            for child_type in resource.child_resource_types() {
                let Some(syncer) = by_type.get(child_type) else {
                    warn!(
                        parent = %resource.id,
                        child_type = %child_type,
                        "No syncer registered for child resource type"
                    );
                    continue;
                };

                let parent = &resource.id;
                let children = self
                    .drain(child_type, |token| async move {
                        syncer.list(Some(parent), &token).await
                    })
                    .await?;
                for child in children {
                    if seen.insert(child.id.clone()) {
                        queue.push_back(child);
                    }
                }
            }
            graph.resources.push(resource);
        }

        let mut entitlements = Vec::new();
        let mut grants = Vec::new();
        for resource in &graph.resources {
            let Some(syncer) = by_type.get(resource.id.resource_type.as_str()) else {
                continue;
            };
            if syncer.resource_type().skips_entitlements_and_grants() {
                continue;
            }

            entitlements.extend(
                self.drain(&resource.id.resource_type, |token| async move {
                    syncer.entitlements(resource, &token).await
                })
                .await?,
            );
            grants.extend(
                self.drain(&resource.id.resource_type, |token| async move {
                    syncer.grants(resource, &token).await
                })
                .await?,
            );
        }
        graph.entitlements = entitlements;
        graph.grants = grants;

        if let Some(grant) = graph.dangling_grants().first() {
            return Err(ConnectorError::DanglingGrant {
                grant_id: grant.id.clone(),
            });
        }

        info!(
            resources = graph.resources.len(),
            entitlements = graph.entitlements.len(),
            grants = graph.grants.len(),
            "Sync completed"
        );

        Ok(graph)
    }

    /// Fetch pages until the continuation token comes back empty.
    async fn drain<T, F, Fut>(&self, resource_type: &str, mut fetch: F) -> ConnectorResult<Vec<T>>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = ConnectorResult<Page<T>>>,
    {
        let mut items = Vec::new();
        let mut token = String::new();

        for page_number in 1..=self.max_pages {
            let page = fetch(token).await?;
            debug!(
                resource_type = %resource_type,
                page = page_number,
                count = page.items.len(),
                "Fetched page"
            );
            items.extend(page.items);

            if page.next_token.is_empty() {
                return Ok(items);
            }
            token = page.next_token;
        }

        Err(ConnectorError::InvalidData {
            message: format!(
                "listing for {resource_type} did not finish within {} pages",
                self.max_pages
            ),
        })
    }
}
