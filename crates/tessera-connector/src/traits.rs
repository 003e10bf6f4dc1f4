//! Connector Framework traits
//!
//! Capability-based trait definitions. Every resource type gets a
//! [`ResourceSyncer`]; types whose entitlements can be changed in the target
//! system also implement [`GrantOp`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ConnectorResult;
use crate::resource::{Annotation, Entitlement, Grant, Page, Resource, ResourceId, ResourceType};

/// Static description of a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorMetadata {
    pub display_name: String,
    pub description: String,
}

/// Base trait for all connectors.
#[async_trait]
pub trait Connector<P>: Send + Sync
where
    P: Send + Sync,
{
    fn metadata(&self) -> ConnectorMetadata;

    /// Check that the configured credentials are accepted by the target system.
    async fn validate(&self) -> ConnectorResult<()>;

    /// One syncer per resource type this connector produces.
    fn resource_syncers(&self) -> Vec<Arc<dyn ResourceSyncer<P>>>;
}

/// Read side of a resource type.
///
/// Every listing is paginated by an opaque token: pass `""` for the first
/// page, then the previous page's `next_token` until it comes back empty.
#[async_trait]
pub trait ResourceSyncer<P>: Send + Sync
where
    P: Send + Sync,
{
    /// Descriptor of the resource type this syncer handles.
    fn resource_type(&self) -> ResourceType;

    /// List resources of this type.
    ///
    /// Root types return nothing when handed a parent; child types return
    /// nothing when handed none.
    async fn list(
        &self,
        parent: Option<&ResourceId>,
        token: &str,
    ) -> ConnectorResult<Page<Resource<P>>>;

    /// Entitlements offered by `resource`.
    async fn entitlements(
        &self,
        resource: &Resource<P>,
        token: &str,
    ) -> ConnectorResult<Page<Entitlement<P>>>;

    /// Grants of the entitlements offered by `resource`.
    async fn grants(&self, resource: &Resource<P>, token: &str)
        -> ConnectorResult<Page<Grant<P>>>;
}

/// Capability for changing who holds an entitlement.
#[async_trait]
pub trait GrantOp<P>: ResourceSyncer<P>
where
    P: Send + Sync,
{
    /// Give `principal` the entitlement.
    async fn grant(
        &self,
        principal: &Resource<P>,
        entitlement: &Entitlement<P>,
    ) -> ConnectorResult<Vec<Annotation>>;

    /// Take the granted entitlement away from the grant's principal.
    async fn revoke(&self, grant: &Grant<P>) -> ConnectorResult<Vec<Annotation>>;
}
