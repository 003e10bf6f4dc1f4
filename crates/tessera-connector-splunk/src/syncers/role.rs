use std::sync::Arc;

use async_trait::async_trait;
use tessera_connector::error::ConnectorResult;
use tessera_connector::resource::{Annotation, Page, ResourceId, ResourceType};
use tessera_connector::traits::{GrantOp, ResourceSyncer};
use tracing::{info, instrument};

use super::{page_bag, parent_deployment};
use crate::client::SplunkClient;
use crate::derive::{role_entitlements, role_member_grants, SplunkEntitlement, SplunkGrant};
use crate::graph::{
    map_records, parent_tenant, role_name, role_resource, role_type, SplunkResource, ROLE_TYPE,
    USER_TYPE,
};
use crate::mutation;
use crate::profile::SplunkProfile;

/// Roles of a deployment, offering membership and their capabilities.
#[derive(Debug, Clone)]
pub struct RoleSyncer {
    client: Arc<SplunkClient>,
}

impl RoleSyncer {
    pub fn new(client: Arc<SplunkClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceSyncer<SplunkProfile> for RoleSyncer {
    fn resource_type(&self) -> ResourceType {
        role_type()
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        parent: Option<&ResourceId>,
        token: &str,
    ) -> ConnectorResult<Page<SplunkResource>> {
        let (Some(parent), Some(tenant)) = (parent, parent_deployment(parent)) else {
            return Ok(Page::empty());
        };

        let mut bag = page_bag(token, ROLE_TYPE, parent)?;
        let listing = self
            .client
            .tenant(&tenant)
            .list_roles(self.client.page(bag.current_offset()))
            .await?;

        let roles = map_records(&listing.records, |role| role_resource(role, parent));
        info!(tenant = %tenant, count = roles.len(), "Listed roles");

        Ok(Page::new(roles, bag.next_token(listing.next_offset)?))
    }

    /// Membership plus one entitlement per effective capability, in one page.
    async fn entitlements(
        &self,
        resource: &SplunkResource,
        _token: &str,
    ) -> ConnectorResult<Page<SplunkEntitlement>> {
        Ok(Page::new(role_entitlements(resource), ""))
    }

    #[instrument(skip(self, resource), fields(role = %resource.id))]
    async fn grants(
        &self,
        resource: &SplunkResource,
        token: &str,
    ) -> ConnectorResult<Page<SplunkGrant>> {
        let tenant = parent_tenant(resource)?;
        let role_name = role_name(resource);

        let mut bag = page_bag(token, USER_TYPE, &resource.id)?;
        let listing = self
            .client
            .tenant(&tenant)
            .list_users(self.client.page(bag.current_offset()), Some(role_name))
            .await?;

        let grants = role_member_grants(resource, &listing.records);
        info!(tenant = %tenant, count = grants.len(), "Listed role membership grants");

        Ok(Page::new(grants, bag.next_token(listing.next_offset)?))
    }
}

#[async_trait]
impl GrantOp<SplunkProfile> for RoleSyncer {
    async fn grant(
        &self,
        principal: &SplunkResource,
        entitlement: &SplunkEntitlement,
    ) -> ConnectorResult<Vec<Annotation>> {
        mutation::grant_role_membership(&self.client, &principal.id, entitlement).await?;
        Ok(Vec::new())
    }

    async fn revoke(&self, grant: &SplunkGrant) -> ConnectorResult<Vec<Annotation>> {
        mutation::revoke_role_membership(&self.client, &grant.principal, &grant.entitlement)
            .await?;
        Ok(Vec::new())
    }
}
