use std::sync::Arc;

use async_trait::async_trait;
use tessera_connector::error::ConnectorResult;
use tessera_connector::resource::{Annotation, Page, ResourceId, ResourceType};
use tessera_connector::traits::{GrantOp, ResourceSyncer};
use tracing::{debug, info, instrument};

use super::page_bag;
use crate::client::SplunkClient;
use crate::derive::{
    deployment_capability_grants, deployment_entitlements, SplunkEntitlement, SplunkGrant,
};
use crate::graph::{deployment_resource, deployment_type, parent_tenant, SplunkResource, ROLE_TYPE};
use crate::mutation;
use crate::profile::SplunkProfile;

/// Capability listings are paged under this frame type.
const CAPABILITY_FRAME: &str = "capability";

/// Root syncer: one resource per configured deployment.
///
/// Capabilities are only offered, and their grants only listed, in verbose
/// mode.
#[derive(Debug, Clone)]
pub struct DeploymentSyncer {
    client: Arc<SplunkClient>,
}

impl DeploymentSyncer {
    pub fn new(client: Arc<SplunkClient>) -> Self {
        Self { client }
    }

    fn verbose(&self) -> bool {
        self.client.config().verbose
    }
}

#[async_trait]
impl ResourceSyncer<SplunkProfile> for DeploymentSyncer {
    fn resource_type(&self) -> ResourceType {
        deployment_type()
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        parent: Option<&ResourceId>,
        _token: &str,
    ) -> ConnectorResult<Page<SplunkResource>> {
        if parent.is_some() {
            return Ok(Page::empty());
        }

        let config = self.client.config();
        let deployments: Vec<SplunkResource> = config
            .tenants()
            .iter()
            .map(|tenant| deployment_resource(tenant, config.cloud))
            .collect();
        info!(count = deployments.len(), "Listed deployments");

        Ok(Page::new(deployments, ""))
    }

    #[instrument(skip(self, resource), fields(deployment = %resource.id))]
    async fn entitlements(
        &self,
        resource: &SplunkResource,
        token: &str,
    ) -> ConnectorResult<Page<SplunkEntitlement>> {
        if !self.verbose() {
            debug!("Capability entitlements disabled");
            return Ok(Page::empty());
        }
        let tenant = parent_tenant(resource)?;

        let mut bag = page_bag(token, CAPABILITY_FRAME, &resource.id)?;
        let listing = self
            .client
            .tenant(&tenant)
            .list_capabilities(self.client.page(bag.current_offset()))
            .await?;

        let entitlements = deployment_entitlements(resource, &listing.records);
        info!(tenant = %tenant, count = entitlements.len(), "Listed capability entitlements");

        Ok(Page::new(entitlements, bag.next_token(listing.next_offset)?))
    }

    #[instrument(skip(self, resource), fields(deployment = %resource.id))]
    async fn grants(
        &self,
        resource: &SplunkResource,
        token: &str,
    ) -> ConnectorResult<Page<SplunkGrant>> {
        if !self.verbose() {
            return Ok(Page::empty());
        }
        let tenant = parent_tenant(resource)?;

        let mut bag = page_bag(token, ROLE_TYPE, &resource.id)?;
        let listing = self
            .client
            .tenant(&tenant)
            .list_roles(self.client.page(bag.current_offset()))
            .await?;

        let grants = deployment_capability_grants(resource, &listing.records);
        info!(tenant = %tenant, count = grants.len(), "Listed capability grants");

        Ok(Page::new(grants, bag.next_token(listing.next_offset)?))
    }
}

#[async_trait]
impl GrantOp<SplunkProfile> for DeploymentSyncer {
    async fn grant(
        &self,
        principal: &SplunkResource,
        entitlement: &SplunkEntitlement,
    ) -> ConnectorResult<Vec<Annotation>> {
        mutation::grant_capability(&self.client, &principal.id, entitlement).await?;
        Ok(Vec::new())
    }

    async fn revoke(&self, grant: &SplunkGrant) -> ConnectorResult<Vec<Annotation>> {
        mutation::revoke_capability(&self.client, &grant.principal, &grant.entitlement).await?;
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplunkConfig;
    use tessera_connector::config::AuthConfig;

    fn syncer(config: SplunkConfig) -> DeploymentSyncer {
        DeploymentSyncer::new(Arc::new(SplunkClient::new(&config).unwrap()))
    }

    #[tokio::test]
    async fn test_defaults_to_local_deployment() {
        let syncer = syncer(SplunkConfig::new(AuthConfig::bearer("tok")));
        let page = syncer.list(None, "").await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id.to_string(), "deployment:localhost");
        assert!(page.is_last());
    }

    #[tokio::test]
    async fn test_lists_configured_deployments_once() {
        let syncer = syncer(
            SplunkConfig::new(AuthConfig::bearer("tok"))
                .with_cloud(true)
                .with_deployments(["acme", "globex"]),
        );

        let page = syncer.list(None, "").await.unwrap();
        let ids: Vec<&str> = page.items.iter().map(|d| d.id.resource.as_str()).collect();
        assert_eq!(ids, vec!["acme", "globex"]);

        let nested = syncer
            .list(Some(&ResourceId::new("deployment", "acme")), "")
            .await
            .unwrap();
        assert!(nested.items.is_empty());
    }

    #[tokio::test]
    async fn test_no_capabilities_unless_verbose() {
        let syncer = syncer(SplunkConfig::new(AuthConfig::bearer("tok")));
        let deployment = syncer.list(None, "").await.unwrap().items.remove(0);

        assert!(syncer.entitlements(&deployment, "").await.unwrap().items.is_empty());
        assert!(syncer.grants(&deployment, "").await.unwrap().items.is_empty());
    }
}
