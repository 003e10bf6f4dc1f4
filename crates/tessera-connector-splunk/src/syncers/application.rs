use std::sync::Arc;

use async_trait::async_trait;
use tessera_connector::error::ConnectorResult;
use tessera_connector::resource::{Page, ResourceId, ResourceType};
use tessera_connector::traits::ResourceSyncer;
use tracing::{info, instrument};

use super::{page_bag, parent_deployment};
use crate::client::SplunkClient;
use crate::derive::{application_entitlements, application_grants, SplunkEntitlement, SplunkGrant};
use crate::graph::{
    application_resource, application_type, map_records, parent_tenant, SplunkResource,
    APPLICATION_TYPE, USER_TYPE,
};
use crate::profile::SplunkProfile;

/// Installed applications, on premise only.
#[derive(Debug, Clone)]
pub struct ApplicationSyncer {
    client: Arc<SplunkClient>,
}

impl ApplicationSyncer {
    pub fn new(client: Arc<SplunkClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceSyncer<SplunkProfile> for ApplicationSyncer {
    fn resource_type(&self) -> ResourceType {
        application_type()
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        parent: Option<&ResourceId>,
        token: &str,
    ) -> ConnectorResult<Page<SplunkResource>> {
        if self.client.config().cloud {
            return Ok(Page::empty());
        }
        let (Some(parent), Some(tenant)) = (parent, parent_deployment(parent)) else {
            return Ok(Page::empty());
        };

        let mut bag = page_bag(token, APPLICATION_TYPE, parent)?;
        let listing = self
            .client
            .tenant(&tenant)
            .list_applications(self.client.page(bag.current_offset()))
            .await?;

        let applications = map_records(&listing.records, |app| application_resource(app, parent));
        info!(tenant = %tenant, count = applications.len(), "Listed applications");

        Ok(Page::new(applications, bag.next_token(listing.next_offset)?))
    }

    async fn entitlements(
        &self,
        resource: &SplunkResource,
        _token: &str,
    ) -> ConnectorResult<Page<SplunkEntitlement>> {
        Ok(Page::new(application_entitlements(resource), ""))
    }

    /// Pages every user of the deployment and matches their roles against
    /// the application ACL.
    #[instrument(skip(self, resource), fields(application = %resource.id))]
    async fn grants(
        &self,
        resource: &SplunkResource,
        token: &str,
    ) -> ConnectorResult<Page<SplunkGrant>> {
        let tenant = parent_tenant(resource)?;

        let mut bag = page_bag(token, USER_TYPE, &resource.id)?;
        let listing = self
            .client
            .tenant(&tenant)
            .list_users(self.client.page(bag.current_offset()), None)
            .await?;

        let grants = application_grants(resource, &listing.records);
        info!(tenant = %tenant, count = grants.len(), "Listed application grants");

        Ok(Page::new(grants, bag.next_token(listing.next_offset)?))
    }
}
