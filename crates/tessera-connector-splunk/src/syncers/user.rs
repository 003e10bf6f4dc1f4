use std::sync::Arc;

use async_trait::async_trait;
use tessera_connector::error::ConnectorResult;
use tessera_connector::resource::{Page, ResourceId, ResourceType};
use tessera_connector::traits::ResourceSyncer;
use tracing::{info, instrument};

use super::{page_bag, parent_deployment};
use crate::client::SplunkClient;
use crate::derive::{SplunkEntitlement, SplunkGrant};
use crate::graph::{map_records, user_resource, user_type, SplunkResource, USER_TYPE};
use crate::profile::SplunkProfile;

/// Users of a deployment. Users hold grants but offer nothing themselves.
#[derive(Debug, Clone)]
pub struct UserSyncer {
    client: Arc<SplunkClient>,
}

impl UserSyncer {
    pub fn new(client: Arc<SplunkClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceSyncer<SplunkProfile> for UserSyncer {
    fn resource_type(&self) -> ResourceType {
        user_type()
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

        let mut bag = page_bag(token, USER_TYPE, parent)?;
        let listing = self
            .client
            .tenant(&tenant)
            .list_users(self.client.page(bag.current_offset()), None)
            .await?;

        let users = map_records(&listing.records, |user| user_resource(user, parent));
        info!(tenant = %tenant, count = users.len(), "Listed users");

        Ok(Page::new(users, bag.next_token(listing.next_offset)?))
    }

    async fn entitlements(
        &self,
        _resource: &SplunkResource,
        _token: &str,
    ) -> ConnectorResult<Page<SplunkEntitlement>> {
        Ok(Page::empty())
    }

    async fn grants(
        &self,
        _resource: &SplunkResource,
        _token: &str,
    ) -> ConnectorResult<Page<SplunkGrant>> {
        Ok(Page::empty())
    }
}
