//! Splunk connector facade.

use std::sync::Arc;

use async_trait::async_trait;
use tessera_connector::error::{ConnectorError, ConnectorResult};
use tessera_connector::resource::Annotation;
use tessera_connector::traits::{Connector, ConnectorMetadata, GrantOp, ResourceSyncer};
use tracing::{info, instrument, warn};

use crate::client::{PageRequest, SplunkClient};
use crate::config::SplunkConfig;
use crate::derive::{SplunkEntitlement, SplunkGrant};
use crate::graph::{SplunkResource, DEPLOYMENT_TYPE, ROLE_TYPE};
use crate::profile::SplunkProfile;
use crate::syncers::{ApplicationSyncer, DeploymentSyncer, RoleSyncer, UserSyncer};

pub const DISPLAY_NAME: &str = "Splunk";
pub const DESCRIPTION: &str = "Connector syncing Splunk users, their roles and capabilities";

/// Splunk connector.
///
/// All syncers share one [`SplunkClient`]; deployments are addressed per call.
#[derive(Debug, Clone)]
pub struct SplunkConnector {
    client: Arc<SplunkClient>,
    deployments: Arc<DeploymentSyncer>,
    users: Arc<UserSyncer>,
    roles: Arc<RoleSyncer>,
    applications: Arc<ApplicationSyncer>,
}

impl SplunkConnector {
    /// Validates the configuration and creates the connector.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the configuration is incomplete or
    /// the HTTP client cannot be created.
    pub fn new(config: &SplunkConfig) -> ConnectorResult<Self> {
        config.validate()?;
        let client = Arc::new(SplunkClient::new(config)?);

        Ok(Self {
            deployments: Arc::new(DeploymentSyncer::new(Arc::clone(&client))),
            users: Arc::new(UserSyncer::new(Arc::clone(&client))),
            roles: Arc::new(RoleSyncer::new(Arc::clone(&client))),
            applications: Arc::new(ApplicationSyncer::new(Arc::clone(&client))),
            client,
        })
    }

    pub fn client(&self) -> &SplunkClient {
        &self.client
    }

    /// Give `principal` an entitlement.
    ///
    /// Role entitlements grant role membership to users; deployment
    /// entitlements grant capabilities to roles.
    #[instrument(skip(self, principal, entitlement), fields(principal = %principal.id, entitlement = %entitlement.id))]
    pub async fn grant(
        &self,
        principal: &SplunkResource,
        entitlement: &SplunkEntitlement,
    ) -> ConnectorResult<Vec<Annotation>> {
        self.grant_op(&entitlement.resource.id.resource_type, "grant")?
            .grant(principal, entitlement)
            .await
    }

    /// Take a granted entitlement away.
    #[instrument(skip(self, grant), fields(grant = %grant.id))]
    pub async fn revoke(&self, grant: &SplunkGrant) -> ConnectorResult<Vec<Annotation>> {
        self.grant_op(&grant.entitlement.resource.id.resource_type, "revoke")?
            .revoke(grant)
            .await
    }

    fn grant_op(
        &self,
        resource_type: &str,
        operation: &str,
    ) -> ConnectorResult<&dyn GrantOp<SplunkProfile>> {
        let op: &dyn GrantOp<SplunkProfile> = match resource_type {
            ROLE_TYPE => self.roles.as_ref(),
            DEPLOYMENT_TYPE => self.deployments.as_ref(),
            other => {
                return Err(ConnectorError::UnsupportedOperation {
                    resource_type: other.to_string(),
                    operation: operation.to_string(),
                })
            }
        };
        Ok(op)
    }
}

#[async_trait]
impl Connector<SplunkProfile> for SplunkConnector {
    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            display_name: DISPLAY_NAME.to_string(),
            description: DESCRIPTION.to_string(),
        }
    }

    /// Lists a single user on every configured deployment.
    #[instrument(skip(self))]
    async fn validate(&self) -> ConnectorResult<()> {
        for tenant in self.client.config().tenants() {
            let result = self
                .client
                .tenant(&tenant)
                .list_users(PageRequest::new(1, 0), None)
                .await;

            match result {
                Ok(_) => info!(tenant = %tenant, "Credentials accepted"),
                Err(ConnectorError::Backend { status, .. }) if status == 401 || status == 403 => {
                    warn!(tenant = %tenant, status, "Credentials rejected");
                    return Err(ConnectorError::Unauthenticated { status });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn resource_syncers(&self) -> Vec<Arc<dyn ResourceSyncer<SplunkProfile>>> {
        let deployments: Arc<dyn ResourceSyncer<SplunkProfile>> = self.deployments.clone();
        let roles: Arc<dyn ResourceSyncer<SplunkProfile>> = self.roles.clone();
        let users: Arc<dyn ResourceSyncer<SplunkProfile>> = self.users.clone();
        let applications: Arc<dyn ResourceSyncer<SplunkProfile>> = self.applications.clone();
        vec![deployments, roles, users, applications]
    }
}
