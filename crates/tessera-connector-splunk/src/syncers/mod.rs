//! Resource syncers, one per Splunk resource type.
//!
//! Child listings are scoped to the deployment named by their parent and
//! carry a single [`PageFrame`] in their token, so each page resumes at the
//! backend offset where the previous one stopped.

mod application;
mod deployment;
mod role;
mod user;

pub use application::ApplicationSyncer;
pub use deployment::DeploymentSyncer;
pub use role::RoleSyncer;
pub use user::UserSyncer;

use tessera_connector::error::ConnectorResult;
use tessera_connector::pagination::{PageBag, PageFrame};
use tessera_connector::resource::ResourceId;

use crate::graph::DEPLOYMENT_TYPE;
use crate::tenant::Tenant;

/// Tenant behind a parent id, `None` unless the parent is a deployment.
fn parent_deployment(parent: Option<&ResourceId>) -> Option<Tenant> {
    parent
        .filter(|parent| parent.resource_type == DEPLOYMENT_TYPE)
        .map(|parent| Tenant::from_resource_id(&parent.resource))
}

/// Decode `token` for a listing of `resource_type` scoped to `scope`.
fn page_bag(token: &str, resource_type: &str, scope: &ResourceId) -> ConnectorResult<PageBag> {
    PageBag::decode(
        token,
        PageFrame::new(resource_type).with_resource_id(scope.to_string()),
    )
}
