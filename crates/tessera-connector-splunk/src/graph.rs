//! Mapping of Splunk records onto access graph resources.

use std::collections::BTreeMap;

use tessera_connector::error::{ConnectorError, ConnectorResult};
use tessera_connector::resource::{
    Annotation, Resource, ResourceId, ResourceTrait, ResourceType,
};
use tracing::warn;

use crate::models::{Application, Record, Role, User};
use crate::profile::{
    ApplicationProfile, DeploymentProfile, RoleProfile, SplunkProfile, UserProfile,
};
use crate::tenant::Tenant;

pub const DEPLOYMENT_TYPE: &str = "deployment";
pub const USER_TYPE: &str = "user";
pub const ROLE_TYPE: &str = "role";
pub const APPLICATION_TYPE: &str = "application";

pub type SplunkResource = Resource<SplunkProfile>;

pub fn deployment_type() -> ResourceType {
    ResourceType::new(DEPLOYMENT_TYPE, "Deployment")
}

/// Users never offer entitlements of their own.
pub fn user_type() -> ResourceType {
    ResourceType::new(USER_TYPE, "User")
        .with_trait(ResourceTrait::User)
        .with_annotation(Annotation::SkipEntitlementsAndGrants)
}

pub fn role_type() -> ResourceType {
    ResourceType::new(ROLE_TYPE, "Role").with_trait(ResourceTrait::Role)
}

pub fn application_type() -> ResourceType {
    ResourceType::new(APPLICATION_TYPE, "Application").with_trait(ResourceTrait::App)
}

/// Id of a record living in `deployment`.
///
/// Record names are only unique within one deployment, so child ids carry
/// the deployment address as their scope.
pub fn scoped_id(
    resource_type: &str,
    id: impl Into<String>,
    deployment: &ResourceId,
) -> ResourceId {
    ResourceId::new(resource_type, id).with_scope(deployment.resource.clone())
}

/// Reduce a record URL to its final path segment.
pub fn stable_id(record_id: &str) -> ConnectorResult<String> {
    match record_id.rsplit_once('/') {
        Some((_, id)) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ConnectorError::Mapping {
            record_id: record_id.to_string(),
        }),
    }
}

/// Upper-case the first letter of each word and lower-case the rest.
///
/// Underscores, dots and apostrophes do not break words, so `power_user`
/// becomes `Power_user`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;

    for c in s.chars() {
        if c.is_alphanumeric() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = !matches!(c, '_' | '.' | '\'');
        }
    }

    out
}

/// Root resource for one deployment.
///
/// Applications are only listed on premise; Splunk Cloud does not expose them.
pub fn deployment_resource(tenant: &Tenant, cloud: bool) -> SplunkResource {
    let profile = SplunkProfile::Deployment(DeploymentProfile {
        address: tenant.address().to_string(),
        cloud,
    });

    let resource = Resource::new(
        ResourceId::new(DEPLOYMENT_TYPE, tenant.address()),
        title_case(tenant.address()),
        profile,
    )
    .with_child_type(ROLE_TYPE)
    .with_child_type(USER_TYPE);

    if cloud {
        resource
    } else {
        resource.with_child_type(APPLICATION_TYPE)
    }
}

pub fn user_resource(user: &User, deployment: &ResourceId) -> ConnectorResult<SplunkResource> {
    let id = stable_id(&user.id)?;

    let mut extra = BTreeMap::new();
    extra.insert("login".to_string(), user.content.email.clone());
    extra.insert("user_id".to_string(), id.clone());
    extra.insert("user_name".to_string(), user.name.clone());

    let profile = SplunkProfile::User(UserProfile {
        name: user.name.clone(),
        email: user.content.email.clone(),
        roles: user.content.roles.clone(),
        capabilities: user.content.capabilities.clone(),
        extra,
    });

    Ok(
        Resource::new(scoped_id(USER_TYPE, id, deployment), title_case(&user.name), profile)
            .with_parent(deployment.clone()),
    )
}

pub fn role_resource(role: &Role, deployment: &ResourceId) -> ConnectorResult<SplunkResource> {
    let id = stable_id(&role.id)?;

    let profile = SplunkProfile::Role(RoleProfile {
        name: role.name.clone(),
        capabilities: role.content.capabilities.clone(),
        imported_capabilities: role.content.imported_capabilities.clone(),
    });

    Ok(
        Resource::new(scoped_id(ROLE_TYPE, id, deployment), title_case(&role.name), profile)
            .with_parent(deployment.clone()),
    )
}

pub fn application_resource(
    application: &Application,
    deployment: &ResourceId,
) -> ConnectorResult<SplunkResource> {
    let id = stable_id(&application.id)?;

    let profile = SplunkProfile::Application(ApplicationProfile {
        name: application.name.clone(),
        description: application.content.description.clone(),
        acl_app: application.acl.app.clone(),
        read_roles: application.acl.perms.read.clone(),
        write_roles: application.acl.perms.write.clone(),
    });

    Ok(Resource::new(
        scoped_id(APPLICATION_TYPE, id, deployment),
        title_case(&application.name),
        profile,
    )
    .with_parent(deployment.clone()))
}

/// Map every record, skipping records whose id cannot be reduced.
pub fn map_records<T, F>(records: &[T], mut map: F) -> Vec<SplunkResource>
where
    T: Record,
    F: FnMut(&T) -> ConnectorResult<SplunkResource>,
{
    records
        .iter()
        .filter_map(|record| match map(record) {
            Ok(resource) => Some(resource),
            Err(e) => {
                warn!(record_id = %record.record_id(), error = %e, "Skipping unmappable record");
                None
            }
        })
        .collect()
}

/// Backend name of a role resource.
///
/// User role lists hold names, which can differ from the stable id when the
/// record id is escaped.
pub fn role_name(role: &SplunkResource) -> &str {
    role.profile
        .as_role()
        .map_or(role.id.resource.as_str(), |profile| profile.name.as_str())
}

/// Deployment a child resource belongs to.
pub fn parent_tenant(resource: &SplunkResource) -> ConnectorResult<Tenant> {
    if resource.id.resource_type == DEPLOYMENT_TYPE {
        return Ok(Tenant::from_resource_id(&resource.id.resource));
    }

    match &resource.parent {
        Some(parent) if parent.resource_type == DEPLOYMENT_TYPE => {
            Ok(Tenant::from_resource_id(&parent.resource))
        }
        _ => Err(ConnectorError::InvalidData {
            message: format!("{} has no deployment parent", resource.id),
        }),
    }
}
