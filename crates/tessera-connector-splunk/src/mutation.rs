//! Grant and revoke against the live backend.
//!
//! Splunk only offers full-replacement updates, so every mutation reads the
//! principal's current list, edits it and writes the whole list back. There
//! is no conditional update: two concurrent mutations of the same principal
//! can lose one of the edits. Callers must serialize mutations per principal.

use tessera_connector::error::{ConnectorError, ConnectorResult};
use tessera_connector::resource::ResourceId;
use tracing::{info, instrument, warn};

use crate::client::SplunkClient;
use crate::derive::SplunkEntitlement;
use crate::graph::{parent_tenant, role_name, DEPLOYMENT_TYPE, ROLE_TYPE, USER_TYPE};
use crate::tenant::Tenant;

/// Add a role, by name, to a user's role list.
#[instrument(skip(client, entitlement), fields(entitlement = %entitlement.id))]
pub async fn grant_role_membership(
    client: &SplunkClient,
    principal: &ResourceId,
    entitlement: &SplunkEntitlement,
) -> ConnectorResult<()> {
    expect_entitlement_on(entitlement, ROLE_TYPE, "role membership")?;
    expect_principal(principal, USER_TYPE)?;

    let role = role_name(&entitlement.resource);
    let tenant = client.tenant(&parent_tenant(&entitlement.resource)?);
    expect_same_deployment(principal, tenant.tenant())?;

    let user = tenant.get_user(&principal.resource).await?;
    let roles = with_added(&user.content.roles, role).ok_or_else(|| {
        ConnectorError::AlreadyGranted {
            entitlement: entitlement.id.clone(),
            principal: principal.to_string(),
        }
    })?;

    tenant.update_user_roles(&principal.resource, &roles).await?;
    info!(user = %principal.resource, role = %role, "Granted role membership");
    Ok(())
}

/// Remove a role from a user's role list.
#[instrument(skip(client, entitlement), fields(entitlement = %entitlement.id))]
pub async fn revoke_role_membership(
    client: &SplunkClient,
    principal: &ResourceId,
    entitlement: &SplunkEntitlement,
) -> ConnectorResult<()> {
    expect_entitlement_on(entitlement, ROLE_TYPE, "role membership")?;
    expect_principal(principal, USER_TYPE)?;

    let role = role_name(&entitlement.resource);
    let tenant = client.tenant(&parent_tenant(&entitlement.resource)?);
    expect_same_deployment(principal, tenant.tenant())?;

    let user = tenant.get_user(&principal.resource).await?;
    let roles = with_removed(&user.content.roles, role).ok_or_else(|| {
        ConnectorError::NotGranted {
            entitlement: entitlement.id.clone(),
            principal: principal.to_string(),
        }
    })?;

    tenant.update_user_roles(&principal.resource, &roles).await?;
    info!(user = %principal.resource, role = %role, "Revoked role membership");
    Ok(())
}

/// Add a capability to a role's own capability list.
#[instrument(skip(client, entitlement), fields(entitlement = %entitlement.id))]
pub async fn grant_capability(
    client: &SplunkClient,
    principal: &ResourceId,
    entitlement: &SplunkEntitlement,
) -> ConnectorResult<()> {
    expect_entitlement_on(entitlement, DEPLOYMENT_TYPE, "capabilities")?;
    expect_principal(principal, ROLE_TYPE)?;

    let capability = &entitlement.slug;
    let tenant = client.tenant(&parent_tenant(&entitlement.resource)?);
    expect_same_deployment(principal, tenant.tenant())?;

    let role = tenant.get_role(&principal.resource).await?;
    let capabilities = with_added(&role.content.capabilities, capability).ok_or_else(|| {
        ConnectorError::AlreadyGranted {
            entitlement: entitlement.id.clone(),
            principal: principal.to_string(),
        }
    })?;

    tenant
        .update_role_capabilities(&principal.resource, &capabilities)
        .await?;
    info!(role = %principal.resource, capability = %capability, "Granted capability");
    Ok(())
}

/// Remove a capability from a role's own capability list.
#[instrument(skip(client, entitlement), fields(entitlement = %entitlement.id))]
pub async fn revoke_capability(
    client: &SplunkClient,
    principal: &ResourceId,
    entitlement: &SplunkEntitlement,
) -> ConnectorResult<()> {
    expect_entitlement_on(entitlement, DEPLOYMENT_TYPE, "capabilities")?;
    expect_principal(principal, ROLE_TYPE)?;

    let capability = &entitlement.slug;
    let tenant = client.tenant(&parent_tenant(&entitlement.resource)?);
    expect_same_deployment(principal, tenant.tenant())?;

    let role = tenant.get_role(&principal.resource).await?;
    let capabilities = with_removed(&role.content.capabilities, capability).ok_or_else(|| {
        ConnectorError::NotGranted {
            entitlement: entitlement.id.clone(),
            principal: principal.to_string(),
        }
    })?;

    tenant
        .update_role_capabilities(&principal.resource, &capabilities)
        .await?;
    info!(role = %principal.resource, capability = %capability, "Revoked capability");
    Ok(())
}

fn expect_principal(principal: &ResourceId, expected: &str) -> ConnectorResult<()> {
    if principal.resource_type == expected {
        return Ok(());
    }

    warn!(
        principal_id = %principal.resource,
        principal_type = %principal.resource_type,
        expected = %expected,
        "Rejected mutation for wrong principal type"
    );
    Err(ConnectorError::WrongPrincipalType {
        expected: expected.to_string(),
        actual: principal.resource_type.clone(),
    })
}

/// Principals scoped to another deployment cannot hold this deployment's
/// entitlements.
fn expect_same_deployment(principal: &ResourceId, tenant: &Tenant) -> ConnectorResult<()> {
    match &principal.scope {
        Some(scope) if scope != tenant.address() => Err(ConnectorError::InvalidData {
            message: format!(
                "{principal} belongs to deployment {scope}, not {}",
                tenant.address()
            ),
        }),
        _ => Ok(()),
    }
}

fn expect_entitlement_on(
    entitlement: &SplunkEntitlement,
    resource_type: &str,
    operation: &str,
) -> ConnectorResult<()> {
    if entitlement.resource.id.resource_type == resource_type {
        Ok(())
    } else {
        Err(ConnectorError::UnsupportedOperation {
            resource_type: entitlement.resource.id.resource_type.clone(),
            operation: format!("granting {operation}"),
        })
    }
}

/// `list` with `item` appended, or `None` if it is already present.
fn with_added(list: &[String], item: &str) -> Option<Vec<String>> {
    if list.iter().any(|existing| existing == item) {
        return None;
    }
    let mut updated = list.to_vec();
    updated.push(item.to_string());
    Some(updated)
}

/// `list` without the first occurrence of `item`, or `None` if it is absent.
fn with_removed(list: &[String], item: &str) -> Option<Vec<String>> {
    let position = list.iter().position(|existing| existing == item)?;
    let mut updated = list.to_vec();
    updated.remove(position);
    Some(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SplunkConfig;
    use crate::derive::{capability_entitlement, role_member_entitlement};
    use crate::graph::deployment_resource;
    use crate::profile::{RoleProfile, SplunkProfile};
    use tessera_connector::config::AuthConfig;
    use tessera_connector::resource::Resource;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn client() -> SplunkClient {
        SplunkClient::new(&SplunkConfig::new(AuthConfig::bearer("tok"))).unwrap()
    }

    #[test]
    fn test_with_added() {
        assert_eq!(
            with_added(&strings(&["capY"]), "capX"),
            Some(strings(&["capY", "capX"]))
        );
        assert_eq!(with_added(&strings(&["capY"]), "capY"), None);
    }

    #[test]
    fn test_with_removed_first_occurrence() {
        assert_eq!(
            with_removed(&strings(&["a", "b", "a"]), "a"),
            Some(strings(&["b", "a"]))
        );
        assert_eq!(with_removed(&strings(&["a"]), "z"), None);
    }

    #[test]
    fn test_principal_must_share_the_deployment() {
        let acme = Tenant::Named("acme".into());
        let local_user = ResourceId::new(USER_TYPE, "alice").with_scope("localhost");

        assert!(expect_same_deployment(&local_user, &Tenant::Local).is_ok());
        assert!(expect_same_deployment(&ResourceId::new(USER_TYPE, "alice"), &acme).is_ok());

        let err = expect_same_deployment(&local_user, &acme).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
    }

    #[tokio::test]
    async fn test_role_membership_requires_user_principal() {
        let role = Resource::new(
            ResourceId::new(ROLE_TYPE, "power"),
            "Power",
            SplunkProfile::Role(RoleProfile {
                name: "power".into(),
                capabilities: vec![],
                imported_capabilities: vec![],
            }),
        )
        .with_parent(ResourceId::new(DEPLOYMENT_TYPE, "localhost"));
        let entitlement = role_member_entitlement(&role);

        let err = grant_role_membership(&client(), &ResourceId::new(ROLE_TYPE, "admin"), &entitlement)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::WrongPrincipalType { ref expected, ref actual }
                if expected == "user" && actual == "role"
        ));
    }

    #[tokio::test]
    async fn test_capability_requires_role_principal() {
        let deployment = deployment_resource(&Tenant::Local, false);
        let entitlement = capability_entitlement(&deployment, "capX");

        let err = revoke_capability(&client(), &ResourceId::new(USER_TYPE, "alice"), &entitlement)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "WRONG_PRINCIPAL_TYPE");
    }
}
