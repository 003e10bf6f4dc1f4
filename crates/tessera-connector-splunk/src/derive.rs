//! Entitlement and grant derivation.
//!
//! Everything here is pure: the syncers fetch the source records and these
//! functions turn them into graph edges. Grants are recomputed from live
//! backend state on every pass.

use tessera_connector::error::ConnectorResult;
use tessera_connector::resource::{Entitlement, EntitlementPurpose, Grant, ResourceId};
use tracing::warn;

use crate::graph::{role_name, stable_id, SplunkResource, DEPLOYMENT_TYPE, ROLE_TYPE, USER_TYPE};
use crate::models::{Capability, Role, User};
use crate::profile::SplunkProfile;

pub type SplunkEntitlement = Entitlement<SplunkProfile>;
pub type SplunkGrant = Grant<SplunkProfile>;

pub const ROLE_MEMBER: &str = "member";
pub const READ_PERMISSION: &str = "read";
pub const WRITE_PERMISSION: &str = "write";

/// ACL wildcard granting access to every role.
pub const ACL_WILDCARD: &str = "*";

/// Whether an ACL role list admits `role`.
pub fn contains_role(acl_roles: &[String], role: &str) -> bool {
    acl_roles
        .iter()
        .any(|r| r == ACL_WILDCARD || r == role)
}

// ============================================================================
// Entitlements
// ============================================================================

/// Membership in a role, held by users.
pub fn role_member_entitlement(role: &SplunkResource) -> SplunkEntitlement {
    Entitlement::new(role.clone(), ROLE_MEMBER, EntitlementPurpose::Assignment)
        .with_display_name(format!("{} role", role.display_name))
        .with_description(format!("{} Splunk role", role.display_name))
        .grantable_to(USER_TYPE)
}

/// A capability as offered by a role or a deployment.
pub fn capability_entitlement(resource: &SplunkResource, capability: &str) -> SplunkEntitlement {
    Entitlement::new(resource.clone(), capability, EntitlementPurpose::Permission)
        .with_display_name(format!("{capability} capability"))
        .with_description(format!("{capability} Splunk capability"))
        .grantable_to(ROLE_TYPE)
}

/// Read or write access to an application.
pub fn application_entitlement(application: &SplunkResource, permission: &str) -> SplunkEntitlement {
    Entitlement::new(application.clone(), permission, EntitlementPurpose::Permission)
        .with_display_name(format!(
            "{} application {}",
            application.display_name,
            permission.to_uppercase()
        ))
        .with_description(format!("{} Splunk application", application.display_name))
        .grantable_to(USER_TYPE)
}

/// `member` followed by one permission per effective capability.
pub fn role_entitlements(role: &SplunkResource) -> Vec<SplunkEntitlement> {
    let mut entitlements = vec![role_member_entitlement(role)];
    if let Some(profile) = role.profile.as_role() {
        entitlements.extend(
            profile
                .effective_capabilities()
                .map(|capability| capability_entitlement(role, capability)),
        );
    }
    entitlements
}

pub fn application_entitlements(application: &SplunkResource) -> Vec<SplunkEntitlement> {
    vec![
        application_entitlement(application, READ_PERMISSION),
        application_entitlement(application, WRITE_PERMISSION),
    ]
}

/// One permission per grantable capability name.
pub fn deployment_entitlements(
    deployment: &SplunkResource,
    capabilities: &[Capability],
) -> Vec<SplunkEntitlement> {
    capabilities
        .iter()
        .flat_map(|entry| entry.content.capabilities.iter())
        .map(|capability| capability_entitlement(deployment, capability))
        .collect()
}

// ============================================================================
// Grants
// ============================================================================

/// `member` grants for every user holding the role.
///
/// The backend `search` filter is not an exact match, so membership is
/// checked again against each user's role list.
pub fn role_member_grants(role: &SplunkResource, users: &[User]) -> Vec<SplunkGrant> {
    let role_name = role_name(role);
    let entitlement = role_member_entitlement(role);

    users
        .iter()
        .filter(|user| user.content.roles.iter().any(|r| r == role_name))
        .filter_map(|user| principal(USER_TYPE, &user.id, &role.id))
        .map(|principal| Grant::new(entitlement.clone(), principal))
        .collect()
}

/// `read` and `write` grants for users whose roles match the application ACL.
///
/// A user gets at most one grant per permission however many of their roles
/// match.
pub fn application_grants(application: &SplunkResource, users: &[User]) -> Vec<SplunkGrant> {
    let Some(profile) = application.profile.as_application() else {
        return Vec::new();
    };
    let read = application_entitlement(application, READ_PERMISSION);
    let write = application_entitlement(application, WRITE_PERMISSION);

    let mut grants = Vec::new();
    for user in users {
        let roles = &user.content.roles;
        let can_read = roles.iter().any(|r| contains_role(&profile.read_roles, r));
        let can_write = roles.iter().any(|r| contains_role(&profile.write_roles, r));
        if !can_read && !can_write {
            continue;
        }

        let Some(principal) = principal(USER_TYPE, &user.id, &application.id) else {
            continue;
        };
        if can_read {
            grants.push(Grant::new(read.clone(), principal.clone()));
        }
        if can_write {
            grants.push(Grant::new(write.clone(), principal));
        }
    }
    grants
}

/// One grant per role and own capability, the role being the principal.
pub fn deployment_capability_grants(
    deployment: &SplunkResource,
    roles: &[Role],
) -> Vec<SplunkGrant> {
    let mut grants = Vec::new();
    for role in roles {
        let Some(principal) = principal(ROLE_TYPE, &role.id, &deployment.id) else {
            continue;
        };

        let mut seen: Vec<&str> = Vec::new();
        for capability in &role.content.capabilities {
            if seen.contains(&capability.as_str()) {
                continue;
            }
            seen.push(capability.as_str());
            grants.push(Grant::new(
                capability_entitlement(deployment, capability),
                principal.clone(),
            ));
        }
    }
    grants
}

/// Principal id in the same deployment as `holder`, the resource whose
/// entitlement is held.
fn principal(resource_type: &str, record_id: &str, holder: &ResourceId) -> Option<ResourceId> {
    match principal_id(resource_type, record_id, holder) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(record_id = %record_id, error = %e, "Skipping grant for unmappable principal");
            None
        }
    }
}

fn principal_id(
    resource_type: &str,
    record_id: &str,
    holder: &ResourceId,
) -> ConnectorResult<ResourceId> {
    let id = ResourceId::new(resource_type, stable_id(record_id)?);
    Ok(match holder.resource_type.as_str() {
        DEPLOYMENT_TYPE => id.with_scope(holder.resource.clone()),
        _ => match &holder.scope {
            Some(scope) => id.with_scope(scope.clone()),
            None => id,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{application_resource, deployment_resource, role_resource};
    use crate::models::Application;
    use crate::tenant::Tenant;
    use serde_json::json;

    fn local() -> ResourceId {
        ResourceId::new("deployment", "localhost")
    }

    fn user(name: &str, roles: &[&str]) -> User {
        serde_json::from_value(json!({
            "id": format!("https://localhost:8089/services/authentication/users/{name}"),
            "name": name,
            "content": { "roles": roles }
        }))
        .unwrap()
    }

    fn role(name: &str, own: &[&str], imported: &[&str]) -> Role {
        serde_json::from_value(json!({
            "id": format!("https://localhost:8089/services/authorization/roles/{name}"),
            "name": name,
            "content": { "capabilities": own, "imported_capabilities": imported }
        }))
        .unwrap()
    }

    fn app1() -> SplunkResource {
        let app: Application = serde_json::from_value(json!({
            "id": "https://localhost:8089/services/apps/local/app1",
            "name": "app1",
            "acl": { "perms": { "read": ["admin"], "write": ["*"] } }
        }))
        .unwrap();
        application_resource(&app, &local()).unwrap()
    }

    fn grant_pairs(grants: &[SplunkGrant]) -> Vec<(String, String)> {
        grants
            .iter()
            .map(|g| (g.entitlement.slug.clone(), g.principal.resource.clone()))
            .collect()
    }

    #[test]
    fn test_wildcard_matches_any_role() {
        let acl = vec!["*".to_string()];
        assert!(contains_role(&acl, "anything"));
        assert!(contains_role(&acl, "*"));

        let acl = vec!["admin".to_string()];
        assert!(contains_role(&acl, "admin"));
        assert!(!contains_role(&acl, "guest"));
        assert!(!contains_role(&[], "admin"));
    }

    #[test]
    fn test_role_entitlements_in_order() {
        let r1 = role_resource(&role("r1", &["edit_x"], &["view_y"]), &local()).unwrap();
        let entitlements = role_entitlements(&r1);

        let slugs: Vec<&str> = entitlements.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["member", "edit_x", "view_y"]);

        assert_eq!(entitlements[0].purpose, EntitlementPurpose::Assignment);
        assert_eq!(entitlements[0].display_name, "R1 role");
        assert_eq!(entitlements[0].description, "R1 Splunk role");
        assert_eq!(entitlements[0].grantable_to, vec!["user"]);
        assert_eq!(entitlements[1].purpose, EntitlementPurpose::Permission);
        assert_eq!(entitlements[1].id, "role:r1:edit_x");
    }

    #[test]
    fn test_application_entitlements() {
        let entitlements = application_entitlements(&app1());
        let names: Vec<&str> = entitlements.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["App1 application READ", "App1 application WRITE"]);
        assert_eq!(entitlements[0].id, "application:app1:read");
    }

    #[test]
    fn test_deployment_entitlements_flatten_entries() {
        let deployment = deployment_resource(&Tenant::Local, false);
        let capabilities: Vec<Capability> = serde_json::from_value(json!([
            { "name": "capabilities", "content": { "capabilities": ["admin_all_objects", "search"] } }
        ]))
        .unwrap();

        let entitlements = deployment_entitlements(&deployment, &capabilities);
        assert_eq!(entitlements.len(), 2);
        assert_eq!(entitlements[1].id, "deployment:localhost:search");
        assert_eq!(entitlements[1].display_name, "search capability");
        assert_eq!(entitlements[1].grantable_to, vec!["role"]);
    }

    #[test]
    fn test_role_member_grants_recheck_membership() {
        let admin = role_resource(&role("admin", &[], &[]), &local()).unwrap();
        let users = vec![
            user("alice", &["admin", "user"]),
            // loose hit from the backend search
            user("bob", &["admin_reader"]),
        ];

        let grants = role_member_grants(&admin, &users);
        assert_eq!(
            grant_pairs(&grants),
            vec![("member".to_string(), "alice".to_string())]
        );
        assert_eq!(grants[0].id, "role:admin:member:user:alice");
    }

    #[test]
    fn test_application_grants_wildcard() {
        let users = vec![user("u1", &["admin"]), user("u2", &["guest"])];
        let grants = application_grants(&app1(), &users);

        let pairs = grant_pairs(&grants);
        assert!(pairs.contains(&("read".into(), "u1".into())));
        assert!(pairs.contains(&("write".into(), "u1".into())));
        assert!(pairs.contains(&("write".into(), "u2".into())));
        assert!(!pairs.contains(&("read".into(), "u2".into())));
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn test_application_grants_once_per_permission() {
        let users = vec![user("u1", &["admin", "power", "user"])];
        let grants = application_grants(&app1(), &users);
        assert_eq!(grants.len(), 2);
    }

    #[test]
    fn test_deployment_capability_grants_use_own_capabilities() {
        let deployment = deployment_resource(&Tenant::Local, false);
        let roles = vec![
            role("r1", &["capX", "capY"], &["imported_only"]),
            role("r2", &["capX"], &[]),
        ];

        let grants = deployment_capability_grants(&deployment, &roles);
        assert_eq!(
            grant_pairs(&grants),
            vec![
                ("capX".to_string(), "r1".to_string()),
                ("capY".to_string(), "r1".to_string()),
                ("capX".to_string(), "r2".to_string()),
            ]
        );
        assert_eq!(grants[0].id, "deployment:localhost:capX:role:r1");
    }

    #[test]
    fn test_principals_share_the_holder_deployment() {
        let acme = ResourceId::new("deployment", "acme");
        let admin = role_resource(&role("admin", &["capX"], &[]), &acme).unwrap();

        let grants = role_member_grants(&admin, &[user("alice", &["admin"])]);
        assert_eq!(
            grants[0].principal,
            ResourceId::new("user", "alice").with_scope("acme")
        );

        let deployment = deployment_resource(&Tenant::Named("acme".into()), true);
        let grants = deployment_capability_grants(&deployment, &[role("admin", &["capX"], &[])]);
        assert_eq!(grants[0].principal, admin.id);
    }

    #[test]
    fn test_unmappable_principals_are_skipped() {
        let admin = role_resource(&role("admin", &[], &[]), &local()).unwrap();
        let mut broken = user("broken", &["admin"]);
        broken.id = "broken".to_string();

        let grants = role_member_grants(&admin, &[broken, user("alice", &["admin"])]);
        assert_eq!(grants.len(), 1);
    }
}
