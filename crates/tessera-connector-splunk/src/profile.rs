//! Typed resource profiles carried on access graph nodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Profile of any Splunk resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplunkProfile {
    Deployment(DeploymentProfile),
    User(UserProfile),
    Role(RoleProfile),
    Application(ApplicationProfile),
}

impl SplunkProfile {
    pub fn as_deployment(&self) -> Option<&DeploymentProfile> {
        match self {
            SplunkProfile::Deployment(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserProfile> {
        match self {
            SplunkProfile::User(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<&RoleProfile> {
        match self {
            SplunkProfile::Role(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn as_application(&self) -> Option<&ApplicationProfile> {
        match self {
            SplunkProfile::Application(profile) => Some(profile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentProfile {
    /// Host address or cloud stack name.
    pub address: String,
    pub cloud: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    /// Role names held.
    pub roles: Vec<String>,
    /// Capabilities held through roles, as reported by Splunk.
    pub capabilities: Vec<String>,
    /// Backend attributes without a typed field.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleProfile {
    pub name: String,
    pub capabilities: Vec<String>,
    pub imported_capabilities: Vec<String>,
}

impl RoleProfile {
    /// Own capabilities followed by imported ones, duplicates kept.
    pub fn effective_capabilities(&self) -> impl Iterator<Item = &str> {
        self.capabilities
            .iter()
            .chain(self.imported_capabilities.iter())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationProfile {
    pub name: String,
    pub description: String,
    /// App namespace owning the ACL.
    pub acl_app: String,
    pub read_roles: Vec<String>,
    pub write_roles: Vec<String>,
}
