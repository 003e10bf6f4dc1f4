//! Splunk deployments addressed by the connector.

use serde::{Deserialize, Serialize};

/// Address of the deployment used when none are configured.
pub const LOCALHOST: &str = "localhost";

/// One isolated Splunk deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tenant {
    /// The instance on this host, used when no deployments are configured.
    Local,
    /// A cloud stack name or an on-premise host address.
    Named(String),
}

impl Tenant {
    /// Host address or cloud stack name.
    pub fn address(&self) -> &str {
        match self {
            Tenant::Local => LOCALHOST,
            Tenant::Named(name) => name,
        }
    }

    /// Tenant for a deployment resource id.
    pub fn from_resource_id(resource_id: &str) -> Self {
        if resource_id == LOCALHOST {
            Tenant::Local
        } else {
            Tenant::Named(resource_id.to_string())
        }
    }
}

impl std::fmt::Display for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.address())
    }
}
