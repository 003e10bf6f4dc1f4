//! Connector Framework configuration types
//!
//! Connection, TLS and credential settings shared across connectors.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ConnectorResult};

/// Common connection settings shared across connector types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Connection timeout in seconds.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Whole-request timeout in seconds. Unset means requests run until the
    /// caller's own deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_connection_timeout() -> u64 {
    30
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_timeout_secs: default_connection_timeout(),
            request_timeout_secs: None,
        }
    }
}

impl ConnectionSettings {
    /// Create new connection settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection timeout.
    pub fn with_connection_timeout(mut self, secs: u64) -> Self {
        self.connection_timeout_secs = secs;
        self
    }

    /// Bound every request to `secs` seconds.
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    pub fn connection_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        self.request_timeout_secs.map(std::time::Duration::from_secs)
    }
}

/// TLS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Whether to verify the server certificate.
    #[serde(default = "default_true")]
    pub verify_certificate: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify_certificate: true,
        }
    }
}

impl TlsConfig {
    /// TLS config that accepts any server certificate.
    ///
    /// Management ports commonly serve self-signed certificates; this exists
    /// for those deployments and logs a warning when validated.
    pub fn accept_invalid_certs() -> Self {
        Self {
            verify_certificate: false,
        }
    }

    /// Log a security warning when certificate verification is disabled.
    ///
    /// Call after loading TLS settings from an external source.
    pub fn validate_security(&self) {
        if !self.verify_certificate {
            tracing::warn!(
                target: "security",
                "SECURITY WARNING: TLS certificate verification is DISABLED. \
                 Connections are open to Man-in-the-Middle attacks."
            );
        }
    }
}

/// Authentication method configuration.
///
/// A single credential header is built once per run and reused for every
/// request.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Basic authentication (username/password).
    Basic { username: String, password: String },

    /// Bearer token authentication.
    Bearer { token: String },
}

impl AuthConfig {
    /// Create basic authentication config.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthConfig::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create bearer token authentication config.
    pub fn bearer(token: impl Into<String>) -> Self {
        AuthConfig::Bearer {
            token: token.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        match self {
            AuthConfig::Bearer { token } => format!("Bearer {token}"),
            AuthConfig::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
        }
    }

    /// Reject credentials that cannot authenticate anything.
    pub fn validate(&self) -> ConnectorResult<()> {
        match self {
            AuthConfig::Bearer { token } if token.trim().is_empty() => Err(
                ConnectorError::invalid_configuration("bearer token must not be empty"),
            ),
            AuthConfig::Basic { username, .. } if username.trim().is_empty() => Err(
                ConnectorError::invalid_configuration("basic auth username must not be empty"),
            ),
            _ => Ok(()),
        }
    }

    /// Create a redacted version.
    pub fn redacted(&self) -> Self {
        match self {
            AuthConfig::Basic { username, .. } => AuthConfig::Basic {
                username: username.clone(),
                password: "***REDACTED***".to_string(),
            },
            AuthConfig::Bearer { .. } => AuthConfig::Bearer {
                token: "***REDACTED***".to_string(),
            },
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.redacted() {
            AuthConfig::Basic { username, password } => f
                .debug_struct("Basic")
                .field("username", &username)
                .field("password", &password)
                .finish(),
            AuthConfig::Bearer { token } => {
                f.debug_struct("Bearer").field("token", &token).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_settings_defaults() {
        let settings = ConnectionSettings::default();
        assert_eq!(settings.connection_timeout_secs, 30);
        assert_eq!(settings.request_timeout_secs, None);
        assert_eq!(settings.request_timeout(), None);
    }

    #[test]
    fn test_connection_settings_builder() {
        let settings = ConnectionSettings::new()
            .with_connection_timeout(5)
            .with_request_timeout(10);

        assert_eq!(settings.connection_timeout(), std::time::Duration::from_secs(5));
        assert_eq!(
            settings.request_timeout(),
            Some(std::time::Duration::from_secs(10))
        );
    }

    #[test]
    fn test_tls_config_defaults_to_verify() {
        assert!(TlsConfig::default().verify_certificate);
        assert!(!TlsConfig::accept_invalid_certs().verify_certificate);
    }

    #[test]
    fn test_bearer_header() {
        let auth = AuthConfig::bearer("abc123");
        assert_eq!(auth.header_value(), "Bearer abc123");
    }

    #[test]
    fn test_basic_header() {
        let auth = AuthConfig::basic("admin", "changeme");
        // base64("admin:changeme")
        assert_eq!(auth.header_value(), "Basic YWRtaW46Y2hhbmdlbWU=");
    }

    #[test]
    fn test_auth_validate() {
        assert!(AuthConfig::bearer("t").validate().is_ok());
        assert!(AuthConfig::bearer("  ").validate().is_err());
        assert!(AuthConfig::basic("", "pw").validate().is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let auth = AuthConfig::basic("admin", "secret");
        let debug = format!("{auth:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("secret"));
        assert!(debug.contains("***REDACTED***"));
    }

    #[test]
    fn test_auth_config_serialization() {
        let json = serde_json::to_string(&AuthConfig::bearer("tok")).unwrap();
        assert!(json.contains("\"type\":\"bearer\""));

        let parsed: AuthConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.header_value(), "Bearer tok");
    }
}
