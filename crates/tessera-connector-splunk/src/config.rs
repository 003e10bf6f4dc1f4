//! Splunk connector configuration.

use serde::Deserialize;
use tessera_connector::config::{AuthConfig, ConnectionSettings, TlsConfig};
use tessera_connector::error::ConnectorError;

use crate::tenant::{Tenant, LOCALHOST};

/// Placeholder substituted with the deployment address in `url_template`.
pub const DEPLOYMENT_PLACEHOLDER: &str = "{deployment}";

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Management API port on both on-premise and cloud deployments.
pub const MANAGEMENT_PORT: u16 = 8089;

/// Configuration for the Splunk connector.
#[derive(Debug, Clone, Deserialize)]
pub struct SplunkConfig {
    /// Credential sent with every request.
    pub auth: AuthConfig,

    #[serde(default)]
    pub tls: TlsConfig,

    #[serde(default)]
    pub connection: ConnectionSettings,

    /// Use `*.splunkcloud.com` endpoints.
    #[serde(default)]
    pub cloud: bool,

    /// Emit deployment capability entitlements and grants.
    #[serde(default)]
    pub verbose: bool,

    /// Deployments to sync. Empty means the local instance only.
    #[serde(default)]
    pub deployments: Vec<String>,

    /// Base URL with a `{deployment}` placeholder, overriding the derived one.
    #[serde(default)]
    pub url_template: Option<String>,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl SplunkConfig {
    /// Configuration with defaults for everything but the credential.
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            auth,
            tls: TlsConfig::default(),
            connection: ConnectionSettings::default(),
            cloud: false,
            verbose: false,
            deployments: Vec::new(),
            url_template: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_cloud(mut self, cloud: bool) -> Self {
        self.cloud = cloud;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_deployments<I, S>(mut self, deployments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deployments = deployments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = Some(template.into());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// This allows tests to supply variables without mutating process-global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let token = reader("SPLUNK_TOKEN").ok().filter(|v| !v.is_empty());
        let username = reader("SPLUNK_USERNAME").ok().filter(|v| !v.is_empty());

        let auth = match (token, username) {
            (Some(token), _) => AuthConfig::bearer(token),
            (None, Some(username)) => {
                let password = reader("SPLUNK_PASSWORD").unwrap_or_default();
                AuthConfig::basic(username, password)
            }
            (None, None) => return Err(ConfigError::MissingVar("SPLUNK_TOKEN".into())),
        };

        let unsafe_tls = read_bool(&reader, "SPLUNK_UNSAFE")?;
        let tls = if unsafe_tls {
            TlsConfig::accept_invalid_certs()
        } else {
            TlsConfig::default()
        };

        let deployments = reader("SPLUNK_DEPLOYMENTS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let page_size = match reader("SPLUNK_PAGE_SIZE") {
            Ok(raw) => raw.parse::<u32>().map_err(|e| {
                ConfigError::InvalidValue("SPLUNK_PAGE_SIZE".into(), e.to_string())
            })?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        let config = Self {
            auth,
            tls,
            connection: ConnectionSettings::default(),
            cloud: read_bool(&reader, "SPLUNK_CLOUD")?,
            verbose: read_bool(&reader, "SPLUNK_VERBOSE")?,
            deployments,
            url_template: reader("SPLUNK_URL_TEMPLATE").ok().filter(|v| !v.is_empty()),
            page_size,
        };
        config.validate()?;

        Ok(config)
    }

    /// Check the configuration for values that can never work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.cloud && self.deployments.is_empty() {
            return Err(ConfigError::Invalid(
                "cloud mode requires at least one deployment".into(),
            ));
        }

        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue(
                "SPLUNK_PAGE_SIZE".into(),
                "must be greater than zero".into(),
            ));
        }

        if let Some(template) = &self.url_template {
            if !template.contains(DEPLOYMENT_PLACEHOLDER) {
                return Err(ConfigError::InvalidValue(
                    "SPLUNK_URL_TEMPLATE".into(),
                    format!("must contain {DEPLOYMENT_PLACEHOLDER}"),
                ));
            }
            url::Url::parse(&template.replace(DEPLOYMENT_PLACEHOLDER, LOCALHOST)).map_err(
                |e| ConfigError::InvalidValue("SPLUNK_URL_TEMPLATE".into(), e.to_string()),
            )?;
        }

        Ok(())
    }

    /// Tenants to sync: the configured deployments, or the local instance.
    pub fn tenants(&self) -> Vec<Tenant> {
        if self.deployments.is_empty() {
            vec![Tenant::Local]
        } else {
            self.deployments
                .iter()
                .map(|d| Tenant::from_resource_id(d))
                .collect()
        }
    }

    /// Base URL of a tenant's management API, without a trailing slash.
    pub fn base_url(&self, tenant: &Tenant) -> String {
        let base = match &self.url_template {
            Some(template) => template.replace(DEPLOYMENT_PLACEHOLDER, tenant.address()),
            None if self.cloud => format!(
                "https://{}.splunkcloud.com:{MANAGEMENT_PORT}",
                tenant.address()
            ),
            None => format!("https://{}:{MANAGEMENT_PORT}", tenant.address()),
        };
        base.trim_end_matches('/').to_string()
    }
}

fn read_bool<F>(reader: &F, key: &str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    match reader(key) {
        Ok(raw) if raw.is_empty() => Ok(false),
        Ok(raw) => raw
            .parse::<bool>()
            .map_err(|e| ConfigError::InvalidValue(key.into(), e.to_string())),
        Err(_) => Ok(false),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for ConnectorError {
    fn from(err: ConfigError) -> Self {
        ConnectorError::invalid_configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env::VarError;

    /// Create a reader closure from a HashMap (no global env mutation).
    fn make_reader(vars: HashMap<&str, &str>) -> impl Fn(&str) -> Result<String, VarError> {
        let owned: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| owned.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn test_missing_credentials() {
        let err = SplunkConfig::from_reader(make_reader(HashMap::new())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
        assert!(err.to_string().contains("SPLUNK_TOKEN"));
    }

    #[test]
    fn test_defaults() {
        let config =
            SplunkConfig::from_reader(make_reader(HashMap::from([("SPLUNK_TOKEN", "tok")])))
                .expect("should succeed with defaults");

        assert_eq!(config.auth.header_value(), "Bearer tok");
        assert!(!config.cloud);
        assert!(!config.verbose);
        assert!(config.tls.verify_certificate);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.tenants(), vec![Tenant::Local]);
    }

    #[test]
    fn test_token_wins_over_basic() {
        let config = SplunkConfig::from_reader(make_reader(HashMap::from([
            ("SPLUNK_TOKEN", "tok"),
            ("SPLUNK_USERNAME", "admin"),
            ("SPLUNK_PASSWORD", "pw"),
        ])))
        .unwrap();
        assert_eq!(config.auth.header_value(), "Bearer tok");
    }

    #[test]
    fn test_basic_credentials() {
        let config = SplunkConfig::from_reader(make_reader(HashMap::from([
            ("SPLUNK_USERNAME", "admin"),
            ("SPLUNK_PASSWORD", "changeme"),
        ])))
        .unwrap();
        assert_eq!(config.auth.header_value(), "Basic YWRtaW46Y2hhbmdlbWU=");
    }

    #[test]
    fn test_custom_values() {
        let config = SplunkConfig::from_reader(make_reader(HashMap::from([
            ("SPLUNK_TOKEN", "tok"),
            ("SPLUNK_UNSAFE", "true"),
            ("SPLUNK_VERBOSE", "true"),
            ("SPLUNK_CLOUD", "true"),
            ("SPLUNK_DEPLOYMENTS", "acme, globex ,"),
            ("SPLUNK_PAGE_SIZE", "10"),
        ])))
        .unwrap();

        assert!(!config.tls.verify_certificate);
        assert!(config.verbose);
        assert!(config.cloud);
        assert_eq!(config.page_size, 10);
        assert_eq!(
            config.tenants(),
            vec![Tenant::Named("acme".into()), Tenant::Named("globex".into())]
        );
    }

    #[test]
    fn test_cloud_requires_deployments() {
        let err = SplunkConfig::from_reader(make_reader(HashMap::from([
            ("SPLUNK_TOKEN", "tok"),
            ("SPLUNK_CLOUD", "true"),
        ])))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("cloud mode"));
    }

    #[test]
    fn test_invalid_page_size() {
        for raw in ["0", "many"] {
            let err = SplunkConfig::from_reader(make_reader(HashMap::from([
                ("SPLUNK_TOKEN", "tok"),
                ("SPLUNK_PAGE_SIZE", raw),
            ])))
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue(..)));
            assert!(err.to_string().contains("SPLUNK_PAGE_SIZE"));
        }
    }

    #[test]
    fn test_invalid_bool() {
        let err = SplunkConfig::from_reader(make_reader(HashMap::from([
            ("SPLUNK_TOKEN", "tok"),
            ("SPLUNK_VERBOSE", "yes please"),
        ])))
        .unwrap_err();
        assert!(err.to_string().contains("SPLUNK_VERBOSE"));
    }

    #[test]
    fn test_url_template_needs_placeholder() {
        let err = SplunkConfig::from_reader(make_reader(HashMap::from([
            ("SPLUNK_TOKEN", "tok"),
            ("SPLUNK_URL_TEMPLATE", "http://127.0.0.1:8089"),
        ])))
        .unwrap_err();
        assert!(err.to_string().contains("SPLUNK_URL_TEMPLATE"));
    }

    #[test]
    fn test_base_urls() {
        let on_prem = SplunkConfig::new(AuthConfig::bearer("t"));
        assert_eq!(on_prem.base_url(&Tenant::Local), "https://localhost:8089");
        assert_eq!(
            on_prem.base_url(&Tenant::Named("10.0.0.5".into())),
            "https://10.0.0.5:8089"
        );

        let cloud = SplunkConfig::new(AuthConfig::bearer("t"))
            .with_cloud(true)
            .with_deployments(["acme"]);
        assert_eq!(
            cloud.base_url(&Tenant::Named("acme".into())),
            "https://acme.splunkcloud.com:8089"
        );

        let templated = SplunkConfig::new(AuthConfig::bearer("t"))
            .with_url_template("http://127.0.0.1:9000/{deployment}/");
        assert_eq!(
            templated.base_url(&Tenant::Local),
            "http://127.0.0.1:9000/localhost"
        );
    }

    #[test]
    fn test_config_debug_hides_credentials() {
        let config = SplunkConfig::new(AuthConfig::bearer("super-secret"));
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[test]
    fn test_config_error_into_connector_error() {
        let err: ConnectorError = ConfigError::MissingVar("SPLUNK_TOKEN".into()).into();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }
}
