//! Splunk management API client.
//!
//! [`SplunkClient`] owns the HTTP connection pool and the credential.
//! Requests are always scoped to one deployment through a [`TenantClient`]
//! handle, so a single client can serve any number of deployments at once.
//!
//! Nothing here retries. Errors surface on the first failure and the caller
//! owns retry policy; dropping a request future cancels it.

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tessera_connector::error::{ConnectorError, ConnectorResult};
use tracing::{debug, instrument};
use url::Url;

use crate::config::SplunkConfig;
use crate::models::{Application, Capability, ErrorResponse, ListResponse, Role, User};
use crate::tenant::Tenant;

pub const USERS_PATH: &str = "/services/authentication/users";
pub const ROLES_PATH: &str = "/services/authorization/roles";
pub const APPLICATIONS_PATH: &str = "/services/apps/local";
pub const CAPABILITIES_PATH: &str = "/services/authorization/grantable_capabilities/capabilities";

/// Largest error body kept in a [`ConnectorError::Backend`] message.
const MAX_ERROR_BODY: usize = 512;

/// Page of a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Records per page, sent as `count`.
    pub limit: u32,
    /// Zero-based page index, sent as `offset`.
    pub offset: u64,
}

impl PageRequest {
    pub fn new(limit: u32, offset: u64) -> Self {
        Self { limit, offset }
    }
}

/// One page of records plus the index of the page after it.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub records: Vec<T>,
    pub next_offset: Option<u64>,
}

/// Splunk management API client.
pub struct SplunkClient {
    http_client: reqwest::Client,
    config: SplunkConfig,
    auth_header: SecretString,
}

impl std::fmt::Debug for SplunkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplunkClient")
            .field("cloud", &self.config.cloud)
            .field("url_template", &self.config.url_template)
            .finish_non_exhaustive()
    }
}

impl SplunkClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &SplunkConfig) -> ConnectorResult<Self> {
        config.tls.validate_security();

        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connection.connection_timeout())
            .danger_accept_invalid_certs(!config.tls.verify_certificate);
        if let Some(timeout) = config.connection.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let http_client = builder
            .build()
            .map_err(|e| {
                ConnectorError::invalid_configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            http_client,
            auth_header: SecretString::from(config.auth.header_value()),
            config: config.clone(),
        })
    }

    /// Handle scoped to one deployment.
    pub fn tenant(&self, tenant: &Tenant) -> TenantClient<'_> {
        TenantClient {
            client: self,
            base_url: self.config.base_url(tenant),
            tenant: tenant.clone(),
        }
    }

    pub fn config(&self) -> &SplunkConfig {
        &self.config
    }

    /// First page request with the configured page size.
    pub fn page(&self, offset: u64) -> PageRequest {
        PageRequest::new(self.config.page_size, offset)
    }

    fn auth_value(&self) -> ConnectorResult<HeaderValue> {
        let mut value = HeaderValue::from_str(self.auth_header.expose_secret()).map_err(|_| {
            ConnectorError::invalid_configuration("credential is not a valid header value")
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

/// Client handle bound to a single deployment.
#[derive(Debug, Clone)]
pub struct TenantClient<'a> {
    client: &'a SplunkClient,
    tenant: Tenant,
    base_url: String,
}

impl TenantClient<'_> {
    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Users, optionally restricted to holders of `role_filter`.
    #[instrument(skip(self), fields(tenant = %self.tenant))]
    pub async fn list_users(
        &self,
        page: PageRequest,
        role_filter: Option<&str>,
    ) -> ConnectorResult<Listing<User>> {
        let search = role_filter.map(|role| format!("roles=\"{role}\""));
        self.list(USERS_PATH, page, search.as_deref()).await
    }

    #[instrument(skip(self), fields(tenant = %self.tenant))]
    pub async fn list_roles(&self, page: PageRequest) -> ConnectorResult<Listing<Role>> {
        self.list(ROLES_PATH, page, None).await
    }

    #[instrument(skip(self), fields(tenant = %self.tenant))]
    pub async fn list_applications(
        &self,
        page: PageRequest,
    ) -> ConnectorResult<Listing<Application>> {
        self.list(APPLICATIONS_PATH, page, None).await
    }

    /// Grantable capabilities. Each entry carries a list of names.
    #[instrument(skip(self), fields(tenant = %self.tenant))]
    pub async fn list_capabilities(
        &self,
        page: PageRequest,
    ) -> ConnectorResult<Listing<Capability>> {
        self.list(CAPABILITIES_PATH, page, None).await
    }

    #[instrument(skip(self), fields(tenant = %self.tenant))]
    pub async fn get_user(&self, user_id: &str) -> ConnectorResult<User> {
        self.get_one(USERS_PATH, user_id).await
    }

    #[instrument(skip(self), fields(tenant = %self.tenant))]
    pub async fn get_role(&self, role_id: &str) -> ConnectorResult<Role> {
        self.get_one(ROLES_PATH, role_id).await
    }

    #[instrument(skip(self), fields(tenant = %self.tenant))]
    pub async fn get_application(&self, name: &str) -> ConnectorResult<Application> {
        self.get_one(APPLICATIONS_PATH, name).await
    }

    /// Replace a user's complete role list.
    #[instrument(skip(self), fields(tenant = %self.tenant))]
    pub async fn update_user_roles(&self, user_id: &str, roles: &[String]) -> ConnectorResult<()> {
        let url = self.record_url(USERS_PATH, user_id)?;
        self.post_form(url, "roles", roles).await
    }

    /// Replace a role's complete own-capability list.
    #[instrument(skip(self), fields(tenant = %self.tenant))]
    pub async fn update_role_capabilities(
        &self,
        role_id: &str,
        capabilities: &[String],
    ) -> ConnectorResult<()> {
        let url = self.record_url(ROLES_PATH, role_id)?;
        self.post_form(url, "capabilities", capabilities).await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        page: PageRequest,
        search: Option<&str>,
    ) -> ConnectorResult<Listing<T>> {
        let mut url = self.url(path)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("output_mode", "json");
            query.append_pair("count", &page.limit.to_string());
            query.append_pair("offset", &page.offset.to_string());
            if let Some(search) = search {
                query.append_pair("search", search);
            }
        }

        let response: ListResponse<T> = self.get_json(url).await?;
        let next_offset = response.paging.next_offset();
        debug!(
            path = %path,
            records = response.entry.len(),
            total = response.paging.total,
            next_offset = ?next_offset,
            "Listed page"
        );

        Ok(Listing {
            records: response.entry,
            next_offset,
        })
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str, id: &str) -> ConnectorResult<T> {
        let mut url = self.record_url(path, id)?;
        url.query_pairs_mut().append_pair("output_mode", "json");

        let response: ListResponse<T> = self.get_json(url).await?;
        response
            .entry
            .into_iter()
            .next()
            .ok_or_else(|| ConnectorError::ObjectNotFound {
                identifier: format!("{path}/{id}"),
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ConnectorResult<T> {
        debug!(url = %url, "GET");

        let response = self
            .client
            .http_client
            .get(url.clone())
            .header(AUTHORIZATION, self.client.auth_value()?)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| ConnectorError::network_with_source(format!("GET {} failed", url.path()), e))?;

        let response = check_status(response).await?;
        let body = response.bytes().await.map_err(|e| {
            ConnectorError::network_with_source(format!("reading {} failed", url.path()), e)
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            ConnectorError::decode_with_source(format!("unexpected body from {}", url.path()), e)
        })
    }

    async fn post_form(&self, mut url: Url, key: &str, values: &[String]) -> ConnectorResult<()> {
        url.query_pairs_mut().append_pair("output_mode", "json");

        // The serializer is not Send; it must be gone before the await.
        let body = {
            let mut form = url::form_urlencoded::Serializer::new(String::new());
            for value in values {
                form.append_pair(key, value);
            }
            form.finish()
        };

        debug!(url = %url, values = values.len(), "POST");

        let response = self
            .client
            .http_client
            .post(url.clone())
            .header(AUTHORIZATION, self.client.auth_value()?)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                ConnectorError::network_with_source(format!("POST {} failed", url.path()), e)
            })?;

        check_status(response).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> ConnectorResult<Url> {
        Url::parse(&format!("{}{path}", self.base_url)).map_err(|e| {
            ConnectorError::invalid_configuration(format!(
                "invalid base URL {} for deployment {}: {e}",
                self.base_url, self.tenant
            ))
        })
    }

    /// URL of one record. Record ids arrive already percent-encoded, so
    /// existing escapes are kept and only reserved characters are encoded.
    fn record_url(&self, path: &str, id: &str) -> ConnectorResult<Url> {
        if id.is_empty() || id.contains('/') {
            return Err(ConnectorError::InvalidData {
                message: format!("invalid record id {id:?}"),
            });
        }

        let mut url = self.url(path)?;
        let record_path = format!("{}/{id}", url.path().trim_end_matches('/'));
        url.set_path(&record_path);
        Ok(url)
    }
}

/// Map statuses of 300 and above to [`ConnectorError::Backend`].
async fn check_status(response: reqwest::Response) -> ConnectorResult<reqwest::Response> {
    let status = response.status();
    if status.as_u16() < 300 {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|e| e.summary())
        .unwrap_or_else(|| {
            let mut text: String = body.chars().take(MAX_ERROR_BODY).collect();
            if text.trim().is_empty() {
                text = status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string();
            }
            text
        });

    Err(ConnectorError::Backend {
        status: status.as_u16(),
        message,
    })
}
