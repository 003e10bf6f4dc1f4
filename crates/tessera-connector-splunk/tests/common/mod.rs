//! Shared fixtures for the Splunk connector integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use tessera_connector::config::AuthConfig;
use tessera_connector::resource::ResourceId;
use tessera_connector_splunk::graph::{deployment_resource, role_resource, SplunkResource};
use tessera_connector_splunk::models::Role;
use tessera_connector_splunk::{SplunkConfig, Tenant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";

/// Config addressing `<server>/<deployment>` for every deployment.
pub fn config(server: &MockServer) -> SplunkConfig {
    SplunkConfig::new(AuthConfig::bearer(TOKEN))
        .with_url_template(format!("{}/{{deployment}}", server.uri()))
}

pub fn local_deployment() -> SplunkResource {
    deployment_resource(&Tenant::Local, false)
}

pub fn local_id() -> ResourceId {
    local_deployment().id
}

pub fn user_json(name: &str, roles: &[&str]) -> Value {
    json!({
        "id": format!("https://localhost:8089/services/authentication/users/{name}"),
        "name": name,
        "content": {
            "email": format!("{name}@example.com"),
            "roles": roles,
            "capabilities": []
        }
    })
}

pub fn role_json(name: &str, capabilities: &[&str], imported: &[&str]) -> Value {
    json!({
        "id": format!("https://localhost:8089/services/authorization/roles/{name}"),
        "name": name,
        "content": {
            "capabilities": capabilities,
            "imported_capabilities": imported
        }
    })
}

pub fn app_json(name: &str, read: &[&str], write: &[&str]) -> Value {
    json!({
        "id": format!("https://localhost:8089/services/apps/local/{name}"),
        "name": name,
        "content": { "description": format!("{name} app") },
        "acl": { "app": "system", "perms": { "read": read, "write": write } }
    })
}

/// Listing envelope.
pub fn listing(entry: Vec<Value>, total: u64, per_page: u64, offset: u64) -> Value {
    json!({
        "entry": entry,
        "paging": { "total": total, "perPage": per_page, "offset": offset }
    })
}

/// Listing envelope holding every record on one page.
pub fn single_page(entry: Vec<Value>) -> Value {
    let total = entry.len() as u64;
    listing(entry, total, 50, 0)
}

/// Role resource under the local deployment.
pub fn role_resource_for(value: Value) -> SplunkResource {
    let role: Role = serde_json::from_value(value).unwrap();
    role_resource(&role, &local_id()).unwrap()
}

/// Serve `body` for every GET of `at`.
pub async fn mount_get(server: &MockServer, at: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
