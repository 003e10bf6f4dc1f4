//! Wire models for the Splunk management REST API.
//!
//! Every endpoint answers with the same envelope: an `entry` array of
//! records and a `paging` block. Record ids are full URLs.

use serde::{Deserialize, Deserializer};

/// Response envelope shared by all listing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub entry: Vec<T>,
    #[serde(default)]
    pub paging: Paging,
}

/// Paging block of a listing response.
///
/// `offset` is the zero-based page index of this response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub total: u64,
    #[serde(default, rename = "perPage")]
    pub per_page: u64,
    #[serde(default)]
    pub offset: u64,
}

impl Paging {
    /// Next page index, or `None` when this page is the last.
    pub fn next_offset(&self) -> Option<u64> {
        let next = self.offset.saturating_add(1);
        if next.saturating_mul(self.per_page) < self.total {
            Some(next)
        } else {
            None
        }
    }
}

/// A record addressed by a URL-style id.
pub trait Record {
    fn record_id(&self) -> &str;
}

impl Record for User {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Role {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Application {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Error body returned with non-success statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<ErrorMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorMessage {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl ErrorResponse {
    /// All message texts joined into one line.
    pub fn summary(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .messages
            .iter()
            .map(|m| m.text.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join("; "))
        }
    }
}

/// Access control list attached to every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Acl {
    #[serde(default)]
    pub app: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub perms: Perms,
}

/// Role names allowed to read and write a record. `*` means every role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Perms {
    #[serde(default, deserialize_with = "null_as_default")]
    pub read: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub write: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: UserContent,
    #[serde(default)]
    pub acl: Acl,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Role {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: RoleContent,
    #[serde(default)]
    pub acl: Acl,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub capabilities: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub imported_capabilities: Vec<String>,
}

impl Role {
    /// Own capabilities followed by imported ones, duplicates kept.
    pub fn effective_capabilities(&self) -> Vec<String> {
        self.content
            .capabilities
            .iter()
            .chain(self.content.imported_capabilities.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: ApplicationContent,
    #[serde(default)]
    pub acl: Acl,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Entry of the grantable capabilities listing; one entry carries many names.
#[derive(Debug, Clone, Deserialize)]
pub struct Capability {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: CapabilityContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapabilityContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub capabilities: Vec<String>,
}

/// Splunk sends `null` for empty lists and strings on some records.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_next_offset() {
        let cases = [
            // (total, per_page, offset, expected)
            (120, 50, 0, Some(1)),
            (120, 50, 1, Some(2)),
            (120, 50, 2, None),
            (100, 50, 1, None),
            (100, 50, 0, Some(1)),
            (0, 50, 0, None),
            (5, 0, 0, None),
        ];

        for (total, per_page, offset, expected) in cases {
            let paging = Paging {
                total,
                per_page,
                offset,
            };
            assert_eq!(
                paging.next_offset(),
                expected,
                "total={total} per_page={per_page} offset={offset}"
            );
        }
    }

    #[test]
    fn test_effective_capabilities_keep_duplicates() {
        let role: Role = serde_json::from_value(json!({
            "id": "https://localhost:8089/services/authorization/roles/power",
            "name": "power",
            "content": {
                "capabilities": ["edit_x", "search"],
                "imported_capabilities": ["view_y", "search"]
            }
        }))
        .unwrap();

        assert_eq!(
            role.effective_capabilities(),
            vec!["edit_x", "search", "view_y", "search"]
        );
    }

    #[test]
    fn test_user_decodes_with_nulls() {
        let response: ListResponse<User> = serde_json::from_value(json!({
            "entry": [{
                "id": "https://localhost:8089/services/authentication/users/alice",
                "name": "alice",
                "content": { "email": null, "roles": null },
                "acl": { "app": "", "perms": null }
            }],
            "paging": { "total": 1, "perPage": 30, "offset": 0 }
        }))
        .unwrap();

        let user = &response.entry[0];
        assert_eq!(user.name, "alice");
        assert!(user.content.roles.is_empty());
        assert!(user.acl.perms.read.is_empty());
        assert_eq!(response.paging.per_page, 30);
    }

    #[test]
    fn test_application_acl() {
        let app: Application = serde_json::from_value(json!({
            "id": "https://localhost:8089/servicesNS/nobody/system/apps/local/search",
            "name": "search",
            "content": { "description": "Search app" },
            "acl": { "app": "system", "perms": { "read": ["*"], "write": ["admin", "power"] } }
        }))
        .unwrap();

        assert_eq!(app.acl.perms.read, vec!["*"]);
        assert_eq!(app.acl.perms.write, vec!["admin", "power"]);
        assert_eq!(app.content.description, "Search app");
    }

    #[test]
    fn test_error_response_summary() {
        let body: ErrorResponse = serde_json::from_value(json!({
            "messages": [{ "type": "ERROR", "text": "User does not exist" }]
        }))
        .unwrap();
        assert_eq!(body.summary().as_deref(), Some("User does not exist"));
        assert_eq!(ErrorResponse::default().summary(), None);
    }

    #[test]
    fn test_missing_paging_defaults() {
        let response: ListResponse<Capability> =
            serde_json::from_value(json!({ "entry": [] })).unwrap();
        assert_eq!(response.paging, Paging::default());
        assert_eq!(response.paging.next_offset(), None);
    }
}
