//! Access graph types
//!
//! Resources are nodes, entitlements are the permissions a resource offers,
//! and grants connect a principal resource to an entitlement. All three are
//! generic over a connector-specific profile type.

use serde::{Deserialize, Serialize};

/// Behavioural traits a resource type can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTrait {
    /// A human or service principal.
    User,
    /// A collection of principals.
    Role,
    /// An application with its own access list.
    App,
}

/// Side-band hints attached to resource types, resources and pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// Resources of this type neither offer entitlements nor receive grants
    /// through their own syncer.
    SkipEntitlementsAndGrants,
    /// The resource is the parent of resources of another type.
    ChildResourceType { resource_type_id: String },
}

/// Descriptor of a kind of resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub traits: Vec<ResourceTrait>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl ResourceType {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            traits: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_trait(mut self, resource_trait: ResourceTrait) -> Self {
        self.traits.push(resource_trait);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Whether the sync driver should skip entitlement and grant listing.
    pub fn skips_entitlements_and_grants(&self) -> bool {
        self.annotations
            .contains(&Annotation::SkipEntitlementsAndGrants)
    }
}

/// Typed reference to a resource.
///
/// Backend ids are often only unique within a container such as a tenant.
/// Such ids carry the container as `scope`, which takes part in equality but
/// not in the `type:id` display form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId {
    pub resource_type: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource: resource.into(),
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.resource)
    }
}

/// A node in the access graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<P> {
    pub id: ResourceId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ResourceId>,
    pub profile: P,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl<P> Resource<P> {
    pub fn new(id: ResourceId, display_name: impl Into<String>, profile: P) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            parent: None,
            profile,
            annotations: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: ResourceId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Advertise that resources of `resource_type_id` live under this one.
    pub fn with_child_type(mut self, resource_type_id: impl Into<String>) -> Self {
        self.annotations.push(Annotation::ChildResourceType {
            resource_type_id: resource_type_id.into(),
        });
        self
    }

    /// Child resource types advertised by this resource, in order.
    pub fn child_resource_types(&self) -> impl Iterator<Item = &str> {
        self.annotations.iter().filter_map(|annotation| match annotation {
            Annotation::ChildResourceType { resource_type_id } => Some(resource_type_id.as_str()),
            _ => None,
        })
    }
}

/// What holding an entitlement means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitlementPurpose {
    /// Membership in the resource.
    Assignment,
    /// A permission on the resource.
    Permission,
}

/// A permission offered by a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entitlement<P> {
    /// `"{resource_type}:{resource_id}:{slug}"`.
    pub id: String,
    pub resource: Resource<P>,
    pub slug: String,
    pub display_name: String,
    pub description: String,
    pub purpose: EntitlementPurpose,
    /// Resource types whose resources may hold this entitlement.
    pub grantable_to: Vec<String>,
}

impl<P> Entitlement<P> {
    pub fn new(resource: Resource<P>, slug: impl Into<String>, purpose: EntitlementPurpose) -> Self {
        let slug = slug.into();
        Self {
            id: format!(
                "{}:{}:{}",
                resource.id.resource_type, resource.id.resource, slug
            ),
            resource,
            display_name: slug.clone(),
            description: String::new(),
            slug,
            purpose,
            grantable_to: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn grantable_to(mut self, resource_type_id: impl Into<String>) -> Self {
        self.grantable_to.push(resource_type_id.into());
        self
    }
}

/// Edge stating that a principal currently holds an entitlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant<P> {
    /// `"{entitlement_id}:{principal_type}:{principal_id}"`.
    pub id: String,
    pub entitlement: Entitlement<P>,
    pub principal: ResourceId,
}

impl<P> Grant<P> {
    pub fn new(entitlement: Entitlement<P>, principal: ResourceId) -> Self {
        Self {
            id: format!(
                "{}:{}:{}",
                entitlement.id, principal.resource_type, principal.resource
            ),
            entitlement,
            principal,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token; empty when the listing is complete.
    pub next_token: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: next_token.into(),
            annotations: Vec::new(),
        }
    }

    /// Empty, final page.
    pub fn empty() -> Self {
        Self::new(Vec::new(), String::new())
    }

    pub fn is_last(&self) -> bool {
        self.next_token.is_empty()
    }
}
