//! # Connector Framework
//!
//! Core abstractions for syncing external access-control systems into an
//! access graph of resources, entitlements and grants.
//!
//! ## Architecture
//!
//! - [`traits::ResourceSyncer`] - Lists resources of one type, plus the
//!   entitlements they offer and the grants of those entitlements
//! - [`traits::GrantOp`] - Changes who holds an entitlement
//! - [`traits::Connector`] - Connector facade: metadata, credential check and
//!   the set of syncers
//! - [`sync::SyncDriver`] - Pages every syncer to completion
//!
//! ## Example
//!
//! ```ignore
//! use tessera_connector::prelude::*;
//!
//! connector.validate().await?;
//!
//! let graph = SyncDriver::new(connector.resource_syncers()).run().await?;
//! println!("{} grants", graph.grants.len());
//! ```
//!
//! ## Crate Organization
//!
//! - [`error`] - Error types with transient/permanent classification
//! - [`resource`] - Graph types (`ResourceType`, `Resource`, `Entitlement`, `Grant`, `Page`)
//! - [`pagination`] - Opaque multi-level page tokens
//! - [`traits`] - Connector capability traits
//! - [`sync`] - Full sync driver
//! - [`config`] - Shared auth, TLS and connection settings

pub mod config;
pub mod error;
pub mod pagination;
pub mod resource;
pub mod sync;
pub mod traits;

/// Prelude module for convenient imports.
///
/// ```
/// use tessera_connector::prelude::*;
/// ```
pub mod prelude {
    // Error handling
    pub use crate::error::{ConnectorError, ConnectorResult};

    // Graph
    pub use crate::resource::{
        Annotation, Entitlement, EntitlementPurpose, Grant, Page, Resource, ResourceId,
        ResourceTrait, ResourceType,
    };

    // Pagination
    pub use crate::pagination::{PageBag, PageFrame};

    // Traits
    pub use crate::traits::{Connector, ConnectorMetadata, GrantOp, ResourceSyncer};

    // Sync
    pub use crate::sync::{SyncDriver, SyncGraph};

    // Configuration
    pub use crate::config::{AuthConfig, ConnectionSettings, TlsConfig};
}

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _rt = ResourceType::new("user", "User").with_trait(ResourceTrait::User);
        let _id = ResourceId::new("user", "alice");
        let _frame = PageFrame::new("user");
        let _auth = AuthConfig::bearer("token");
        let _page: Page<ResourceId> = Page::empty();
    }
}
