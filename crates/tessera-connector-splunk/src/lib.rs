//! # Splunk Connector
//!
//! Syncs Splunk deployments, users, roles, applications and capabilities into
//! the access graph, and grants or revokes role membership and capabilities.
//!
//! ## Resource tree
//!
//! - `deployment` - one per configured deployment, or the local instance
//!   - `role` - offers `member` plus one entitlement per effective capability
//!   - `user` - principal only
//!   - `application` - offers `read` and `write` (on premise only)
//!
//! In verbose mode each deployment also offers every grantable capability,
//! granted to the roles that hold it directly.
//!
//! ## Example
//!
//! ```ignore
//! use tessera_connector::prelude::*;
//! use tessera_connector_splunk::{SplunkConfig, SplunkConnector};
//!
//! let config = SplunkConfig::from_env()?;
//! let connector = SplunkConnector::new(&config)?;
//! connector.validate().await?;
//!
//! let graph = SyncDriver::new(connector.resource_syncers()).run().await?;
//! ```

pub mod client;
pub mod config;
pub mod connector;
pub mod derive;
pub mod graph;
pub mod models;
pub mod mutation;
pub mod profile;
pub mod syncers;
pub mod tenant;

pub use client::{SplunkClient, TenantClient};
pub use config::{ConfigError, SplunkConfig};
pub use connector::SplunkConnector;
pub use profile::SplunkProfile;
pub use tenant::Tenant;
