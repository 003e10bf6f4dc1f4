//! Connector Framework error types
//!
//! Error definitions with transient/permanent classification. Nothing in the
//! framework retries on its own; the classification is for callers that own
//! retry policy.

use thiserror::Error;

/// Error that can occur during connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Pagination errors
    /// A continuation token could not be decoded.
    #[error("invalid page token: {message}")]
    InvalidCursor { message: String },

    // Transport errors (usually transient)
    /// Network error during communication.
    #[error("network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend answered with a non-success status.
    #[error("backend request failed with status {status}: {message}")]
    Backend { status: u16, message: String },

    /// The backend rejected the configured credentials.
    #[error("unauthenticated: backend returned status {status}")]
    Unauthenticated { status: u16 },

    /// Response body did not match the expected schema.
    #[error("failed to decode response: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Graph construction errors
    /// A record identifier could not be reduced to a stable id.
    #[error("failed to parse resource id: {record_id}")]
    Mapping { record_id: String },

    /// Object not found in target system.
    #[error("object not found: {identifier}")]
    ObjectNotFound { identifier: String },

    /// Invalid data format.
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    /// A grant references a resource that was never listed.
    #[error("grant {grant_id} references a resource that was not listed")]
    DanglingGrant { grant_id: String },

    // Mutation precondition errors
    /// Principal has the wrong resource type for the entitlement.
    #[error("only {expected} principals can hold this entitlement, got {actual}")]
    WrongPrincipalType { expected: String, actual: String },

    /// Principal already holds the entitlement.
    #[error("{entitlement} already granted to {principal}")]
    AlreadyGranted {
        entitlement: String,
        principal: String,
    },

    /// Principal does not hold the entitlement.
    #[error("{entitlement} not granted to {principal}")]
    NotGranted {
        entitlement: String,
        principal: String,
    },

    /// The resource type does not support the requested operation.
    #[error("resource type {resource_type} does not support {operation}")]
    UnsupportedOperation {
        resource_type: String,
        operation: String,
    },

    // Configuration errors (permanent)
    /// Connector configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Internal errors
    /// Internal error.
    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ConnectorError {
    /// Check if this error is transient and the operation may succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::NetworkError { .. } => true,
            ConnectorError::Backend { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Check if this error is permanent and retry won't help.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::InvalidCursor { .. } => "INVALID_CURSOR",
            ConnectorError::NetworkError { .. } => "NETWORK_ERROR",
            ConnectorError::Backend { .. } => "BACKEND_ERROR",
            ConnectorError::Unauthenticated { .. } => "UNAUTHENTICATED",
            ConnectorError::Decode { .. } => "DECODE_ERROR",
            ConnectorError::Mapping { .. } => "MAPPING_ERROR",
            ConnectorError::ObjectNotFound { .. } => "OBJECT_NOT_FOUND",
            ConnectorError::InvalidData { .. } => "INVALID_DATA",
            ConnectorError::DanglingGrant { .. } => "DANGLING_GRANT",
            ConnectorError::WrongPrincipalType { .. } => "WRONG_PRINCIPAL_TYPE",
            ConnectorError::AlreadyGranted { .. } => "ALREADY_GRANTED",
            ConnectorError::NotGranted { .. } => "NOT_GRANTED",
            ConnectorError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ConnectorError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    // Convenience constructors

    /// Create an invalid cursor error.
    pub fn invalid_cursor(message: impl Into<String>) -> Self {
        ConnectorError::InvalidCursor {
            message: message.into(),
        }
    }

    /// Create a network error with source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::NetworkError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a decode error with source.
    pub fn decode_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Decode {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ConnectorError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ConnectorError::Internal {
            message: message.into(),
            source: None,
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
