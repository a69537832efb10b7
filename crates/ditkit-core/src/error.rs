//! Directory access error types
//!
//! A single error enum is shared by the storage contracts, the object view
//! and the directory agent. All failure modes are surfaced to the caller;
//! nothing is swallowed.

use thiserror::Error;

/// Error that can occur while reading or mutating the directory database.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No live object matched the identifier, or DN resolution failed.
    #[error("object not found: {identifier}")]
    ObjectNotFound { identifier: String },

    /// A precondition on the target object failed (wrong object kind,
    /// required attribute missing).
    #[error("invalid operation on object {identifier}: {reason}")]
    ObjectOperation { reason: String, identifier: String },

    /// A caller-supplied argument was rejected before any database work.
    #[error("invalid argument `{param}`: {message}")]
    InvalidArgument {
        param: &'static str,
        message: String,
    },

    /// The operation surface exists but has no behavior.
    #[error("operation not implemented: {operation}")]
    NotImplemented { operation: &'static str },

    /// The schema catalogue has no entry for the requested element.
    #[error("schema element not found: {element}")]
    SchemaElementNotFound { element: String },

    /// A secret blob or PEK list could not be decrypted or decoded.
    #[error("decryption failed: {message}")]
    DecryptionFailed { message: String },

    /// Failure propagated from the cursor/transaction layer.
    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DirectoryError {
    /// Create an object-not-found error from any displayable identifier.
    pub fn object_not_found(identifier: impl std::fmt::Display) -> Self {
        DirectoryError::ObjectNotFound {
            identifier: identifier.to_string(),
        }
    }

    /// Create an object-operation error.
    pub fn object_operation(
        reason: impl Into<String>,
        identifier: impl std::fmt::Display,
    ) -> Self {
        DirectoryError::ObjectOperation {
            reason: reason.into(),
            identifier: identifier.to_string(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(param: &'static str, message: impl Into<String>) -> Self {
        DirectoryError::InvalidArgument {
            param,
            message: message.into(),
        }
    }

    /// Create a not-implemented error.
    #[must_use]
    pub fn not_implemented(operation: &'static str) -> Self {
        DirectoryError::NotImplemented { operation }
    }

    /// Create a schema-element-not-found error.
    pub fn schema_element(element: impl Into<String>) -> Self {
        DirectoryError::SchemaElementNotFound {
            element: element.into(),
        }
    }

    /// Create a decryption error.
    pub fn decryption(message: impl Into<String>) -> Self {
        DirectoryError::DecryptionFailed {
            message: message.into(),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        DirectoryError::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Create a storage error wrapping an underlying engine error.
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DirectoryError::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get an error code for classification in logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            DirectoryError::ObjectNotFound { .. } => "OBJECT_NOT_FOUND",
            DirectoryError::ObjectOperation { .. } => "OBJECT_OPERATION",
            DirectoryError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            DirectoryError::NotImplemented { .. } => "NOT_IMPLEMENTED",
            DirectoryError::SchemaElementNotFound { .. } => "SCHEMA_ELEMENT_NOT_FOUND",
            DirectoryError::DecryptionFailed { .. } => "DECRYPTION_FAILED",
            DirectoryError::Storage { .. } => "STORAGE_ERROR",
        }
    }
}

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
