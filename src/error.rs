//! Error types for keyreserve.
//!
//! All errors are strongly typed using thiserror. Policy violations are kept
//! apart from infrastructure failures so callers can tell "the object is
//! wrong" from "the check could not run".

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::declaration::ObjectRef;
use crate::storage::StorageError;

/// A key policy violation.
///
/// Every variant carries the offending key, and where another declaration is
/// involved, the identity of that declaration, so the caller can correct the
/// source object without re-deriving the cause.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Violation {
    #[error("Key '{key}' is listed more than once in the declaration")]
    DuplicateInSelf {
        key: String,
    },

    #[error("Key '{key}' is already reserved by declaration {holder}")]
    DuplicateInNamespace {
        key: String,
        holder: ObjectRef,
    },

    #[error("Configuration object contains forbidden key '{key}' reserved by declaration {holder}")]
    ForbiddenKeyInConfiguration {
        key: String,
        holder: ObjectRef,
    },
}

impl Violation {
    /// The offending key.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::DuplicateInSelf { key }
            | Self::DuplicateInNamespace { key, .. }
            | Self::ForbiddenKeyInConfiguration { key, .. } => key,
        }
    }

    /// The declaration already holding the key, if another one is involved.
    #[must_use]
    pub const fn holder(&self) -> Option<&ObjectRef> {
        match self {
            Self::DuplicateInSelf { .. } => None,
            Self::DuplicateInNamespace { holder, .. }
            | Self::ForbiddenKeyInConfiguration { holder, .. } => Some(holder),
        }
    }
}

/// Errors raised by the serialized write path.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Write queue for shard {shard} is full (capacity {capacity})")]
    QueueFull {
        shard: usize,
        capacity: usize,
    },

    #[error("Shard {shard} worker disconnected")]
    Disconnected {
        shard: usize,
    },

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },
}

/// Errors raised while routing an admission request.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No entry point for {hook} hook on {kind} objects")]
    UnsupportedRoute {
        hook: String,
        kind: String,
    },
}

/// Errors raised while loading runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        field: String,
        reason: String,
    },

    #[error("Failed to parse configuration: {message}")]
    Parse {
        message: String,
    },
}

/// Top-level error type for keyreserve.
#[derive(Debug, Error)]
pub enum KeyReserveError {
    #[error("Rejected: {0}")]
    Violation(#[from] Violation),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl KeyReserveError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a policy violation.
    #[must_use]
    pub const fn is_violation(&self) -> bool {
        matches!(self, Self::Violation(_))
    }

    /// Returns true if this is a storage failure.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns the violation, if this error is one.
    #[must_use]
    pub const fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Violation(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Violation(_) => false, // The same object is rejected again
            Self::Storage(e) => matches!(
                e,
                StorageError::ListingFailed { .. } | StorageError::BackendError(_)
            ),
            Self::Execution(e) => matches!(
                e,
                ExecutionError::QueueFull { .. } | ExecutionError::Timeout { .. }
            ),
            Self::Dispatch(_) | Self::Config(_) | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for keyreserve operations.
pub type KeyReserveResult<T> = Result<T, KeyReserveError>;
