//! Abstract storage traits for keyreserve.
//!
//! The declaration store is an external collaborator. The crate only needs
//! to list a namespace; the remaining operations back the reconcile driver
//! and the serialized write path.

use thiserror::Error;

use crate::declaration::{Declaration, ObjectRef};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Listing the declarations of a namespace failed.
    #[error("Failed to list declarations in namespace '{namespace}': {reason}")]
    ListingFailed {
        /// Namespace being listed.
        namespace: String,
        /// Backend-provided reason.
        reason: String,
    },

    /// Declaration not found.
    #[error("Declaration not found: {0}")]
    NotFound(ObjectRef),

    /// The write was based on an outdated revision.
    #[error("Stale revision for {object}: expected {expected}, found {actual}")]
    StaleRevision {
        /// Declaration being written.
        object: ObjectRef,
        /// Revision currently stored.
        expected: u64,
        /// Revision carried by the write.
        actual: u64,
    },

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Storage trait for Declaration operations.
///
/// # Consistency
/// - `list` returns a snapshot; callers never assume it stays current
/// - `put` is a compare-and-swap on `Declaration::revision`
pub trait DeclarationStore: Send + Sync {
    /// List every declaration in a namespace, ordered by name.
    fn list(&self, namespace: &str) -> Result<Vec<Declaration>, StorageError>;

    /// Get a single declaration.
    fn get(&self, target: &ObjectRef) -> Result<Option<Declaration>, StorageError>;

    /// Create or update a declaration, returning the stored copy.
    ///
    /// A declaration with revision `0` is created and must not exist yet.
    /// Otherwise its revision must match the stored one. The stored copy
    /// carries the next revision.
    fn put(&self, declaration: Declaration) -> Result<Declaration, StorageError>;

    /// Delete a declaration. Returns `NotFound` if it does not exist.
    fn delete(&self, target: &ObjectRef) -> Result<(), StorageError>;
}
