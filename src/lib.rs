//! # keyreserve - Namespace-scoped reserved configuration keys
//!
//! A declaration reserves a list of configuration keys within its namespace.
//! This crate keeps those reservations consistent and enforces them on
//! ordinary key/value configuration objects.
//!
//! ## Core Concepts
//!
//! - **Declaration**: a named object listing the keys it reserves
//! - **Namespace Registry**: the aggregate of every declaration's keys in one
//!   namespace, rebuilt from a store listing on every evaluation
//! - **Configuration Object**: a key/value object that must not use any
//!   reserved key
//!
//! ## Invariants
//!
//! 1. Within one declaration, each key appears at most once.
//! 2. Within one namespace, each key appears in at most one declaration.
//! 3. No configuration object uses a key reserved in its namespace.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keyreserve::{AdmissionController, Declaration, InMemoryDeclarationStore};
//!
//! let store = Arc::new(InMemoryDeclarationStore::new());
//! store.seed([Declaration::new("ns1", "d1", ["X", "Y"])])?;
//!
//! let controller = AdmissionController::new(store);
//! let decision = controller.on_declaration_validate(&Declaration::new("ns1", "d2", ["Y", "Z"]))?;
//! assert!(!decision.is_accepted());
//!
//! let outcome = controller.on_declaration_mutate(Declaration::new("ns1", "d2", ["Y", "Z"]))?;
//! assert_eq!(outcome.declaration.keys, vec!["Z".to_string()]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Data model
pub mod declaration;
pub mod error;
pub mod events;
pub mod registry;

// Engine, policies and routing
pub mod admission;
pub mod dispatch;
pub mod engine;

// Storage and write path
pub mod config;
pub mod runtime;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use admission::{
    mutate_declaration, reconcile_declaration, validate_configuration, validate_declaration,
    AdmissionController, Decision, MutateOutcome, ReconcileOutcome,
};
pub use config::RuntimeConfig;
pub use declaration::{ConfigurationObject, Declaration, ObjectRef};
pub use dispatch::{
    AdmissionObject, AdmissionRequest, AdmissionResponse, Dispatcher, HookKind, ObjectKind,
    Operation, Route,
};
pub use engine::{
    resolve, resolve_dropping, resolve_in_namespace, resolve_in_self, DuplicatePolicy, Resolution,
};
pub use error::{
    ConfigError, DispatchError, ExecutionError, KeyReserveError, KeyReserveResult, Violation,
};
pub use events::ResolutionEvent;
pub use registry::NamespaceRegistry;
pub use runtime::{AdmissionRuntime, DeclarationWrite, WriteHandle, WriteOutcome};
pub use storage::{DeclarationStore, InMemoryDeclarationStore, StorageError};
