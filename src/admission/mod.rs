//! Admission policy adapters.
//!
//! Three declaration policies drive the resolution engine (mutate, validate,
//! reconcile) and a fourth adapter guards configuration objects. The pure
//! functions in `policy` and `guard` take an explicit namespace snapshot;
//! `AdmissionController` fetches that snapshot from a store.

pub mod controller;
pub mod guard;
pub mod policy;

pub use controller::{AdmissionController, ReconcileOutcome};
pub use guard::validate_configuration;
pub use policy::{
    mutate_declaration, reconcile_declaration, validate_declaration, Decision, MutateOutcome,
};
