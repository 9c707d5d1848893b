//! Store-backed admission controller.
//!
//! Each entry point runs `FetchSiblings`, then hands the snapshot to the pure
//! policy functions. A listing failure fails closed: nothing is evaluated and
//! the error is returned to the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::declaration::{ConfigurationObject, Declaration, ObjectRef};
use crate::error::{KeyReserveError, KeyReserveResult};
use crate::events::{emit_rejection, emit_resolution};
use crate::storage::DeclarationStore;

use super::guard;
use super::policy::{self, Decision, MutateOutcome};

/// Outcome of a reconcile pass over a stored declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The declaration satisfies both uniqueness rules.
    Consistent,
    /// The declaration no longer exists; nothing to check.
    Gone,
}

/// Runs the admission policies against a `DeclarationStore`.
pub struct AdmissionController<S: DeclarationStore + ?Sized> {
    store: Arc<S>,
}

impl<S: DeclarationStore + ?Sized> Clone for AdmissionController<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DeclarationStore + ?Sized> AdmissionController<S> {
    /// Create a controller over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn fetch_siblings(&self, namespace: &str) -> KeyReserveResult<Vec<Declaration>> {
        self.store.list(namespace).map_err(|e| {
            tracing::warn!(
                namespace = %namespace,
                error = %e,
                "cannot list declarations in namespace, failing closed"
            );
            KeyReserveError::from(e)
        })
    }

    /// Mutate-on-write entry point. Only listing failures are errors.
    pub fn on_declaration_mutate(&self, candidate: Declaration) -> KeyReserveResult<MutateOutcome> {
        tracing::debug!(object = %candidate.meta, "defaulting declaration");
        let siblings = self.fetch_siblings(candidate.namespace())?;
        let outcome = policy::mutate_declaration(candidate, &siblings);
        emit_resolution(&outcome.declaration.meta, &outcome.events);
        Ok(outcome)
    }

    /// Validate-on-write entry point.
    pub fn on_declaration_validate(&self, candidate: &Declaration) -> KeyReserveResult<Decision> {
        tracing::debug!(object = %candidate.meta, "validating declaration");
        let siblings = self.fetch_siblings(candidate.namespace())?;
        let decision = policy::validate_declaration(candidate, &siblings);
        if let Some(violation) = decision.violation() {
            emit_rejection(&candidate.meta, violation);
        }
        Ok(decision)
    }

    /// Reconcile check on a declaration already in the store.
    ///
    /// The declaration is never modified; a violation is returned as an error
    /// so the reconcile driver surfaces it.
    pub fn on_declaration_reconcile(&self, candidate: &Declaration) -> KeyReserveResult<()> {
        let siblings = self.fetch_siblings(candidate.namespace())?;
        policy::reconcile_declaration(candidate, &siblings).map_err(|violation| {
            emit_rejection(&candidate.meta, &violation);
            KeyReserveError::from(violation)
        })
    }

    /// Reconcile a declaration by identity, fetching it first.
    pub fn reconcile(&self, target: &ObjectRef) -> KeyReserveResult<ReconcileOutcome> {
        let Some(candidate) = self.store.get(target)? else {
            tracing::info!(object = %target, "declaration not found, ignoring since it must be deleted");
            return Ok(ReconcileOutcome::Gone);
        };
        self.on_declaration_reconcile(&candidate)?;
        tracing::debug!(object = %target, "declaration is consistent");
        Ok(ReconcileOutcome::Consistent)
    }

    /// Configuration guard entry point.
    pub fn on_configuration_validate(
        &self,
        namespace: &str,
        candidate: &ConfigurationObject,
    ) -> KeyReserveResult<Decision> {
        tracing::debug!(object = %candidate.meta, "validating configuration object");
        let declarations = self.fetch_siblings(namespace)?;
        let decision = guard::validate_configuration(namespace, candidate, &declarations);
        if let Some(violation) = decision.violation() {
            emit_rejection(&candidate.meta, violation);
        }
        Ok(decision)
    }
}
