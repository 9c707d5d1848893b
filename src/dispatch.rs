//! Admission request routing.
//!
//! An external admission or reconcile framework marshals each incoming call
//! into an `AdmissionRequest`. The dispatcher maps `(hook, operation, kind)`
//! to one of the four entry points and always answers with an
//! `AdmissionResponse`: failures of any kind become a denial (fail closed).

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admission::{AdmissionController, Decision};
use crate::declaration::{ConfigurationObject, Declaration, ObjectRef};
use crate::error::{DispatchError, KeyReserveError, KeyReserveResult, Violation};
use crate::storage::DeclarationStore;

/// Which hook delivered the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Mutating (defaulting) admission.
    Mutate,
    /// Validating admission.
    Validate,
    /// Reconcile loop trigger.
    Reconcile,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mutate => write!(f, "mutate"),
            Self::Validate => write!(f, "validate"),
            Self::Reconcile => write!(f, "reconcile"),
        }
    }
}

/// The write being admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Object creation.
    #[default]
    Create,
    /// Object update.
    Update,
    /// Object deletion.
    Delete,
}

/// Kind of object carried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A `Declaration`.
    Declaration,
    /// A `ConfigurationObject`.
    Configuration,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declaration => write!(f, "declaration"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// The candidate object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "object", rename_all = "snake_case")]
pub enum AdmissionObject {
    /// A declaration.
    Declaration(Declaration),
    /// A configuration object.
    Configuration(ConfigurationObject),
}

impl AdmissionObject {
    /// The kind of this object.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Declaration(_) => ObjectKind::Declaration,
            Self::Configuration(_) => ObjectKind::Configuration,
        }
    }

    /// Identity of this object.
    #[must_use]
    pub const fn meta(&self) -> &ObjectRef {
        match self {
            Self::Declaration(d) => &d.meta,
            Self::Configuration(c) => &c.meta,
        }
    }
}

/// An admission or reconcile call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionRequest {
    /// Request identifier, echoed in the response.
    pub uid: Uuid,

    /// When the request was created.
    pub timestamp: DateTime<Utc>,

    /// Delivering hook.
    pub hook: HookKind,

    /// Write being admitted.
    #[serde(default)]
    pub operation: Operation,

    /// Candidate object.
    pub object: AdmissionObject,
}

impl AdmissionRequest {
    /// Creates a request with a fresh uid.
    pub fn new(hook: HookKind, operation: Operation, object: AdmissionObject) -> Self {
        Self {
            uid: Uuid::new_v4(),
            timestamp: Utc::now(),
            hook,
            operation,
            object,
        }
    }

    /// Sets a custom uid (useful for correlation).
    #[must_use]
    pub fn with_uid(mut self, uid: Uuid) -> Self {
        self.uid = uid;
        self
    }
}

/// Answer to an `AdmissionRequest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionResponse {
    /// The request uid.
    pub uid: Uuid,

    /// Whether the object may be admitted.
    pub allowed: bool,

    /// Denial reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Structured violation behind a denial, if the denial is a policy one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,

    /// Non-fatal notes, such as keys dropped by the mutate policy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// The mutated declaration, when the mutate policy rewrote its keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patched: Option<Declaration>,
}

impl AdmissionResponse {
    /// Allows the object unchanged.
    #[must_use]
    pub const fn allow(uid: Uuid) -> Self {
        Self {
            uid,
            allowed: true,
            reason: None,
            violation: None,
            warnings: Vec::new(),
            patched: None,
        }
    }

    /// Denies the object.
    #[must_use]
    pub fn deny(uid: Uuid, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            ..Self::allow(uid)
        }
    }

    /// Denies the object because of a policy violation.
    #[must_use]
    pub fn reject(uid: Uuid, violation: Violation) -> Self {
        Self {
            violation: Some(violation.clone()),
            ..Self::deny(uid, violation.to_string())
        }
    }
}

/// The entry point selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `on_declaration_mutate`.
    MutateDeclaration,
    /// `on_declaration_validate`.
    ValidateDeclaration,
    /// `on_declaration_reconcile`.
    ReconcileDeclaration,
    /// `on_configuration_validate`.
    ValidateConfiguration,
    /// Admitted without evaluation (deletes).
    Skip,
}

/// Selects the entry point for `(hook, operation, kind)`.
///
/// Deletes are always admitted: removing a declaration or a configuration
/// object can never break a uniqueness rule.
pub fn route(hook: HookKind, operation: Operation, kind: ObjectKind) -> Result<Route, DispatchError> {
    if operation == Operation::Delete {
        return Ok(Route::Skip);
    }
    match (hook, kind) {
        (HookKind::Mutate, ObjectKind::Declaration) => Ok(Route::MutateDeclaration),
        (HookKind::Validate, ObjectKind::Declaration) => Ok(Route::ValidateDeclaration),
        (HookKind::Reconcile, ObjectKind::Declaration) => Ok(Route::ReconcileDeclaration),
        (HookKind::Validate, ObjectKind::Configuration) => Ok(Route::ValidateConfiguration),
        (HookKind::Mutate | HookKind::Reconcile, ObjectKind::Configuration) => {
            Err(DispatchError::UnsupportedRoute {
                hook: hook.to_string(),
                kind: kind.to_string(),
            })
        }
    }
}

/// Routes requests to an `AdmissionController`.
pub struct Dispatcher<S: DeclarationStore + ?Sized> {
    controller: AdmissionController<S>,
}

impl<S: DeclarationStore + ?Sized> Dispatcher<S> {
    /// Create a dispatcher over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            controller: AdmissionController::new(store),
        }
    }

    /// Create a dispatcher over an existing controller.
    pub fn with_controller(controller: AdmissionController<S>) -> Self {
        Self { controller }
    }

    /// The underlying controller.
    #[must_use]
    pub fn controller(&self) -> &AdmissionController<S> {
        &self.controller
    }

    /// Handle one request.
    pub fn dispatch(&self, request: AdmissionRequest) -> AdmissionResponse {
        let uid = request.uid;
        tracing::info!(
            %uid,
            hook = %request.hook,
            operation = ?request.operation,
            object = %request.object.meta(),
            "admission request received"
        );

        match self.evaluate(request) {
            Ok(response) => response,
            Err(e) => match e.violation() {
                Some(violation) => AdmissionResponse::reject(uid, violation.clone()),
                None => {
                    tracing::warn!(%uid, error = %e, "admission failed, denying");
                    AdmissionResponse::deny(uid, e.to_string())
                }
            },
        }
    }

    fn evaluate(&self, request: AdmissionRequest) -> KeyReserveResult<AdmissionResponse> {
        let uid = request.uid;
        let route = route(request.hook, request.operation, request.object.kind())?;

        let response = match (route, request.object) {
            (Route::Skip, _) => AdmissionResponse::allow(uid),
            (Route::MutateDeclaration, AdmissionObject::Declaration(candidate)) => {
                let outcome = self.controller.on_declaration_mutate(candidate)?;
                let mut response = AdmissionResponse::allow(uid);
                response.warnings = outcome.warnings();
                if outcome.changed() {
                    response.patched = Some(outcome.declaration);
                }
                response
            }
            (Route::ValidateDeclaration, AdmissionObject::Declaration(candidate)) => {
                decision_response(uid, self.controller.on_declaration_validate(&candidate)?)
            }
            (Route::ReconcileDeclaration, AdmissionObject::Declaration(candidate)) => {
                self.controller.on_declaration_reconcile(&candidate)?;
                AdmissionResponse::allow(uid)
            }
            (Route::ValidateConfiguration, AdmissionObject::Configuration(candidate)) => {
                let namespace = candidate.namespace().to_string();
                decision_response(
                    uid,
                    self.controller.on_configuration_validate(&namespace, &candidate)?,
                )
            }
            (route, object) => {
                return Err(KeyReserveError::internal(format!(
                    "route {route:?} does not accept {} objects",
                    object.kind()
                )));
            }
        };
        Ok(response)
    }
}

fn decision_response(uid: Uuid, decision: Decision) -> AdmissionResponse {
    match decision {
        Decision::Accept => AdmissionResponse::allow(uid),
        Decision::Reject { violation } => AdmissionResponse::reject(uid, violation),
    }
}
