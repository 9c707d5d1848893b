//! Declaration admission policies over an explicit namespace snapshot.
//!
//! | Policy    | In self | In namespace | On violation              |
//! |-----------|---------|--------------|---------------------------|
//! | Mutate    | drop    | drop         | never rejects             |
//! | Validate  | reject  | reject       | `Decision::Reject`        |
//! | Reconcile | reject  | reject       | `Err(Violation)`          |

use serde::{Deserialize, Serialize};

use crate::declaration::Declaration;
use crate::engine::{self, DuplicatePolicy};
use crate::error::Violation;
use crate::events::ResolutionEvent;

/// Outcome of a validating policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The object may be admitted as-is.
    Accept,
    /// The object must not be admitted.
    Reject {
        /// Why.
        violation: Violation,
    },
}

impl Decision {
    /// Returns true for `Accept`.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept)
    }

    /// The violation behind a rejection.
    #[must_use]
    pub const fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Accept => None,
            Self::Reject { violation } => Some(violation),
        }
    }
}

impl From<Result<(), Violation>> for Decision {
    fn from(result: Result<(), Violation>) -> Self {
        match result {
            Ok(()) => Self::Accept,
            Err(violation) => Self::Reject { violation },
        }
    }
}

/// Result of the mutate policy: the candidate with its keys replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutateOutcome {
    /// The candidate carrying the resolved key list.
    pub declaration: Declaration,
    /// Keys that were dropped.
    pub events: Vec<ResolutionEvent>,
}

impl MutateOutcome {
    /// Returns true if the key list was rewritten.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.events.is_empty()
    }

    /// Admission warnings describing the dropped keys.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.events.iter().map(ResolutionEvent::warning).collect()
    }
}

/// Mutate-on-write: silently drops duplicates and never rejects.
#[must_use]
pub fn mutate_declaration(candidate: Declaration, siblings: &[Declaration]) -> MutateOutcome {
    let resolution = engine::resolve_dropping(&candidate, siblings);
    MutateOutcome {
        declaration: candidate.with_keys(resolution.keys),
        events: resolution.events,
    }
}

/// Validate-on-write: rejects on the first duplicate.
#[must_use]
pub fn validate_declaration(candidate: &Declaration, siblings: &[Declaration]) -> Decision {
    check(candidate, siblings).into()
}

/// Reconcile check: same rules as validation, surfaced as an error.
pub fn reconcile_declaration(candidate: &Declaration, siblings: &[Declaration]) -> Result<(), Violation> {
    check(candidate, siblings)
}

fn check(candidate: &Declaration, siblings: &[Declaration]) -> Result<(), Violation> {
    engine::resolve(candidate, siblings, DuplicatePolicy::Reject).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::ObjectRef;

    fn ns1() -> Vec<Declaration> {
        vec![Declaration::new("ns1", "d1", ["X", "Y"]).at_revision(1)]
    }

    #[test]
    fn validate_rejects_namespace_duplicate_citing_holder() {
        let candidate = Declaration::new("ns1", "d2", ["Y", "Z"]);
        let decision = validate_declaration(&candidate, &ns1());
        assert_eq!(
            decision,
            Decision::Reject {
                violation: Violation::DuplicateInNamespace {
                    key: "Y".to_string(),
                    holder: ObjectRef::new("ns1", "d1"),
                }
            }
        );
    }

    #[test]
    fn mutate_resolves_to_remaining_keys() {
        let candidate = Declaration::new("ns1", "d2", ["Y", "Z"]);
        let outcome = mutate_declaration(candidate, &ns1());
        assert_eq!(outcome.declaration.keys, vec!["Z".to_string()]);
        assert!(outcome.changed());
        assert_eq!(outcome.warnings().len(), 1);
        assert!(outcome.warnings()[0].contains("ns1/d1"));
    }

    #[test]
    fn mutate_is_idempotent_on_consistent_namespace() {
        let candidate = Declaration::new("ns1", "d2", ["Z", "Z", "Q"]);
        let first = mutate_declaration(candidate, &ns1());
        let second = mutate_declaration(first.declaration.clone(), &ns1());
        assert_eq!(first.declaration, second.declaration);
        assert!(!second.changed());
    }

    #[test]
    fn reconcile_surfaces_in_self_duplicates() {
        let candidate = Declaration::new("ns1", "d2", ["Q", "Q"]);
        let err = reconcile_declaration(&candidate, &ns1()).unwrap_err();
        assert_eq!(err, Violation::DuplicateInSelf { key: "Q".to_string() });
    }

    #[test]
    fn validate_accepts_declaration_against_its_stored_copy() {
        let stored = ns1();
        let decision = validate_declaration(&stored[0], &stored);
        assert!(decision.is_accepted());
        assert!(decision.violation().is_none());
    }
}
