//! Duplicate resolution engine.
//!
//! Pure functions over key lists. The same two checks back every admission
//! policy; only the `DuplicatePolicy` differs:
//!
//! - `resolve_in_self`: a key may appear at most once in a declaration
//! - `resolve_in_namespace`: a key may appear in at most one declaration of a
//!   namespace
//!
//! Nothing here performs I/O or logs. Dropped keys are reported as
//! `ResolutionEvent`s on the returned `Resolution`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::declaration::Declaration;
use crate::error::Violation;
use crate::events::ResolutionEvent;
use crate::registry::NamespaceRegistry;

/// What to do when a duplicate key is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Abort on the first duplicate with a `Violation`.
    #[default]
    Reject,
    /// Remove the duplicate and continue.
    Drop,
}

/// A resolved key list plus the events produced while resolving it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    /// Resolved keys, in first-occurrence order.
    pub keys: Vec<String>,
    /// One event per dropped key. Always empty under `DuplicatePolicy::Reject`.
    pub events: Vec<ResolutionEvent>,
}

impl Resolution {
    /// Returns true if at least one key was dropped.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.events.is_empty()
    }

    fn absorb(&mut self, next: Self) {
        self.keys = next.keys;
        self.events.extend(next.events);
    }
}

/// Checks a single declaration's key list for repeats.
///
/// Under `Drop`, the result keeps the first occurrence of every key.
pub fn resolve_in_self(keys: &[String], policy: DuplicatePolicy) -> Result<Resolution, Violation> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(keys.len());
    let mut resolution = Resolution {
        keys: Vec::with_capacity(keys.len()),
        events: Vec::new(),
    };

    for key in keys {
        if seen.insert(key.as_str()) {
            resolution.keys.push(key.clone());
            continue;
        }
        match policy {
            DuplicatePolicy::Reject => {
                return Err(Violation::DuplicateInSelf { key: key.clone() });
            }
            DuplicatePolicy::Drop => {
                resolution
                    .events
                    .push(ResolutionEvent::DroppedInSelf { key: key.clone() });
            }
        }
    }
    Ok(resolution)
}

/// Checks a key list against the keys reserved by the other declarations of
/// the namespace.
///
/// `registry` must already exclude the candidate itself. Keys are tested in
/// the candidate's order, so under `Reject` the reported key is the first
/// offending one in that order.
pub fn resolve_in_namespace(
    keys: &[String],
    registry: &NamespaceRegistry,
    policy: DuplicatePolicy,
) -> Result<Resolution, Violation> {
    let mut resolution = Resolution {
        keys: Vec::with_capacity(keys.len()),
        events: Vec::new(),
    };

    for key in keys {
        let Some(holder) = registry.holder_of(key) else {
            resolution.keys.push(key.clone());
            continue;
        };
        match policy {
            DuplicatePolicy::Reject => {
                return Err(Violation::DuplicateInNamespace {
                    key: key.clone(),
                    holder: holder.clone(),
                });
            }
            DuplicatePolicy::Drop => {
                resolution.events.push(ResolutionEvent::DroppedInNamespace {
                    key: key.clone(),
                    holder: holder.clone(),
                });
            }
        }
    }
    Ok(resolution)
}

/// Runs both checks on `candidate` against a namespace listing.
///
/// The listing may contain the candidate itself (an update); it is excluded
/// by name so a declaration never conflicts with its stored copy.
pub fn resolve(
    candidate: &Declaration,
    siblings: &[Declaration],
    policy: DuplicatePolicy,
) -> Result<Resolution, Violation> {
    let mut resolution = resolve_in_self(&candidate.keys, policy)?;
    if resolution.keys.is_empty() {
        return Ok(resolution);
    }

    let registry = NamespaceRegistry::excluding(candidate.namespace(), siblings, candidate.name());
    let in_namespace = resolve_in_namespace(&resolution.keys, &registry, policy)?;
    resolution.absorb(in_namespace);
    Ok(resolution)
}

/// Drops every duplicate from `candidate`'s keys against a namespace listing.
///
/// Same result as `resolve` under `DuplicatePolicy::Drop`, without the error
/// path: the drop policy has nothing to reject. Self duplicates are reported
/// before namespace duplicates.
#[must_use]
pub fn resolve_dropping(candidate: &Declaration, siblings: &[Declaration]) -> Resolution {
    let registry = NamespaceRegistry::excluding(candidate.namespace(), siblings, candidate.name());
    let mut seen: HashSet<&str> = HashSet::with_capacity(candidate.keys.len());
    let mut resolution = Resolution {
        keys: Vec::with_capacity(candidate.keys.len()),
        events: Vec::new(),
    };
    let mut in_namespace = Vec::new();

    for key in &candidate.keys {
        if !seen.insert(key.as_str()) {
            resolution
                .events
                .push(ResolutionEvent::DroppedInSelf { key: key.clone() });
            continue;
        }
        match registry.holder_of(key) {
            Some(holder) => in_namespace.push(ResolutionEvent::DroppedInNamespace {
                key: key.clone(),
                holder: holder.clone(),
            }),
            None => resolution.keys.push(key.clone()),
        }
    }

    resolution.events.extend(in_namespace);
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|k| (*k).to_string()).collect()
    }

    #[test]
    fn in_self_accepts_unique_keys_unchanged() {
        let input = keys(&["A", "B", "C"]);
        for policy in [DuplicatePolicy::Reject, DuplicatePolicy::Drop] {
            let resolution = resolve_in_self(&input, policy).unwrap();
            assert_eq!(resolution.keys, input);
            assert!(!resolution.changed());
        }
    }

    #[test]
    fn in_self_reject_reports_first_repeat() {
        let err = resolve_in_self(&keys(&["A", "B", "B", "A"]), DuplicatePolicy::Reject).unwrap_err();
        assert_eq!(err, Violation::DuplicateInSelf { key: "B".to_string() });
    }

    #[test]
    fn in_self_drop_keeps_first_occurrence_order() {
        let resolution =
            resolve_in_self(&keys(&["B", "A", "B", "C", "A"]), DuplicatePolicy::Drop).unwrap();
        assert_eq!(resolution.keys, keys(&["B", "A", "C"]));
        assert_eq!(
            resolution.events.iter().map(ResolutionEvent::key).collect::<Vec<_>>(),
            vec!["B", "A"]
        );
    }

    #[test]
    fn in_namespace_reject_names_holder() {
        let siblings = vec![Declaration::new("ns1", "d1", ["X", "Y"])];
        let registry = NamespaceRegistry::build("ns1", &siblings);

        let err = resolve_in_namespace(&keys(&["Z", "Y", "X"]), &registry, DuplicatePolicy::Reject)
            .unwrap_err();
        let Violation::DuplicateInNamespace { key, holder } = err else {
            panic!("expected DuplicateInNamespace, got {err:?}");
        };
        assert_eq!(key, "Y");
        assert_eq!(holder.name, "d1");
    }

    #[test]
    fn in_namespace_drop_removes_reserved_keys() {
        let siblings = vec![
            Declaration::new("ns1", "d1", ["X"]),
            Declaration::new("ns1", "d3", ["W"]),
        ];
        let registry = NamespaceRegistry::build("ns1", &siblings);

        let resolution =
            resolve_in_namespace(&keys(&["W", "Q", "X"]), &registry, DuplicatePolicy::Drop).unwrap();
        assert_eq!(resolution.keys, keys(&["Q"]));
        assert_eq!(resolution.events.len(), 2);
    }

    #[test]
    fn resolve_excludes_candidate_from_its_own_namespace() {
        let stored = Declaration::new("ns", "A", ["K1", "K2"]).at_revision(1);
        let siblings = vec![stored.clone()];

        let resolution = resolve(&stored, &siblings, DuplicatePolicy::Reject).unwrap();
        assert_eq!(resolution.keys, stored.keys);
    }

    #[test]
    fn resolve_runs_self_check_before_namespace_check() {
        let siblings = vec![Declaration::new("ns", "other", ["K"])];
        let candidate = Declaration::new("ns", "new", ["K", "K"]);

        let err = resolve(&candidate, &siblings, DuplicatePolicy::Reject).unwrap_err();
        assert!(matches!(err, Violation::DuplicateInSelf { .. }));

        let resolution = resolve(&candidate, &siblings, DuplicatePolicy::Drop).unwrap();
        assert!(resolution.keys.is_empty());
        assert!(matches!(resolution.events[0], ResolutionEvent::DroppedInSelf { .. }));
        assert!(matches!(resolution.events[1], ResolutionEvent::DroppedInNamespace { .. }));
    }

    #[test]
    fn resolve_dropping_matches_drop_policy() {
        let siblings = vec![
            Declaration::new("ns", "d1", ["X", "Y"]),
            Declaration::new("ns", "cand", ["Y"]),
        ];
        let candidate = Declaration::new("ns", "cand", ["Z", "Y", "X", "Z", "Y"]);

        let dropped = resolve_dropping(&candidate, &siblings);
        let expected = resolve(&candidate, &siblings, DuplicatePolicy::Drop).unwrap();
        assert_eq!(dropped, expected);
        assert_eq!(dropped.keys, keys(&["Z"]));
    }

    #[test]
    fn resolve_empty_key_list_is_valid() {
        let siblings = vec![Declaration::new("ns", "other", ["K"])];
        let candidate = Declaration::new("ns", "empty", Vec::<String>::new());
        let resolution = resolve(&candidate, &siblings, DuplicatePolicy::Reject).unwrap();
        assert!(resolution.keys.is_empty());
    }

    #[test]
    fn resolve_without_siblings_passes() {
        let candidate = Declaration::new("ns", "alone", ["A", "B"]);
        let resolution = resolve(&candidate, &[], DuplicatePolicy::Reject).unwrap();
        assert_eq!(resolution.keys, candidate.keys);
    }
}
