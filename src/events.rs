//! Resolution events.
//!
//! The resolution engine never logs. It returns `ResolutionEvent`s next to its
//! result, and the admission layer emits them through `tracing` once the
//! decision has been made.

use serde::{Deserialize, Serialize};

use crate::declaration::ObjectRef;
use crate::error::Violation;

/// Something the resolution engine did to a candidate key list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResolutionEvent {
    /// A repeated key was removed from the candidate's own list.
    DroppedInSelf {
        /// The removed key.
        key: String,
    },

    /// A key already reserved by another declaration was removed.
    DroppedInNamespace {
        /// The removed key.
        key: String,
        /// The declaration holding it.
        holder: ObjectRef,
    },
}

impl ResolutionEvent {
    /// The key this event is about.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::DroppedInSelf { key } | Self::DroppedInNamespace { key, .. } => key,
        }
    }

    /// Human readable warning, suitable for an admission response.
    #[must_use]
    pub fn warning(&self) -> String {
        match self {
            Self::DroppedInSelf { key } => {
                format!("duplicate key '{key}' removed from keys")
            }
            Self::DroppedInNamespace { key, holder } => {
                format!("key '{key}' removed from keys: already reserved by {holder}")
            }
        }
    }
}

/// Emits resolution events for `candidate`.
pub(crate) fn emit_resolution(candidate: &ObjectRef, events: &[ResolutionEvent]) {
    for event in events {
        match event {
            ResolutionEvent::DroppedInSelf { key } => tracing::info!(
                namespace = %candidate.namespace,
                name = %candidate.name,
                duplicate_key = %key,
                "declaration lists key more than once, removing duplicate"
            ),
            ResolutionEvent::DroppedInNamespace { key, holder } => tracing::info!(
                namespace = %candidate.namespace,
                name = %candidate.name,
                duplicate_key = %key,
                holder = %holder.name,
                "key already reserved in namespace, removing it"
            ),
        }
    }
}

/// Emits a rejection of `candidate`.
pub(crate) fn emit_rejection(candidate: &ObjectRef, violation: &Violation) {
    let holder = violation.holder().map(|h| h.name.as_str());
    tracing::warn!(
        namespace = %candidate.namespace,
        name = %candidate.name,
        key = %violation.key(),
        holder = ?holder,
        "rejecting object: {violation}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_names_key_and_holder() {
        let event = ResolutionEvent::DroppedInNamespace {
            key: "Y".to_string(),
            holder: ObjectRef::new("ns1", "d1"),
        };
        assert_eq!(event.key(), "Y");
        let warning = event.warning();
        assert!(warning.contains("'Y'"));
        assert!(warning.contains("ns1/d1"));
    }

    #[test]
    fn events_serialize_with_event_tag() {
        let event = ResolutionEvent::DroppedInSelf {
            key: "X".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "dropped_in_self");
        assert_eq!(json["key"], "X");
    }
}
