//! Namespace registry.
//!
//! The registry is the derived aggregate of every reserved key in one
//! namespace. It is never persisted: each evaluation builds a fresh one from a
//! listing snapshot.

use std::collections::BTreeMap;

use crate::declaration::{Declaration, ObjectRef};

/// Aggregate of reserved keys in one namespace, with the holder of each key.
///
/// When several declarations hold the same key (an inconsistent registry),
/// the first one in listing order is recorded as the holder. Membership tests
/// are unaffected by that choice.
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    namespace: String,
    holders: BTreeMap<String, ObjectRef>,
    declarations: usize,
}

impl NamespaceRegistry {
    /// Builds the registry over every declaration in `namespace`.
    pub fn build(namespace: &str, declarations: &[Declaration]) -> Self {
        Self::collect(namespace, declarations, None)
    }

    /// Builds the registry over every declaration in `namespace` except the
    /// one named `excluded`.
    pub fn excluding(namespace: &str, declarations: &[Declaration], excluded: &str) -> Self {
        Self::collect(namespace, declarations, Some(excluded))
    }

    fn collect(namespace: &str, declarations: &[Declaration], excluded: Option<&str>) -> Self {
        let mut registry = Self {
            namespace: namespace.to_string(),
            ..Self::default()
        };

        // Listings are per namespace; stray entries from elsewhere are ignored.
        let members = declarations
            .iter()
            .filter(|d| d.namespace() == namespace)
            .filter(|d| excluded != Some(d.name()));

        for declaration in members {
            registry.declarations += 1;
            for key in &declaration.keys {
                registry
                    .holders
                    .entry(key.clone())
                    .or_insert_with(|| declaration.meta.clone());
            }
        }
        registry
    }

    /// Namespace this registry covers.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns true if any member declaration reserves `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.holders.contains_key(key)
    }

    /// The declaration holding `key`, if any.
    #[must_use]
    pub fn holder_of(&self, key: &str) -> Option<&ObjectRef> {
        self.holders.get(key)
    }

    /// Reserved keys in sorted order.
    pub fn reserved_keys(&self) -> impl Iterator<Item = &str> {
        self.holders.keys().map(String::as_str)
    }

    /// Number of distinct reserved keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.holders.len()
    }

    /// Returns true if no key is reserved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    /// Number of declarations that contributed to this registry.
    #[must_use]
    pub const fn declaration_count(&self) -> usize {
        self.declarations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace() -> Vec<Declaration> {
        vec![
            Declaration::new("ns1", "d1", ["X", "Y"]),
            Declaration::new("ns1", "d2", ["Z"]),
            Declaration::new("ns2", "other", ["W"]),
        ]
    }

    #[test]
    fn build_aggregates_keys_in_namespace() {
        let registry = NamespaceRegistry::build("ns1", &namespace());
        assert_eq!(registry.namespace(), "ns1");
        assert_eq!(registry.reserved_keys().collect::<Vec<_>>(), vec!["X", "Y", "Z"]);
        assert_eq!(registry.declaration_count(), 2);
        assert!(!registry.contains("W"));
        assert_eq!(registry.holder_of("Z").map(|h| h.name.as_str()), Some("d2"));
    }

    #[test]
    fn excluding_drops_the_named_declaration() {
        let registry = NamespaceRegistry::excluding("ns1", &namespace(), "d1");
        assert!(!registry.contains("X"));
        assert!(registry.contains("Z"));
        assert_eq!(registry.declaration_count(), 1);
    }

    #[test]
    fn inconsistent_registry_records_first_holder() {
        let declarations = vec![
            Declaration::new("ns", "a", ["K"]),
            Declaration::new("ns", "b", ["K"]),
        ];
        let registry = NamespaceRegistry::build("ns", &declarations);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.holder_of("K").map(|h| h.name.as_str()), Some("a"));
    }

    #[test]
    fn empty_namespace_is_empty() {
        let registry = NamespaceRegistry::build("ns", &[]);
        assert!(registry.is_empty());
        assert_eq!(registry.declaration_count(), 0);
    }
}
