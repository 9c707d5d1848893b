//! Configuration guard.
//!
//! Rejects a configuration object that uses any key reserved in its
//! namespace. There is no mutation path: conflicting keys are never stripped
//! from a configuration object.

use crate::declaration::{ConfigurationObject, Declaration};
use crate::error::Violation;
use crate::registry::NamespaceRegistry;

use super::policy::Decision;

/// Checks `candidate` against every declaration in `namespace`.
///
/// The registry is not required to be consistent; several declarations
/// holding the same key still collapse to one membership test. The first
/// offending key in `ConfigurationObject::keys` order is reported.
#[must_use]
pub fn validate_configuration(
    namespace: &str,
    candidate: &ConfigurationObject,
    declarations: &[Declaration],
) -> Decision {
    let registry = NamespaceRegistry::build(namespace, declarations);
    check_against(&registry, candidate).into()
}

/// Checks `candidate` against a prebuilt registry.
fn check_against(registry: &NamespaceRegistry, candidate: &ConfigurationObject) -> Result<(), Violation> {
    if registry.is_empty() {
        return Ok(());
    }
    for key in candidate.keys() {
        if let Some(holder) = registry.holder_of(key) {
            return Err(Violation::ForbiddenKeyInConfiguration {
                key: key.to_string(),
                holder: holder.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserved() -> Vec<Declaration> {
        vec![
            Declaration::new("ns", "api", ["API_KEY"]),
            Declaration::new("ns", "db", ["DB_PASS"]),
        ]
    }

    #[test]
    fn rejects_reserved_key() {
        let cfg = ConfigurationObject::new("ns", "app").with_entry("API_KEY", "secret");
        let decision = validate_configuration("ns", &cfg, &reserved());
        let Some(Violation::ForbiddenKeyInConfiguration { key, holder }) = decision.violation() else {
            panic!("expected forbidden key, got {decision:?}");
        };
        assert_eq!(key, "API_KEY");
        assert_eq!(holder.name, "api");
    }

    #[test]
    fn accepts_unreserved_keys() {
        let cfg = ConfigurationObject::new("ns", "app").with_entry("PORT", 8080);
        assert!(validate_configuration("ns", &cfg, &reserved()).is_accepted());
    }

    #[test]
    fn checks_binary_entries() {
        let cfg = ConfigurationObject::new("ns", "app")
            .with_entry("PORT", 8080)
            .with_binary_entry("DB_PASS", "c2VjcmV0");
        let decision = validate_configuration("ns", &cfg, &reserved());
        assert_eq!(decision.violation().map(Violation::key), Some("DB_PASS"));
    }

    #[test]
    fn tolerates_inconsistent_registry() {
        let declarations = vec![
            Declaration::new("ns", "a", ["K"]),
            Declaration::new("ns", "b", ["K"]),
        ];
        let cfg = ConfigurationObject::new("ns", "app").with_entry("K", "v");
        let decision = validate_configuration("ns", &cfg, &declarations);
        assert_eq!(decision.violation().map(Violation::key), Some("K"));
    }

    #[test]
    fn other_namespaces_do_not_reserve_keys() {
        let cfg = ConfigurationObject::new("elsewhere", "app").with_entry("API_KEY", "x");
        assert!(validate_configuration("elsewhere", &cfg, &reserved()).is_accepted());
    }
}
