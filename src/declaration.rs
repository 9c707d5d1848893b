//! Declarations and configuration objects.
//!
//! Both entity kinds are owned by an external resource store. The crate reads
//! them as immutable snapshots; the only field it ever rewrites is
//! `Declaration::keys` on the mutate path.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a namespaced object: `(namespace, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Namespace the object lives in.
    pub namespace: String,
    /// Object name, unique within its namespace and kind.
    pub name: String,
}

impl ObjectRef {
    /// Creates a new object reference.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A named object reserving a list of configuration keys within its namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Identity.
    pub meta: ObjectRef,

    /// Reserved keys, in declaration order.
    #[serde(default)]
    pub keys: Vec<String>,

    /// Store-managed revision. `0` means the declaration has never been stored.
    #[serde(default)]
    pub revision: u64,
}

impl Declaration {
    /// Creates an unstored declaration.
    pub fn new<I, K>(namespace: impl Into<String>, name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            meta: ObjectRef::new(namespace, name),
            keys: keys.into_iter().map(Into::into).collect(),
            revision: 0,
        }
    }

    /// Namespace of this declaration.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.meta.namespace
    }

    /// Name of this declaration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Returns a copy carrying the given revision.
    #[must_use]
    pub fn at_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Returns a copy with its key list replaced.
    #[must_use]
    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = keys;
        self
    }
}

/// A key/value configuration object subject to the forbidden-key guard.
///
/// Values are opaque: only the key set is ever inspected. Text entries and
/// binary entries share one key space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationObject {
    /// Identity.
    pub meta: ObjectRef,

    /// Text entries.
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,

    /// Binary entries, base64 encoded by the producer.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binary_data: BTreeMap<String, String>,
}

impl ConfigurationObject {
    /// Creates an empty configuration object.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            meta: ObjectRef::new(namespace, name),
            data: BTreeMap::new(),
            binary_data: BTreeMap::new(),
        }
    }

    /// Adds a text entry.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Adds a binary entry.
    #[must_use]
    pub fn with_binary_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.binary_data.insert(key.into(), value.into());
        self
    }

    /// Namespace of this object.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.meta.namespace
    }

    /// All keys: text entries first, then binary entries, each in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data
            .keys()
            .chain(self.binary_data.keys())
            .map(String::as_str)
    }
}
