//! In-memory storage backend.
//!
//! Thread-safe reference implementation of `DeclarationStore`, intended for
//! embedded usage and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::declaration::{Declaration, ObjectRef};
use crate::storage::traits::{DeclarationStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// In-memory declaration store, indexed by namespace then name.
#[derive(Debug, Default)]
pub struct InMemoryDeclarationStore {
    state: RwLock<HashMap<String, BTreeMap<String, Declaration>>>,
}

impl InMemoryDeclarationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store declarations unconditionally, assigning revision 1 to each.
    ///
    /// Bypasses admission entirely, so it can seed an inconsistent registry.
    pub fn seed<I>(&self, declarations: I) -> Result<(), StorageError>
    where
        I: IntoIterator<Item = Declaration>,
    {
        let mut state = self.state.write().map_err(|_| lock_err("declaration.seed"))?;
        for declaration in declarations {
            let declaration = declaration.at_revision(1);
            state
                .entry(declaration.meta.namespace.clone())
                .or_default()
                .insert(declaration.meta.name.clone(), declaration);
        }
        Ok(())
    }

    /// Total number of stored declarations across namespaces.
    pub fn len(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("declaration.len"))?;
        Ok(state.values().map(BTreeMap::len).sum())
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl DeclarationStore for InMemoryDeclarationStore {
    fn list(&self, namespace: &str) -> Result<Vec<Declaration>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("declaration.list"))?;
        Ok(state
            .get(namespace)
            .map(|by_name| by_name.values().cloned().collect())
            .unwrap_or_default())
    }

    fn get(&self, target: &ObjectRef) -> Result<Option<Declaration>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("declaration.get"))?;
        Ok(state
            .get(&target.namespace)
            .and_then(|by_name| by_name.get(&target.name))
            .cloned())
    }

    fn put(&self, declaration: Declaration) -> Result<Declaration, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("declaration.put"))?;
        let by_name = state.entry(declaration.meta.namespace.clone()).or_default();

        let stored_revision = by_name.get(&declaration.meta.name).map(|d| d.revision);
        match stored_revision {
            None if declaration.revision != 0 => {
                return Err(StorageError::NotFound(declaration.meta));
            }
            Some(expected) if expected != declaration.revision => {
                return Err(StorageError::StaleRevision {
                    object: declaration.meta,
                    expected,
                    actual: declaration.revision,
                });
            }
            _ => {}
        }

        let next = declaration.revision + 1;
        let stored = declaration.at_revision(next);
        by_name.insert(stored.meta.name.clone(), stored.clone());
        Ok(stored)
    }

    fn delete(&self, target: &ObjectRef) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("declaration.delete"))?;
        let removed = state
            .get_mut(&target.namespace)
            .and_then(|by_name| by_name.remove(&target.name));
        match removed {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(target.clone())),
        }
    }
}
