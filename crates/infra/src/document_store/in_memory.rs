use std::collections::HashMap;
use std::sync::RwLock;

use planora_core::ExpectedVersion;

use super::r#trait::{Collection, Document, StoreError, Versioned};

/// In-memory document collection.
///
/// Intended for tests/dev and as the reference implementation of the
/// `Collection` concurrency contract. Not optimized for large data sets.
#[derive(Debug)]
pub struct InMemoryCollection<T: Document> {
    inner: RwLock<HashMap<T::Id, Versioned<T>>>,
}

impl<T: Document> InMemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Document> Default for InMemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

impl<T: Document> Collection<T> for InMemoryCollection<T> {
    fn insert(&self, doc: T) -> Result<Versioned<T>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let id = doc.id().clone();
        if map.contains_key(&id) {
            return Err(StoreError::DuplicateId(format!(
                "{}: {:?}",
                T::COLLECTION,
                id
            )));
        }

        let stored = Versioned { version: 1, doc };
        map.insert(id, stored.clone());
        Ok(stored)
    }

    fn get(&self, id: &T::Id) -> Result<Option<Versioned<T>>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(id).cloned())
    }

    fn put(&self, doc: T, expected: ExpectedVersion) -> Result<Versioned<T>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let id = doc.id().clone();

        let current = map.get(&id).ok_or(StoreError::NotFound)?;
        if !expected.matches(current.version) {
            return Err(StoreError::Concurrency(format!(
                "{}: expected {expected:?}, found {}",
                T::COLLECTION,
                current.version
            )));
        }

        let stored = Versioned {
            version: current.version + 1,
            doc,
        };
        map.insert(id, stored.clone());
        Ok(stored)
    }

    fn remove(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(id).map(|v| v.doc))
    }

    fn list(&self) -> Result<Vec<Versioned<T>>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.len())
    }
}
