use thiserror::Error;

use planora_core::{Entity, ExpectedVersion};

/// A record that can live in a [`Collection`].
pub trait Document: Entity + Clone + Send + Sync + 'static
where
    Self::Id: Clone + Send + Sync + core::fmt::Debug,
{
    /// Collection name, used in logs and error context.
    const COLLECTION: &'static str;
}

/// Storage-level failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("document not found")]
    NotFound,

    /// An insert collided with an existing document id.
    #[error("duplicate document id: {0}")]
    DuplicateId(String),

    /// Optimistic concurrency check failed (a concurrent writer got there
    /// first).
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// A query parameter could not be interpreted (e.g. malformed search
    /// pattern).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The backend itself failed (poisoned lock, lost connection, ...).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// A document together with its storage version.
///
/// Versions start at 1 and increase by 1 per successful write. They exist for
/// concurrency control only and are never domain state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub doc: T,
}

/// One collection of documents, addressable by id.
pub trait Collection<T: Document>: Send + Sync {
    /// Insert a new document. Fails with [`StoreError::DuplicateId`] when the
    /// id is already taken.
    fn insert(&self, doc: T) -> Result<Versioned<T>, StoreError>;

    /// Fetch a document by id.
    fn get(&self, id: &T::Id) -> Result<Option<Versioned<T>>, StoreError>;

    /// Replace an existing document.
    ///
    /// `expected` selects the write discipline: `Any` gives last-writer-wins
    /// (plain CRUD updates), `Exact(v)` is a compare-and-swap that fails with
    /// [`StoreError::Concurrency`] when the stored version moved.
    fn put(&self, doc: T, expected: ExpectedVersion) -> Result<Versioned<T>, StoreError>;

    /// Delete a document, returning it if it existed.
    fn remove(&self, id: &T::Id) -> Result<Option<T>, StoreError>;

    /// All documents in the collection (unordered).
    fn list(&self) -> Result<Vec<Versioned<T>>, StoreError>;

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list()?.len())
    }
}

impl<T, S> Collection<T> for std::sync::Arc<S>
where
    T: Document,
    S: Collection<T> + ?Sized,
{
    fn insert(&self, doc: T) -> Result<Versioned<T>, StoreError> {
        (**self).insert(doc)
    }

    fn get(&self, id: &T::Id) -> Result<Option<Versioned<T>>, StoreError> {
        (**self).get(id)
    }

    fn put(&self, doc: T, expected: ExpectedVersion) -> Result<Versioned<T>, StoreError> {
        (**self).put(doc, expected)
    }

    fn remove(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        (**self).remove(id)
    }

    fn list(&self) -> Result<Vec<Versioned<T>>, StoreError> {
        (**self).list()
    }

    fn count(&self) -> Result<usize, StoreError> {
        (**self).count()
    }
}
