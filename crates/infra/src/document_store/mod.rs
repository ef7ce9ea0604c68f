//! Generic document store abstraction.
//!
//! One `Collection` per document type; documents are versioned so writers can
//! opt into compare-and-swap updates via [`planora_core::ExpectedVersion`].

mod in_memory;
pub mod query;
mod r#trait;

pub use in_memory::InMemoryCollection;
pub use query::{paginate, Page, Pagination, TextSearch};
pub use r#trait::{Collection, Document, StoreError, Versioned};
