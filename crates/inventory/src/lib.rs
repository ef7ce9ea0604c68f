//! Inventory domain module.
//!
//! This crate contains business rules for inventory items and their
//! date-scoped reservations, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage). The admission decision — whether a
//! reservation request fits the remaining per-date capacity — lives here;
//! serializing admissions against concurrent writers is the storage layer's
//! job.

pub mod item;
pub mod ledger;

pub use item::{Condition, InventoryItem, ItemDraft, ItemUpdate, Reservation};
pub use ledger::AdmissionError;
