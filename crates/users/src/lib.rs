//! User domain module.
//!
//! Account records and their RBAC role. Credential storage and token
//! issuance are out of scope; tokens arrive already minted and are only
//! validated at the API boundary.

pub mod user;

pub use user::{User, UserDraft, UserRole, UserUpdate};
