//! `planora-auth` — authentication/authorization boundary.
//!
//! Token *issuance* is out of scope: this crate only validates presented
//! tokens and answers permission questions. It is intentionally decoupled
//! from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod roles;

pub use authorize::{authorize, AuthzError, CommandAuthorization, Principal};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::Permission;
pub use roles::Role;
