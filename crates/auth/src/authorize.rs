use std::collections::HashSet;

use thiserror::Error;

use planora_core::UserId;

use crate::{Permission, Role};

/// A fully resolved principal for authorization decisions.
///
/// Construction is intentionally decoupled from storage and transport: the
/// API derives the permission set from the role claim and its policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Operation-side authorization contract (checked at the handler boundary).
///
/// Implement this on requests that require permissions.
/// The API layer should enforce these requirements before touching storage.
pub trait CommandAuthorization {
    fn required_permissions(&self) -> &[Permission];
}

/// Authorize a principal against a required permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let perms: HashSet<&str> = principal.permissions.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(perms: &[&'static str]) -> Principal {
        Principal {
            user_id: UserId::new(),
            role: Role::new("manager"),
            permissions: perms.iter().map(|p| Permission::new(*p)).collect(),
        }
    }

    #[test]
    fn wildcard_grants_everything() {
        let p = principal(&["*"]);
        assert!(authorize(&p, &Permission::new("events.create")).is_ok());
        assert!(authorize(&p, &Permission::new("inventory.items.delete")).is_ok());
    }

    #[test]
    fn explicit_permission_grants_only_itself() {
        let p = principal(&["tasks.read"]);
        assert!(authorize(&p, &Permission::new("tasks.read")).is_ok());

        let err = authorize(&p, &Permission::new("tasks.delete")).unwrap_err();
        assert_eq!(err, AuthzError::Forbidden("tasks.delete".to_string()));
    }

    #[test]
    fn empty_permission_set_denies() {
        let p = principal(&[]);
        assert!(authorize(&p, &Permission::new("events.read")).is_err());
    }
}
