//! API-side authorization guard for requests.
//!
//! This enforces authorization at the handler boundary (before any storage
//! access), while keeping domain crates and infra auth-agnostic.

use planora_auth::{authorize, AuthzError, CommandAuthorization, Permission, Principal, Role};

use crate::context::PrincipalContext;

/// Check authorization for a request in the current principal context.
///
/// This is intended to be called **before** touching any collection.
pub fn authorize_command<C: CommandAuthorization>(
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let resolved = Principal {
        user_id: principal.user_id(),
        role: principal.role().clone(),
        permissions: permissions_for_role(principal.role()),
    };

    for perm in command.required_permissions() {
        authorize(&resolved, perm)?;
    }

    Ok(())
}

/// Role → permission policy.
///
/// Mirrors the per-route role guards of the source system: admins hold the
/// wildcard, managers run operations, team members execute assigned work,
/// clients read their events and approve budgets.
fn permissions_for_role(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "admin" => vec![Permission::new("*")],
        "manager" => [
            "users.read",
            "events.create",
            "events.read",
            "events.update",
            "events.delete",
            "tasks.create",
            "tasks.read",
            "tasks.update",
            "tasks.delete",
            "comments.create",
            "comments.read",
            "comments.delete",
            "budgets.create",
            "budgets.read",
            "budgets.update",
            "budgets.delete",
            "budgets.approve",
            "inventory.items.create",
            "inventory.items.read",
            "inventory.items.update",
            "inventory.items.delete",
            "inventory.items.reserve",
            "inventory.items.cancel",
        ]
        .into_iter()
        .map(Permission::new)
        .collect(),
        "team-member" => [
            "tasks.create",
            "tasks.read",
            "tasks.update",
            "comments.create",
            "comments.read",
            "inventory.items.create",
            "inventory.items.read",
            "inventory.items.update",
            "inventory.items.reserve",
        ]
        .into_iter()
        .map(Permission::new)
        .collect(),
        "client" => [
            "events.read",
            "tasks.read",
            "comments.create",
            "comments.read",
            "budgets.approve",
        ]
        .into_iter()
        .map(Permission::new)
        .collect(),
        _ => Vec::new(),
    }
}
