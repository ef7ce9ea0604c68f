use planora_auth::Role;
use planora_core::UserId;

/// Principal context for a request (authenticated identity + role).
///
/// This is immutable and must be present for all protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    user_name: String,
    role: Role,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, user_name: String, role: Role) -> Self {
        Self {
            user_id,
            user_name,
            role,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn role(&self) -> &Role {
        &self.role
    }
}
