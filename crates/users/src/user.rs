use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use planora_auth::Role;
use planora_core::{DomainError, DomainResult, Entity, UserId};

/// RBAC role of a user account.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    Admin,
    Manager,
    TeamMember,
    Client,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::TeamMember => "team-member",
            UserRole::Client => "client",
        }
    }

    /// The opaque role carried in JWT claims for this account.
    pub fn to_role(self) -> Role {
        Role::new(self.as_str())
    }
}

/// User account document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub user_name: String,
    pub email: String,
    pub role: UserRole,
    pub address: String,
    pub contact_number: String,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when registering a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub user_name: String,
    pub email: String,
    pub role: UserRole,
    pub address: String,
    pub contact_number: String,
    pub profile_image: Option<String>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: Option<bool>,
}

impl User {
    pub fn create(id: UserId, draft: UserDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        validate_user_name(&draft.user_name)?;
        validate_email(&draft.email)?;

        Ok(Self {
            id,
            user_name: draft.user_name,
            email: draft.email,
            role: draft.role,
            address: draft.address,
            contact_number: draft.contact_number,
            profile_image: draft.profile_image,
            is_active: draft.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: UserUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(user_name) = &update.user_name {
            validate_user_name(user_name)?;
        }
        if let Some(email) = &update.email {
            validate_email(email)?;
        }

        if let Some(user_name) = update.user_name {
            self.user_name = user_name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(address) = update.address {
            self.address = address;
        }
        if let Some(contact_number) = update.contact_number {
            self.contact_number = contact_number;
        }
        if let Some(profile_image) = update.profile_image {
            self.profile_image = Some(profile_image);
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_user_name(user_name: &str) -> DomainResult<()> {
    if user_name.trim().is_empty() {
        return Err(DomainError::validation("user_name cannot be empty"));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    if email.trim().is_empty() {
        return Err(DomainError::validation("email cannot be empty"));
    }
    if !email.contains('@') {
        return Err(DomainError::validation("email must contain '@'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap()
    }

    fn draft() -> UserDraft {
        UserDraft {
            user_name: "amara".to_string(),
            email: "amara@example.com".to_string(),
            role: UserRole::Manager,
            address: "12 Hill Rd".to_string(),
            contact_number: "+94 77 000 0000".to_string(),
            profile_image: None,
            is_active: true,
        }
    }

    #[test]
    fn create_validates_email_shape() {
        let mut d = draft();
        d.email = "not-an-email".to_string();
        let err = User::create(UserId::new(), d, test_time()).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn role_maps_to_wire_names() {
        assert_eq!(UserRole::TeamMember.as_str(), "team-member");
        assert_eq!(UserRole::Admin.to_role().as_str(), "admin");

        let json = serde_json::to_string(&UserRole::TeamMember).unwrap();
        assert_eq!(json, "\"team-member\"");
    }

    #[test]
    fn update_can_deactivate_account() {
        let mut user = User::create(UserId::new(), draft(), test_time()).unwrap();
        assert!(user.is_active);

        let update = UserUpdate {
            is_active: Some(false),
            ..UserUpdate::default()
        };
        user.apply_update(update, test_time()).unwrap();
        assert!(!user.is_active);
        assert_eq!(user.user_name, "amara");
    }
}
