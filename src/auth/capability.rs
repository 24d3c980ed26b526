//! Single capability-checking surface for route handlers. Every endpoint
//! goes through these helpers instead of re-deriving role booleans.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "member" => Ok(Role::Member),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Actions gated by role; handlers name the capability, not the roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CreateContent,
    EditContent,
    DeleteContent,
    HardDeleteContent,
    ViewReports,
    ManageUsers,
}

impl Role {
    pub fn allows(&self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::Manager => matches!(
                capability,
                Capability::CreateContent
                    | Capability::EditContent
                    | Capability::DeleteContent
                    | Capability::ViewReports
            ),
            Role::Member => false,
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can_create_content(&self) -> bool {
        self.role.allows(Capability::CreateContent)
    }

    pub fn can_edit_content(&self) -> bool {
        self.role.allows(Capability::EditContent)
    }

    pub fn can_delete_content(&self) -> bool {
        self.role.allows(Capability::DeleteContent)
    }
}

/// Require a capability, or fail with 403
pub fn require(auth: &AuthUser, capability: Capability) -> Result<(), ApiError> {
    if auth.role.allows(capability) {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "role '{}' may not perform this action",
            auth.role
        )))
    }
}

/// Require a capability unless the caller owns the resource
pub fn require_owner_or(
    auth: &AuthUser,
    owner: Option<Uuid>,
    capability: Capability,
) -> Result<(), ApiError> {
    if owner == Some(auth.user_id) {
        return Ok(());
    }
    require(auth, capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser { user_id: Uuid::new_v4(), email: "t@example.com".into(), role }
    }

    #[test]
    fn role_parses() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("member".parse::<Role>().unwrap(), Role::Member);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn admin_allows_everything() {
        let admin = user(Role::Admin);
        for cap in [
            Capability::CreateContent,
            Capability::EditContent,
            Capability::DeleteContent,
            Capability::HardDeleteContent,
            Capability::ViewReports,
            Capability::ManageUsers,
        ] {
            assert!(require(&admin, cap).is_ok());
        }
    }

    #[test]
    fn manager_cannot_hard_delete_or_manage_users() {
        let manager = user(Role::Manager);
        assert!(manager.can_create_content());
        assert!(manager.can_edit_content());
        assert!(manager.can_delete_content());
        assert!(require(&manager, Capability::HardDeleteContent).is_err());
        assert!(require(&manager, Capability::ManageUsers).is_err());
    }

    #[test]
    fn member_has_no_content_capabilities() {
        let member = user(Role::Member);
        assert!(!member.can_create_content());
        assert!(!member.can_edit_content());
        assert!(!member.can_delete_content());
        assert!(require(&member, Capability::ViewReports).is_err());
    }

    #[test]
    fn owner_bypasses_capability_check() {
        let member = user(Role::Member);
        assert!(require_owner_or(&member, Some(member.user_id), Capability::EditContent).is_ok());
        assert!(require_owner_or(&member, Some(Uuid::new_v4()), Capability::EditContent).is_err());
        assert!(require_owner_or(&member, None, Capability::EditContent).is_err());
    }
}
