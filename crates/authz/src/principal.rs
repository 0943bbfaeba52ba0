use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Roles carried by a principal's token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// The authenticated requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub name: String,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(user_id: Uuid, name: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            name: name.into(),
            roles,
        }
    }

    /// Every authenticated principal implicitly holds [`Role::User`].
    pub fn has_role(&self, role: Role) -> bool {
        role == Role::User || self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_role_is_implicit() {
        let principal = Principal::new(Uuid::new_v4(), "ana", vec![]);
        assert!(principal.has_role(Role::User));
        assert!(!principal.is_admin());
    }

    #[test]
    fn admin_role_comes_from_token() {
        let principal = Principal::new(Uuid::new_v4(), "root", vec![Role::Admin]);
        assert!(principal.is_admin());
    }
}
