//! Pure authorization rules, evaluated before any mutation.

use uuid::Uuid;

use crate::principal::{Principal, Role};

/// Reason shown to a requester who may not edit or delete an ad.
pub const NOT_OWNER_MESSAGE: &str = "This ad does not belong to you, you cannot modify it";

/// Whether a requester may create an ad under the given login policy.
pub fn can_create(principal: Option<&Principal>, require_login: bool) -> bool {
    !require_login || principal.is_some_and(|p| p.has_role(Role::User))
}

/// `(user and principal == author) or admin`.
pub fn can_modify(principal: &Principal, author_id: Option<Uuid>) -> bool {
    (principal.has_role(Role::User) && author_id == Some(principal.user_id)) || principal.is_admin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Principal {
        Principal::new(Uuid::new_v4(), "ana", vec![Role::User])
    }

    fn admin() -> Principal {
        Principal::new(Uuid::new_v4(), "root", vec![Role::Admin])
    }

    #[test]
    fn author_may_modify_own_ad() {
        let author = user();
        assert!(can_modify(&author, Some(author.user_id)));
    }

    #[test]
    fn other_user_may_not_modify() {
        let author = user();
        let stranger = user();
        assert!(!can_modify(&stranger, Some(author.user_id)));
    }

    #[test]
    fn admin_may_modify_any_ad() {
        assert!(can_modify(&admin(), Some(Uuid::new_v4())));
        assert!(can_modify(&admin(), None));
    }

    #[test]
    fn authorless_ad_is_admin_only() {
        assert!(!can_modify(&user(), None));
    }

    #[test]
    fn create_policy_follows_configuration() {
        let principal = user();
        assert!(can_create(Some(&principal), true));
        assert!(!can_create(None, true));
        assert!(can_create(None, false));
    }
}
