//! Role and ownership checks shared by every component.

use crate::auth::auth::AuthUser;
use crate::error::{ServiceError, ServiceResult};
use crate::model::role::Role;

/// Admins act on anything; everyone else only on what they own.
pub fn can_act_on(actor: &AuthUser, owner_id: u64) -> bool {
    actor.role.is_admin() || actor.user_id == owner_id
}

pub fn authorize(actor: &AuthUser, owner_id: u64) -> ServiceResult<()> {
    if can_act_on(actor, owner_id) {
        Ok(())
    } else {
        Err(ServiceError::forbidden())
    }
}

/// Owner only; the actor's role grants nothing here.
pub fn require_owner(actor: &AuthUser, owner_id: u64) -> ServiceResult<()> {
    if actor.user_id == owner_id {
        Ok(())
    } else {
        Err(ServiceError::forbidden())
    }
}

pub fn require_admin(actor: &AuthUser) -> ServiceResult<()> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("Access denied. Admin only.".into()))
    }
}

pub fn require_super_admin(actor: &AuthUser) -> ServiceResult<()> {
    if actor.role == Role::SuperAdmin {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("Access denied. Super admin only.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(user_id: u64, role: Role) -> AuthUser {
        AuthUser {
            user_id,
            email: format!("user{user_id}@keytrak.com"),
            role,
        }
    }

    #[test]
    fn owner_may_act() {
        assert!(can_act_on(&actor(7, Role::Employee), 7));
        assert!(authorize(&actor(7, Role::Employee), 7).is_ok());
    }

    #[test]
    fn other_employee_is_forbidden() {
        assert!(!can_act_on(&actor(8, Role::Employee), 7));
        assert!(matches!(
            authorize(&actor(8, Role::Employee), 7),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn admins_act_on_anything() {
        assert!(can_act_on(&actor(1, Role::Admin), 7));
        assert!(can_act_on(&actor(1, Role::SuperAdmin), 7));
    }

    #[test]
    fn ownership_ignores_role() {
        assert!(require_owner(&actor(7, Role::Employee), 7).is_ok());
        assert!(require_owner(&actor(1, Role::SuperAdmin), 1).is_ok());
        assert!(matches!(
            require_owner(&actor(1, Role::SuperAdmin), 7),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn role_gates() {
        assert!(require_admin(&actor(1, Role::Admin)).is_ok());
        assert!(require_admin(&actor(1, Role::SuperAdmin)).is_ok());
        assert!(require_admin(&actor(1, Role::Employee)).is_err());
        assert!(require_super_admin(&actor(1, Role::SuperAdmin)).is_ok());
        assert!(require_super_admin(&actor(1, Role::Admin)).is_err());
    }
}
