use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::auth::{auth::AuthUser, password::hash_password, policy};
use crate::config::SuperAdminSeed;
use crate::error::{ServiceError, ServiceResult};
use crate::model::role::Role;
use crate::model::user::{NewUser, User};
use crate::store::UserStore;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Self-service registration; the account is always an EMPLOYEE.
pub async fn register<S: UserStore>(
    store: &S,
    email: &str,
    name: &str,
    password: &str,
    now: NaiveDateTime,
) -> ServiceResult<User> {
    create_user(store, email, name, password, Role::Employee, now).await
}

async fn create_user<S: UserStore>(
    store: &S,
    email: &str,
    name: &str,
    password: &str,
    role: Role,
    now: NaiveDateTime,
) -> ServiceResult<User> {
    let password_hash =
        hash_password(password).map_err(|e| ServiceError::Internal(e.to_string()))?;

    store
        .insert_user(NewUser {
            email: normalize_email(email),
            name: name.trim().to_string(),
            password_hash,
            role,
            created_at: now,
        })
        .await
        .map_err(|e| match ServiceError::from(e) {
            ServiceError::Conflict(_) => ServiceError::Conflict("Email already registered".into()),
            other => other,
        })
}

/// Creates the bootstrap SUPER_ADMIN unless the email is already present.
/// Returns whether an account was created.
pub async fn ensure_super_admin<S: UserStore>(
    store: &S,
    seed: &SuperAdminSeed,
    now: NaiveDateTime,
) -> ServiceResult<bool> {
    if let Some(existing) = store.find_user_by_email(&normalize_email(&seed.email)).await? {
        if existing.role != Role::SuperAdmin {
            warn!(user_id = existing.id, "Bootstrap email belongs to a non super admin account");
        }
        return Ok(false);
    }

    let user = create_user(store, &seed.email, &seed.name, &seed.password, Role::SuperAdmin, now)
        .await?;
    info!(user_id = user.id, "Super admin account created");
    Ok(true)
}

pub async fn get_user<S: UserStore>(store: &S, user_id: u64) -> ServiceResult<User> {
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User not found".into()))
}

pub async fn list_users<S: UserStore>(store: &S, actor: &AuthUser) -> ServiceResult<Vec<User>> {
    policy::require_super_admin(actor)?;
    Ok(store.list_users(None).await?)
}

pub async fn list_employees<S: UserStore>(
    store: &S,
    actor: &AuthUser,
) -> ServiceResult<Vec<User>> {
    policy::require_admin(actor)?;
    Ok(store.list_users(Some(Role::Employee)).await?)
}

pub async fn update_role<S: UserStore>(
    store: &S,
    actor: &AuthUser,
    user_id: u64,
    role: Role,
    now: NaiveDateTime,
) -> ServiceResult<User> {
    policy::require_super_admin(actor)?;

    let user = store
        .update_user_role(user_id, role, now)
        .await
        .map_err(|e| match ServiceError::from(e) {
            ServiceError::NotFound(_) => ServiceError::NotFound("User not found".into()),
            other => other,
        })?;

    info!(user_id, by = actor.user_id, role = %role, "User role updated");
    Ok(user)
}
