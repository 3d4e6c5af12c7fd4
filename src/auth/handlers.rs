use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::{ServiceError, ServiceResult},
    model::user::User,
    models::{LoginReqDto, RegisterReq, TokenType},
    service::users,
    store::{MySqlStore, UserStore},
    utils::{email_index::EmailIndex, time_window},
};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

// auth end points

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available<S: UserStore>(
    email: &str,
    index: &EmailIndex,
    store: &S,
) -> bool {
    // 1. Cuckoo filter: a miss means the email was never registered
    if !index.might_exist(email) {
        return true;
    }

    // 2. Moka cache: recently seen as taken
    if index.is_known_taken(email) {
        return false;
    }

    // 3. Database fallback; on error let the insert's unique key decide
    match store.find_user_by_email(email).await {
        Ok(found) => found.is_none(),
        Err(e) => {
            error!(error = %e, "Email availability lookup failed");
            true
        }
    }
}

/// Issues a fresh access/refresh pair and persists the refresh jti.
async fn issue_tokens(store: &MySqlStore, config: &Config, user: &User) -> ServiceResult<TokenPair> {
    let access_token = generate_access_token(
        user.id,
        user.email.clone(),
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| ServiceError::Internal(e.to_string()))?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user.id,
        user.email.clone(),
        user.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(|e| ServiceError::Internal(e.to_string()))?;

    debug!(user_id = user.id, jti = %refresh_claims.jti, "Storing refresh token");
    store
        .insert_refresh_token(user.id, &refresh_claims.jti, refresh_claims.exp as i64)
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Register a new employee account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Invalid payload", body = Object, example = json!({
            "error": "Password must be at least 8 characters"
        })),
        (status = 409, description = "Email already registered", body = Object, example = json!({
            "error": "Email already registered"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(body, store, index), fields(email = %body.email))]
pub async fn register(
    body: web::Json<RegisterReq>,
    store: web::Data<MySqlStore>,
    index: web::Data<EmailIndex>,
) -> Result<HttpResponse, ServiceError> {
    body.validate()?;

    let email = users::normalize_email(&body.email);
    if !is_email_available(&email, index.get_ref(), store.get_ref()).await {
        info!("Registration rejected: email taken");
        return Err(ServiceError::Conflict("Email already registered".into()));
    }

    let user = users::register(
        store.get_ref(),
        &email,
        &body.name,
        &body.password,
        time_window::now(),
    )
    .await?;

    // keep the availability checks in step with the table
    index.mark_taken(&user.email).await;

    info!(user_id = user.id, "User registered");
    Ok(HttpResponse::Created().json(user))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "error": "Invalid credentials"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(body, store, config), fields(email = %body.email))]
pub async fn login(
    body: web::Json<LoginReqDto>,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ServiceError> {
    info!("Login request received");
    body.validate()?;

    let invalid = || ServiceError::Unauthorized("Invalid credentials".into());

    debug!("Fetching user from database");
    let user = match store
        .find_user_by_email(&users::normalize_email(&body.email))
        .await?
    {
        Some(user) => user,
        None => {
            info!("Invalid credentials: user not found");
            return Err(invalid());
        }
    };

    if let Err(e) = verify_password(&body.password, &user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(invalid());
    }
    debug!(user_id = user.id, "Password verified");

    let tokens = issue_tokens(store.get_ref(), config.get_ref(), &user).await?;

    // not fatal for the login itself
    if let Err(e) = store.touch_last_login(user.id, time_window::now()).await {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = user.id, "Login successful");
    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user,
    }))
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ServiceError> {
    let unauthorized = || ServiceError::Unauthorized("Invalid refresh token".into());

    let token = bearer_token(&req).ok_or_else(unauthorized)?;
    let claims = verify_token(token, &config.jwt_secret).map_err(|_| unauthorized())?;
    if claims.token_type != TokenType::Refresh {
        return Err(unauthorized());
    }

    // revoke old refresh token; a second use of the same jti fails here
    let owner = store
        .revoke_refresh_token(&claims.jti)
        .await?
        .ok_or_else(unauthorized)?;

    // re-read so a role change since login is reflected in the new tokens
    let user = store.find_user(owner).await?.ok_or_else(unauthorized)?;
    let tokens = issue_tokens(store.get_ref(), config.get_ref(), &user).await?;

    debug!(user_id = user.id, "Refresh token rotated");
    Ok(HttpResponse::Ok().json(tokens))
}

/// Revoke a refresh token. Always 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logged out")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
) -> HttpResponse {
    let claims = match bearer_token(&req).map(|t| verify_token(t, &config.jwt_secret)) {
        Some(Ok(claims)) if claims.token_type == TokenType::Refresh => claims,
        _ => return HttpResponse::NoContent().finish(),
    };

    // idempotent
    if let Err(e) = store.revoke_refresh_token(&claims.jti).await {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User no longer exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let user = users::get_user(store.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}
