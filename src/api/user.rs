use crate::{
    auth::auth::AuthUser,
    error::ServiceError,
    model::role::Role,
    service::users,
    store::MySqlStore,
    utils::time_window,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleReq {
    pub role: Role,
}

/// Every account, ordered by name
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Super admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn list_users(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let users = users::list_users(store.get_ref(), &auth).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Accounts with the EMPLOYEE role
#[utoipa::path(
    get,
    path = "/api/users/employees",
    responses(
        (status = 200, description = "Employees", body = [User]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn list_employees(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let employees = users::list_employees(store.get_ref(), &auth).await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Change an account's role
#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    params(
        ("id" = u64, Path, description = "User id")
    ),
    request_body = UpdateRoleReq,
    responses(
        (status = 200, description = "Role updated", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Super admin only"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn update_role(
    auth: AuthUser,
    path: web::Path<u64>,
    body: web::Json<UpdateRoleReq>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let user = users::update_role(
        store.get_ref(),
        &auth,
        path.into_inner(),
        body.role,
        time_window::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(user))
}
