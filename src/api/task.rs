use crate::{
    auth::auth::AuthUser,
    error::ServiceError,
    model::task::TaskStatus,
    service::task_board::{self, CreateTaskInput},
    store::MySqlStore,
    utils::time_window,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskReq {
    #[schema(example = "Prepare monthly report")]
    pub name: String,
    #[schema(example = "Collect figures from finance", nullable = true)]
    pub description: Option<String>,
    /// Admins only; others always create tasks for themselves
    #[schema(example = 7, nullable = true)]
    pub assignee_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TaskListQuery {
    /// Only tasks created today
    #[param(example = true)]
    pub today: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskStatusReq {
    pub status: TaskStatus,
}

/// Create a task
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskReq,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Missing name or unknown assignee"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Task"
)]
pub async fn create_task(
    auth: AuthUser,
    body: web::Json<CreateTaskReq>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let body = body.into_inner();
    let task = task_board::create_task(
        store.get_ref(),
        &auth,
        CreateTaskInput {
            name: body.name,
            description: body.description,
            assignee_id: body.assignee_id,
        },
        time_window::now(),
    )
    .await?;
    Ok(HttpResponse::Created().json(task))
}

/// List visible tasks, newest first
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(TaskListQuery),
    responses(
        (status = 200, description = "Tasks", body = [Task]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Task"
)]
pub async fn list_tasks(
    auth: AuthUser,
    query: web::Query<TaskListQuery>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let today = query
        .today
        .unwrap_or(false)
        .then(|| time_window::now().date());
    let tasks = task_board::list_tasks(store.get_ref(), &auth, today).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Change a task's status
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}/status",
    params(
        ("id" = u64, Path, description = "Task id")
    ),
    request_body = UpdateTaskStatusReq,
    responses(
        (status = 200, description = "Status updated", body = Task),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the assignee", body = Object, example = json!({
            "error": "Not authorized to update this task"
        })),
        (status = 404, description = "Task not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Task"
)]
pub async fn update_status(
    auth: AuthUser,
    path: web::Path<u64>,
    body: web::Json<UpdateTaskStatusReq>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let task = task_board::update_status(
        store.get_ref(),
        &auth,
        path.into_inner(),
        body.status,
        time_window::now(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(task))
}
