use crate::{
    auth::auth::AuthUser,
    error::ServiceError,
    model::time_log::{TimeLog, TimeLogType},
    service::time_session,
    store::MySqlStore,
    utils::time_window::{self, format_hms},
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartTimeLogReq {
    #[serde(rename = "type", default)]
    pub kind: TimeLogType,
    #[schema(example = 12, nullable = true)]
    pub task_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTimeLogResponse {
    pub time_log: Option<TimeLog>,
    /// Live elapsed time of the open session, 0 when idle.
    #[schema(example = 1_800_000)]
    pub elapsed_ms: i64,
    #[schema(example = "00:30:00")]
    pub elapsed: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DailyQuery {
    /// Calendar day, defaults to today
    #[param(example = "2026-01-01", value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogsResponse {
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub logs: Vec<TimeLog>,
    #[schema(example = 1_800_000)]
    pub total_work_ms: i64,
    #[schema(example = "00:30:00")]
    pub total_work: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateNotesReq {
    #[schema(example = "Fixed the login bug", nullable = true)]
    pub notes: Option<String>,
}

/// Start a work or break session
#[utoipa::path(
    post,
    path = "/api/time-logs/start",
    request_body = StartTimeLogReq,
    responses(
        (status = 201, description = "Session started", body = TimeLog),
        (status = 400, description = "Unknown task"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A session is already running", body = Object, example = json!({
            "error": "A time log is already running; stop it first"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeLog"
)]
pub async fn start(
    auth: AuthUser,
    body: web::Json<StartTimeLogReq>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let body = body.into_inner();
    let log = time_session::start_session(
        store.get_ref(),
        auth.user_id,
        body.kind,
        body.task_id,
        time_window::now(),
    )
    .await?;
    Ok(HttpResponse::Created().json(log))
}

/// Stop the running session
#[utoipa::path(
    post,
    path = "/api/time-logs/stop",
    responses(
        (status = 200, description = "Session stopped", body = TimeLog),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No running session", body = Object, example = json!({
            "error": "No active time log found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeLog"
)]
pub async fn stop(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let log = time_session::stop_session(store.get_ref(), auth.user_id, time_window::now()).await?;
    Ok(HttpResponse::Ok().json(log))
}

/// The running session, if any
#[utoipa::path(
    get,
    path = "/api/time-logs/current",
    responses(
        (status = 200, description = "Current session or null", body = CurrentTimeLogResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeLog"
)]
pub async fn current(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let time_log = time_session::current_session(store.get_ref(), auth.user_id).await?;
    let elapsed_ms = time_log
        .as_ref()
        .map(|log| time_session::elapsed_ms(log, time_window::now()))
        .unwrap_or(0);

    Ok(HttpResponse::Ok().json(CurrentTimeLogResponse {
        time_log,
        elapsed_ms,
        elapsed: format_hms(elapsed_ms),
    }))
}

/// Own logs started on a day, with the closed WORK total
#[utoipa::path(
    get,
    path = "/api/time-logs/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "Logs of the day", body = DailyLogsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeLog"
)]
pub async fn daily(
    auth: AuthUser,
    query: web::Query<DailyQuery>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let date = query.date.unwrap_or_else(|| time_window::now().date());
    let logs = time_session::daily_logs(store.get_ref(), auth.user_id, date).await?;
    let total_work_ms = time_session::work_total_ms(&logs);

    Ok(HttpResponse::Ok().json(DailyLogsResponse {
        date,
        logs,
        total_work_ms,
        total_work: format_hms(total_work_ms),
    }))
}

/// Replace the notes of one of your own logs
#[utoipa::path(
    patch,
    path = "/api/time-logs/{id}/notes",
    params(
        ("id" = u64, Path, description = "Time log id")
    ),
    request_body = UpdateNotesReq,
    responses(
        (status = 200, description = "Notes updated", body = TimeLog),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Time log not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "TimeLog"
)]
pub async fn update_notes(
    auth: AuthUser,
    path: web::Path<u64>,
    body: web::Json<UpdateNotesReq>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let log = time_session::update_notes(
        store.get_ref(),
        &auth,
        path.into_inner(),
        body.into_inner().notes,
    )
    .await?;
    Ok(HttpResponse::Ok().json(log))
}
