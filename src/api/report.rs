//! Admin dashboards and reports. Everything here is admin-only except an
//! employee reading their own daily summary.

use crate::{
    auth::{auth::AuthUser, policy},
    error::ServiceError,
    service::reporting,
    store::{MySqlStore, Window},
    utils::time_window::{self, end_of_day, start_of_day},
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DateRangeQuery {
    /// First day, inclusive
    #[param(example = "2026-01-01", value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    /// Last day, inclusive
    #[param(example = "2026-01-31", value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
}

impl DateRangeQuery {
    /// Start and end instants; missing days fall back to `today`.
    pub fn bounded(&self, today: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        (
            start_of_day(self.start_date.unwrap_or(today)),
            end_of_day(self.end_date.unwrap_or(today)),
        )
    }

    /// Missing days leave that side open.
    pub fn open_ended(&self) -> Window {
        Window {
            from: self.start_date.map(start_of_day),
            to: self.end_date.map(end_of_day),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeTimeLogsQuery {
    #[param(example = 7)]
    pub employee_id: u64,
    /// Defaults to today
    #[param(example = "2026-01-01", value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    /// Defaults to today
    #[param(example = "2026-01-31", value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
}

impl EmployeeTimeLogsQuery {
    pub fn range(&self, today: NaiveDate) -> Window {
        let (start, end) = DateRangeQuery {
            start_date: self.start_date,
            end_date: self.end_date,
        }
        .bounded(today);
        Window::between(start, end)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WorkHoursQuery {
    #[param(example = "2026-01-01", value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[param(example = "2026-01-31", value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    /// Restrict to one employee
    #[param(example = 7)]
    pub employee_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DayQuery {
    /// Defaults to today
    #[param(example = "2026-01-01", value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TasksReportQuery {
    /// Defaults to today
    #[param(example = "2026-01-01", value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    /// List only COMPLETE tasks; the totals still cover every task
    #[param(example = false)]
    pub completed_only: Option<bool>,
}

fn today() -> NaiveDate {
    time_window::now().date()
}

/// Who is working right now
#[utoipa::path(
    get,
    path = "/api/admin/employee-status",
    responses(
        (status = 200, description = "One entry per employee", body = [EmployeeWorkStatus]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn employee_status(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_admin()?;
    let statuses = reporting::employee_work_status(store.get_ref(), time_window::now()).await?;
    Ok(HttpResponse::Ok().json(statuses))
}

/// Hours worked and tasks completed per employee
#[utoipa::path(
    get,
    path = "/api/admin/productivity-metrics",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "One entry per employee", body = [ProductivityMetric]),
        (status = 400, description = "start_date after end_date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn productivity_metrics(
    auth: AuthUser,
    query: web::Query<DateRangeQuery>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_admin()?;
    let (start, end) = query.bounded(today());
    let metrics = reporting::productivity_metrics(store.get_ref(), start, end).await?;
    Ok(HttpResponse::Ok().json(metrics))
}

/// Closed logs of one employee
#[utoipa::path(
    get,
    path = "/api/admin/employee-time-logs",
    params(EmployeeTimeLogsQuery),
    responses(
        (status = 200, description = "Time logs, newest first", body = [TimeLog]),
        (status = 400, description = "start_date after end_date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Admin"
)]
pub async fn employee_time_logs(
    auth: AuthUser,
    query: web::Query<EmployeeTimeLogsQuery>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_admin()?;
    let range = query.range(today());
    let logs = reporting::employee_time_logs(store.get_ref(), query.employee_id, range).await?;
    Ok(HttpResponse::Ok().json(logs))
}

/// Hours, completed tasks and notes of one employee for a day
#[utoipa::path(
    get,
    path = "/api/reports/daily-summary/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        DayQuery
    ),
    responses(
        (status = 200, description = "Daily summary", body = DailySummary),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Another employee's summary"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn daily_summary(
    auth: AuthUser,
    path: web::Path<u64>,
    query: web::Query<DayQuery>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let employee_id = path.into_inner();
    policy::authorize(&auth, employee_id)?;

    let day = query.date.unwrap_or_else(today);
    let summary = reporting::daily_summary(store.get_ref(), employee_id, day).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Work and break hours grouped by employee and day
#[utoipa::path(
    get,
    path = "/api/reports/work-hours",
    params(WorkHoursQuery),
    responses(
        (status = 200, description = "Rows ordered by date, then employee", body = [WorkHoursRow]),
        (status = 400, description = "start_date after end_date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn work_hours(
    auth: AuthUser,
    query: web::Query<WorkHoursQuery>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_admin()?;
    let created = DateRangeQuery {
        start_date: query.start_date,
        end_date: query.end_date,
    }
    .open_ended();
    let rows = reporting::work_hours_report(store.get_ref(), created, query.employee_id).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Tasks created on a day with the completion rate
#[utoipa::path(
    get,
    path = "/api/reports/tasks",
    params(TasksReportQuery),
    responses(
        (status = 200, description = "Tasks report", body = TasksReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn tasks(
    auth: AuthUser,
    query: web::Query<TasksReportQuery>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    auth.require_admin()?;
    let day = query.date.unwrap_or_else(today);
    let report = reporting::tasks_report(
        store.get_ref(),
        day,
        query.completed_only.unwrap_or(false),
    )
    .await?;
    Ok(HttpResponse::Ok().json(report))
}
