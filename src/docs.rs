use crate::api::attendance::MarkAttendanceReq;
use crate::api::task::{CreateTaskReq, UpdateTaskStatusReq};
use crate::api::time_log::{
    CurrentTimeLogResponse, DailyLogsResponse, StartTimeLogReq, UpdateNotesReq,
};
use crate::api::user::UpdateRoleReq;
use crate::auth::handlers::{LoginResponse, TokenPair};
use crate::model::attendance::{Attendance, AttendanceType};
use crate::model::role::Role;
use crate::model::task::{Task, TaskStatus};
use crate::model::time_log::{TimeLog, TimeLogType};
use crate::model::user::User;
use crate::models::{LoginReqDto, RegisterReq};
use crate::service::reporting::{
    CompletedTask, DailySummary, EmployeeWorkStatus, ProductivityMetric, TaskReportRow,
    TasksReport, WorkHoursRow,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Keytrak API",
        version = "0.1.0",
        description = r#"
## Employee time & attendance tracking

### Key Features
- **Time tracking**
  - Start and stop WORK or BREAK sessions, one open session per employee
  - Daily logs with the closed work total and per-log notes
- **Tasks**
  - Create, assign and move tasks through PLANNED, IN_PROGRESS and COMPLETE
- **Attendance**
  - Geo-tagged LOGIN and LOGOUT events with history
- **Reports**
  - Live employee status, productivity metrics, daily summaries,
    work-hours and task completion reports

### Security
Endpoints under `/api` require a **JWT Bearer** access token obtained from
`/auth/login`. Admin dashboards and reports need the ADMIN or SUPER_ADMIN
role; user management needs SUPER_ADMIN.

### Errors
Failures return `{"error": "<message>"}` with the matching status code.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::time_log::start,
        crate::api::time_log::stop,
        crate::api::time_log::current,
        crate::api::time_log::daily,
        crate::api::time_log::update_notes,

        crate::api::task::create_task,
        crate::api::task::list_tasks,
        crate::api::task::update_status,

        crate::api::attendance::mark,
        crate::api::attendance::history,
        crate::api::attendance::latest,

        crate::api::report::employee_status,
        crate::api::report::productivity_metrics,
        crate::api::report::employee_time_logs,
        crate::api::report::daily_summary,
        crate::api::report::work_hours,
        crate::api::report::tasks,

        crate::api::user::list_users,
        crate::api::user::list_employees,
        crate::api::user::update_role
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            TokenPair,
            User,
            Role,
            TimeLog,
            TimeLogType,
            StartTimeLogReq,
            CurrentTimeLogResponse,
            DailyLogsResponse,
            UpdateNotesReq,
            Task,
            TaskStatus,
            CreateTaskReq,
            UpdateTaskStatusReq,
            Attendance,
            AttendanceType,
            MarkAttendanceReq,
            EmployeeWorkStatus,
            ProductivityMetric,
            DailySummary,
            CompletedTask,
            WorkHoursRow,
            TasksReport,
            TaskReportRow,
            UpdateRoleReq
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token rotation"),
        (name = "TimeLog", description = "Work and break sessions"),
        (name = "Task", description = "Task board"),
        (name = "Attendance", description = "Login/logout events"),
        (name = "Admin", description = "Admin dashboards"),
        (name = "Report", description = "Reports"),
        (name = "User", description = "User management"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
