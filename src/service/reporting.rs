//! Read-side aggregations over time logs, tasks and attendance.
//!
//! Nothing here writes. Every report is computed on demand and returns an
//! empty or zeroed structure when there is no data.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{ServiceError, ServiceResult};
use crate::model::{
    attendance::Attendance,
    role::Role,
    task::{Task, TaskStatus},
    time_log::{TimeLog, TimeLogType},
};
use crate::store::{
    AttendanceStore, TaskFilter, TaskStore, TimeLogFilter, TimeLogStore, UserStore, Window,
};
use crate::utils::time_window::{day_window, ms_to_hours, round1, start_of_day};

const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeWorkStatus {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// An open WORK log started today.
    pub is_active: bool,
    pub last_attendance: Option<Attendance>,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityMetric {
    pub id: u64,
    pub name: String,
    pub hours_worked: f64,
    pub tasks_completed: usize,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTask {
    pub id: u64,
    pub name: String,
    pub status: TaskStatus,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub employee_id: u64,
    pub employee_name: String,
    pub total_work_hours: f64,
    pub tasks_completed: Vec<CompletedTask>,
    pub notes: String,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkHoursRow {
    pub employee_id: u64,
    pub employee_name: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub total_hours: f64,
    pub break_time: f64,
}

#[derive(Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskReportRow {
    pub id: u64,
    pub name: String,
    pub status: TaskStatus,
    pub assigned_to: String,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TasksReport {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub tasks: Vec<TaskReportRow>,
    pub total_count: usize,
    pub completed_count: usize,
    /// Percent of the day's tasks that are COMPLETE, one decimal.
    pub completion_rate: f64,
}

fn closed_ms(logs: &[TimeLog], kind: TimeLogType) -> i64 {
    logs.iter()
        .filter(|log| log.kind == kind)
        .filter_map(TimeLog::duration_ms)
        .sum()
}

fn ordered_range(start: NaiveDateTime, end: NaiveDateTime) -> ServiceResult<Window> {
    if start > end {
        return Err(ServiceError::Validation(
            "startDate cannot be after endDate".into(),
        ));
    }
    Ok(Window::between(start, end))
}

/// Resolves user names once per report.
struct NameBook<'a, S> {
    store: &'a S,
    names: HashMap<u64, Option<String>>,
}

impl<'a, S: UserStore> NameBook<'a, S> {
    fn new(store: &'a S) -> Self {
        Self {
            store,
            names: HashMap::new(),
        }
    }

    async fn name(&mut self, user_id: u64) -> ServiceResult<Option<String>> {
        if let Some(name) = self.names.get(&user_id) {
            return Ok(name.clone());
        }
        let name = self.store.find_user(user_id).await?.map(|u| u.name);
        self.names.insert(user_id, name.clone());
        Ok(name)
    }
}

/// Per EMPLOYEE: active flag and most recent attendance record.
pub async fn employee_work_status<S>(
    store: &S,
    now: NaiveDateTime,
) -> ServiceResult<Vec<EmployeeWorkStatus>>
where
    S: UserStore + TimeLogStore + AttendanceStore,
{
    let today_start = start_of_day(now.date());
    let mut statuses = Vec::new();

    for employee in store.list_users(Some(Role::Employee)).await? {
        let open_work_today = TimeLogFilter {
            kind: Some(TimeLogType::Work),
            open: Some(true),
            started: Window {
                from: Some(today_start),
                to: None,
            },
            ..TimeLogFilter::for_user(employee.id)
        };
        let is_active = !store.list_time_logs(&open_work_today).await?.is_empty();
        let last_attendance = store.latest_attendance(employee.id).await?;

        statuses.push(EmployeeWorkStatus {
            id: employee.id,
            name: employee.name,
            email: employee.email,
            is_active,
            last_attendance,
        });
    }

    Ok(statuses)
}

/// Per EMPLOYEE over [start, end]: hours from WORK logs fully inside the
/// range and tasks completed (updated to COMPLETE) inside it.
pub async fn productivity_metrics<S>(
    store: &S,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> ServiceResult<Vec<ProductivityMetric>>
where
    S: UserStore + TimeLogStore + TaskStore,
{
    let range = ordered_range(start, end)?;
    let mut metrics = Vec::new();

    for employee in store.list_users(Some(Role::Employee)).await? {
        let logs = store
            .list_time_logs(&TimeLogFilter {
                kind: Some(TimeLogType::Work),
                started: Window {
                    from: Some(start),
                    to: None,
                },
                ended_by: Some(end),
                ..TimeLogFilter::for_user(employee.id)
            })
            .await?;

        let completed = store
            .list_tasks(&TaskFilter {
                assignee_id: Some(employee.id),
                status: Some(TaskStatus::Complete),
                updated: range,
                ..TaskFilter::default()
            })
            .await?;

        metrics.push(ProductivityMetric {
            id: employee.id,
            name: employee.name,
            hours_worked: ms_to_hours(closed_ms(&logs, TimeLogType::Work)),
            tasks_completed: completed.len(),
        });
    }

    Ok(metrics)
}

/// Closed logs of one employee that started at or after `range.from` and
/// ended by `range.to`, newest first. Either bound may be open.
pub async fn employee_time_logs<S: TimeLogStore>(
    store: &S,
    employee_id: u64,
    range: Window,
) -> ServiceResult<Vec<TimeLog>> {
    if let (Some(from), Some(to)) = (range.from, range.to) {
        ordered_range(from, to)?;
    }
    Ok(store
        .list_time_logs(&TimeLogFilter {
            open: Some(false),
            started: Window {
                from: range.from,
                to: None,
            },
            ended_by: range.to,
            ..TimeLogFilter::for_user(employee_id)
        })
        .await?)
}

pub async fn daily_summary<S>(
    store: &S,
    employee_id: u64,
    day: NaiveDate,
) -> ServiceResult<DailySummary>
where
    S: UserStore + TimeLogStore + TaskStore,
{
    let employee = store
        .find_user(employee_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Employee not found".into()))?;

    let window = day_window(day);

    let mut logs = store
        .list_time_logs(&TimeLogFilter {
            created: window,
            ..TimeLogFilter::for_user(employee_id)
        })
        .await?;
    // notes read in the order the day happened
    logs.reverse();

    let notes = logs
        .iter()
        .filter_map(|log| log.notes.as_deref())
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let tasks_completed = store
        .list_tasks(&TaskFilter {
            assignee_id: Some(employee_id),
            status: Some(TaskStatus::Complete),
            updated: window,
            ..TaskFilter::default()
        })
        .await?
        .into_iter()
        .map(|task| CompletedTask {
            id: task.id,
            name: task.name,
            status: task.status,
            updated_at: task.updated_at,
        })
        .collect();

    Ok(DailySummary {
        date: day,
        employee_id,
        employee_name: employee.name,
        total_work_hours: ms_to_hours(closed_ms(&logs, TimeLogType::Work)),
        tasks_completed,
        notes,
    })
}

/// Hours per (employee, day of creation). Only closed logs add time; BREAK
/// goes to `break_time`, everything else to `total_hours`. Rows are ordered
/// by date, then employee.
pub async fn work_hours_report<S>(
    store: &S,
    created: Window,
    employee_id: Option<u64>,
) -> ServiceResult<Vec<WorkHoursRow>>
where
    S: UserStore + TimeLogStore,
{
    if let (Some(from), Some(to)) = (created.from, created.to) {
        ordered_range(from, to)?;
    }

    let logs = store
        .list_time_logs(&TimeLogFilter {
            user_id: employee_id,
            created,
            ..TimeLogFilter::default()
        })
        .await?;

    let mut groups: BTreeMap<(NaiveDate, u64), (i64, i64)> = BTreeMap::new();
    for log in &logs {
        let (work, rest) = groups
            .entry((log.created_at.date(), log.user_id))
            .or_default();
        if let Some(ms) = log.duration_ms() {
            match log.kind {
                TimeLogType::Break => *rest += ms,
                TimeLogType::Work => *work += ms,
            }
        }
    }

    let mut names = NameBook::new(store);
    let mut rows = Vec::with_capacity(groups.len());
    for ((date, user_id), (work, rest)) in groups {
        rows.push(WorkHoursRow {
            employee_id: user_id,
            employee_name: names.name(user_id).await?.unwrap_or_default(),
            date,
            total_hours: ms_to_hours(work),
            break_time: ms_to_hours(rest),
        });
    }

    Ok(rows)
}

/// Tasks created on `day`. The completion rate always covers every task of
/// the day; `completed_only` narrows the listed rows.
pub async fn tasks_report<S>(
    store: &S,
    day: NaiveDate,
    completed_only: bool,
) -> ServiceResult<TasksReport>
where
    S: UserStore + TaskStore,
{
    let tasks = store
        .list_tasks(&TaskFilter {
            created: day_window(day),
            ..TaskFilter::default()
        })
        .await?;

    let total_count = tasks.len();
    let completed_count = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Complete)
        .count();
    let completion_rate = completion_rate(completed_count, total_count);

    let mut names = NameBook::new(store);
    let mut rows = Vec::new();
    for task in tasks
        .into_iter()
        .filter(|t: &Task| !completed_only || t.status == TaskStatus::Complete)
    {
        let assignee = match task.assignee_id {
            Some(id) => names.name(id).await?,
            None => None,
        };
        rows.push(TaskReportRow {
            assigned_to: assignee.unwrap_or_else(|| UNASSIGNED.to_string()),
            id: task.id,
            name: task.name,
            status: task.status,
            updated_at: task.updated_at,
        });
    }

    Ok(TasksReport {
        date: day,
        tasks: rows,
        total_count,
        completed_count,
        completion_rate,
    })
}

pub fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(completed as f64 / total as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{AttendanceType, NewAttendance};
    use crate::model::task::NewTask;
    use crate::model::user::NewUser;
    use crate::store::memory::MemoryStore;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn yesterday_at(h: u32) -> NaiveDateTime {
        day().pred_opt().unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    async fn user(store: &MemoryStore, name: &str, role: Role) -> u64 {
        store
            .insert_user(NewUser {
                email: format!("{name}@keytrak.com"),
                name: name.into(),
                password_hash: "x".into(),
                role,
                created_at: yesterday_at(8),
            })
            .await
            .unwrap()
            .id
    }

    fn log(
        user_id: u64,
        kind: TimeLogType,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
        notes: Option<&str>,
    ) -> TimeLog {
        TimeLog {
            id: 0,
            user_id,
            kind,
            start_time: start,
            end_time: end,
            task_id: None,
            notes: notes.map(str::to_string),
            created_at: start,
        }
    }

    async fn task(store: &MemoryStore, name: &str, assignee_id: u64, created: NaiveDateTime) -> u64 {
        store
            .insert_task(NewTask {
                name: name.into(),
                description: None,
                creator_id: assignee_id,
                assignee_id: Some(assignee_id),
                created_at: created,
            })
            .await
            .unwrap()
            .id
    }

    #[actix_web::test]
    async fn empty_store_yields_empty_reports() {
        let store = MemoryStore::new();
        let (start, end) = (at(0, 0), at(23, 59));

        assert!(employee_work_status(&store, at(12, 0)).await.unwrap().is_empty());
        assert!(productivity_metrics(&store, start, end).await.unwrap().is_empty());
        assert!(work_hours_report(&store, Window::default(), None).await.unwrap().is_empty());
        assert!(employee_time_logs(&store, 1, Window::between(start, end)).await.unwrap().is_empty());

        let report = tasks_report(&store, day(), false).await.unwrap();
        assert!(report.tasks.is_empty());
        assert_eq!(report.total_count, 0);
        assert_eq!(report.completion_rate, 0.0);
    }

    #[actix_web::test]
    async fn productivity_is_zero_without_activity() {
        let store = MemoryStore::new();
        let e1 = user(&store, "e1", Role::Employee).await;

        let metrics = productivity_metrics(&store, at(0, 0), at(23, 59)).await.unwrap();
        assert_eq!(
            metrics,
            vec![ProductivityMetric {
                id: e1,
                name: "e1".into(),
                hours_worked: 0.0,
                tasks_completed: 0,
            }]
        );
    }

    #[actix_web::test]
    async fn productivity_counts_contained_work_and_completions() {
        let store = MemoryStore::new();
        let e1 = user(&store, "e1", Role::Employee).await;
        user(&store, "boss", Role::Admin).await;

        store.seed_time_log(log(e1, TimeLogType::Work, at(9, 0), Some(at(10, 30)), None));
        store.seed_time_log(log(e1, TimeLogType::Break, at(10, 30), Some(at(11, 0)), None));
        // crosses the range end, excluded
        store.seed_time_log(log(e1, TimeLogType::Work, at(17, 0), Some(at(19, 0)), None));
        // still open, excluded
        store.seed_time_log(log(e1, TimeLogType::Work, at(12, 0), None, None));

        let done = task(&store, "done", e1, at(8, 0)).await;
        store.seed_task_status(done, TaskStatus::Complete, at(11, 0));
        let late = task(&store, "late", e1, at(8, 0)).await;
        store.seed_task_status(late, TaskStatus::Complete, at(18, 30));
        task(&store, "open", e1, at(8, 0)).await;

        let metrics = productivity_metrics(&store, at(0, 0), at(18, 0)).await.unwrap();
        assert_eq!(metrics.len(), 1, "only employees are reported");
        assert_eq!(metrics[0].hours_worked, 1.5);
        assert_eq!(metrics[0].tasks_completed, 1);
    }

    #[actix_web::test]
    async fn inverted_range_is_a_validation_error() {
        let store = MemoryStore::new();
        let err = productivity_metrics(&store, at(18, 0), at(9, 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[actix_web::test]
    async fn work_status_flags_open_work_started_today() {
        let store = MemoryStore::new();
        let working = user(&store, "working", Role::Employee).await;
        let on_break = user(&store, "on_break", Role::Employee).await;
        let stale = user(&store, "stale", Role::Employee).await;

        store.seed_time_log(log(working, TimeLogType::Work, at(9, 0), None, None));
        store.seed_time_log(log(on_break, TimeLogType::Break, at(9, 0), None, None));
        store.seed_time_log(log(stale, TimeLogType::Work, yesterday_at(17), None, None));

        store
            .insert_attendance(NewAttendance {
                user_id: working,
                kind: AttendanceType::Login,
                timestamp: at(8, 55),
                latitude: 0.0,
                longitude: 0.0,
                location_name: None,
            })
            .await
            .unwrap();

        let statuses = employee_work_status(&store, at(12, 0)).await.unwrap();
        let by_id = |id: u64| statuses.iter().find(|s| s.id == id).unwrap();

        assert!(by_id(working).is_active);
        assert!(!by_id(on_break).is_active);
        assert!(!by_id(stale).is_active);
        assert_eq!(
            by_id(working).last_attendance.as_ref().map(|a| a.kind),
            Some(AttendanceType::Login)
        );
        assert!(by_id(stale).last_attendance.is_none());
    }

    #[actix_web::test]
    async fn daily_summary_collects_hours_tasks_and_notes() {
        let store = MemoryStore::new();
        let e1 = user(&store, "e1", Role::Employee).await;

        store.seed_time_log(log(e1, TimeLogType::Work, at(9, 0), Some(at(9, 30)), Some("first")));
        store.seed_time_log(log(e1, TimeLogType::Break, at(9, 30), Some(at(9, 40)), None));
        store.seed_time_log(log(e1, TimeLogType::Work, at(13, 0), Some(at(14, 0)), Some("second")));
        store.seed_time_log(log(e1, TimeLogType::Work, yesterday_at(9), Some(yesterday_at(17)), Some("old")));

        let done = task(&store, "shipped", e1, yesterday_at(8)).await;
        store.seed_task_status(done, TaskStatus::Complete, at(15, 0));
        let done_yesterday = task(&store, "older", e1, yesterday_at(8)).await;
        store.seed_task_status(done_yesterday, TaskStatus::Complete, yesterday_at(12));

        let summary = daily_summary(&store, e1, day()).await.unwrap();
        assert_eq!(summary.employee_name, "e1");
        assert_eq!(summary.total_work_hours, 1.5);
        assert_eq!(summary.notes, "first\nsecond");
        assert_eq!(summary.tasks_completed.len(), 1);
        assert_eq!(summary.tasks_completed[0].name, "shipped");
    }

    #[actix_web::test]
    async fn daily_summary_of_quiet_day_is_zeroed() {
        let store = MemoryStore::new();
        let e1 = user(&store, "e1", Role::Employee).await;

        let summary = daily_summary(&store, e1, day()).await.unwrap();
        assert_eq!(summary.total_work_hours, 0.0);
        assert!(summary.tasks_completed.is_empty());
        assert_eq!(summary.notes, "");
    }

    #[actix_web::test]
    async fn daily_summary_for_unknown_employee_is_not_found() {
        let store = MemoryStore::new();
        let err = daily_summary(&store, 77, day()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[actix_web::test]
    async fn work_hours_grouped_by_employee_and_day() {
        let store = MemoryStore::new();
        let amy = user(&store, "amy", Role::Employee).await;
        let bob = user(&store, "bob", Role::Employee).await;

        store.seed_time_log(log(amy, TimeLogType::Work, at(9, 0), Some(at(11, 0)), None));
        store.seed_time_log(log(amy, TimeLogType::Break, at(11, 0), Some(at(11, 30)), None));
        store.seed_time_log(log(amy, TimeLogType::Work, at(12, 0), None, None));
        store.seed_time_log(log(amy, TimeLogType::Work, yesterday_at(9), Some(yesterday_at(10)), None));
        store.seed_time_log(log(bob, TimeLogType::Work, at(8, 0), Some(at(8, 45)), None));

        let rows = work_hours_report(&store, Window::default(), None).await.unwrap();
        let yesterday = day().pred_opt().unwrap();
        assert_eq!(
            rows,
            vec![
                WorkHoursRow {
                    employee_id: amy,
                    employee_name: "amy".into(),
                    date: yesterday,
                    total_hours: 1.0,
                    break_time: 0.0,
                },
                WorkHoursRow {
                    employee_id: amy,
                    employee_name: "amy".into(),
                    date: day(),
                    total_hours: 2.0,
                    break_time: 0.5,
                },
                WorkHoursRow {
                    employee_id: bob,
                    employee_name: "bob".into(),
                    date: day(),
                    total_hours: 0.75,
                    break_time: 0.0,
                },
            ]
        );

        let only_bob = work_hours_report(&store, day_window(day()), Some(bob)).await.unwrap();
        assert_eq!(only_bob.len(), 1);
        assert_eq!(only_bob[0].employee_id, bob);
    }

    #[actix_web::test]
    async fn tasks_report_rate_and_filter() {
        let store = MemoryStore::new();
        let amy = user(&store, "amy", Role::Employee).await;

        let a = task(&store, "a", amy, at(9, 0)).await;
        task(&store, "b", amy, at(10, 0)).await;
        store
            .insert_task(NewTask {
                name: "c".into(),
                description: None,
                creator_id: amy,
                assignee_id: None,
                created_at: at(11, 0),
            })
            .await
            .unwrap();
        task(&store, "yesterday", amy, yesterday_at(9)).await;
        store.seed_task_status(a, TaskStatus::Complete, at(12, 0));

        let report = tasks_report(&store, day(), false).await.unwrap();
        assert_eq!(report.total_count, 3);
        assert_eq!(report.completed_count, 1);
        assert_eq!(report.completion_rate, 33.3);
        let assigned: Vec<_> = report.tasks.iter().map(|t| t.assigned_to.as_str()).collect();
        assert_eq!(assigned, vec![UNASSIGNED, "amy", "amy"]);

        let completed = tasks_report(&store, day(), true).await.unwrap();
        assert_eq!(completed.tasks.len(), 1);
        assert_eq!(completed.tasks[0].id, a);
        assert_eq!(completed.completion_rate, 33.3);
    }

    #[test]
    fn completion_rate_rounds_and_guards_zero() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(2, 3), 66.7);
        assert_eq!(completion_rate(4, 4), 100.0);
    }

    #[actix_web::test]
    async fn employee_time_logs_keeps_closed_logs_in_range() {
        let store = MemoryStore::new();
        let e1 = user(&store, "e1", Role::Employee).await;

        store.seed_time_log(log(e1, TimeLogType::Work, at(9, 0), Some(at(10, 0)), None));
        store.seed_time_log(log(e1, TimeLogType::Break, at(10, 0), Some(at(10, 15)), None));
        store.seed_time_log(log(e1, TimeLogType::Work, at(11, 0), None, None));
        store.seed_time_log(log(e1, TimeLogType::Work, yesterday_at(9), Some(yesterday_at(10)), None));

        let logs = employee_time_logs(&store, e1, day_window(day())).await.unwrap();
        let starts: Vec<_> = logs.iter().map(|l| l.start_time).collect();
        assert_eq!(starts, vec![at(10, 0), at(9, 0)]);

        let unbounded = employee_time_logs(&store, e1, Window::default()).await.unwrap();
        assert_eq!(unbounded.len(), 3, "open logs are never listed");
    }

    #[actix_web::test]
    async fn employee_time_logs_for_today_skip_yesterday() {
        let store = MemoryStore::new();
        let e1 = user(&store, "e1", Role::Employee).await;
        store.seed_time_log(log(e1, TimeLogType::Work, yesterday_at(9), Some(yesterday_at(10)), None));

        let logs = employee_time_logs(&store, e1, day_window(day())).await.unwrap();
        assert!(logs.is_empty());
    }
}
