use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::auth::{auth::AuthUser, policy};
use crate::error::{ServiceError, ServiceResult};
use crate::model::time_log::{NewTimeLog, TimeLog, TimeLogType};
use crate::store::{TaskStore, TimeLogFilter, TimeLogStore};
use crate::utils::time_window::day_window;

/// Opens a session for `user_id`. At most one open session per user, of
/// either type; the store enforces this atomically.
pub async fn start_session<S>(
    store: &S,
    user_id: u64,
    kind: TimeLogType,
    task_id: Option<u64>,
    now: NaiveDateTime,
) -> ServiceResult<TimeLog>
where
    S: TimeLogStore + TaskStore,
{
    if let Some(task_id) = task_id {
        if store.find_task(task_id).await?.is_none() {
            return Err(ServiceError::Validation(format!("Task {task_id} does not exist")));
        }
    }

    let log = store
        .open_session(NewTimeLog {
            user_id,
            kind,
            start_time: now,
            task_id,
        })
        .await
        .map_err(|e| match ServiceError::from(e) {
            ServiceError::Conflict(_) => {
                ServiceError::Conflict("A time log is already running; stop it first".into())
            }
            other => other,
        })?;

    info!(user_id, time_log_id = log.id, kind = %log.kind, "Time log started");
    Ok(log)
}

/// Closes the user's open session. The end time never precedes the start.
pub async fn stop_session<S: TimeLogStore>(
    store: &S,
    user_id: u64,
    now: NaiveDateTime,
) -> ServiceResult<TimeLog> {
    let open = store
        .find_open_session(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("No active time log found".into()))?;

    let log = store
        .close_session(open.id, now.max(open.start_time))
        .await?;

    info!(
        user_id,
        time_log_id = log.id,
        duration_ms = log.duration_ms().unwrap_or(0),
        "Time log stopped"
    );
    Ok(log)
}

pub async fn current_session<S: TimeLogStore>(
    store: &S,
    user_id: u64,
) -> ServiceResult<Option<TimeLog>> {
    Ok(store.find_open_session(user_id).await?)
}

/// Logs started within the daily window of `day`, newest first.
pub async fn daily_logs<S: TimeLogStore>(
    store: &S,
    user_id: u64,
    day: NaiveDate,
) -> ServiceResult<Vec<TimeLog>> {
    let filter = TimeLogFilter {
        started: day_window(day),
        ..TimeLogFilter::for_user(user_id)
    };
    let logs = store.list_time_logs(&filter).await?;
    debug!(user_id, %day, count = logs.len(), "Fetched daily logs");
    Ok(logs)
}

/// Sum of closed WORK durations. Open sessions and breaks add nothing.
pub fn work_total_ms(logs: &[TimeLog]) -> i64 {
    logs.iter()
        .filter(|log| log.kind == TimeLogType::Work)
        .filter_map(TimeLog::duration_ms)
        .sum()
}

/// Live elapsed time of an open session; not persisted.
pub fn elapsed_ms(log: &TimeLog, now: NaiveDateTime) -> i64 {
    let end = log.end_time.unwrap_or(now);
    (end - log.start_time).num_milliseconds().max(0)
}

/// Replaces the notes of one of the caller's own logs. Logs belonging to
/// someone else are reported as missing.
pub async fn update_notes<S: TimeLogStore>(
    store: &S,
    actor: &AuthUser,
    time_log_id: u64,
    notes: Option<String>,
) -> ServiceResult<TimeLog> {
    let not_found = || ServiceError::NotFound("Time log not found".into());

    let log = store.find_time_log(time_log_id).await?.ok_or_else(not_found)?;
    policy::require_owner(actor, log.user_id).map_err(|_| not_found())?;

    let notes = notes.filter(|n| !n.trim().is_empty());
    Ok(store.update_time_log_notes(log.id, notes).await?)
}
