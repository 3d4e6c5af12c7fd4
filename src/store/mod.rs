//! Storage seam for the core services.
//!
//! Each entity gets its own trait so a service only asks for what it reads
//! or writes. `MySqlStore` implements all of them for the running server;
//! the in-memory store implements them for unit tests.
#![allow(async_fn_in_trait)]

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::model::{
    attendance::{Attendance, NewAttendance},
    role::Role,
    task::{NewTask, Task, TaskStatus},
    time_log::{NewTimeLog, TimeLog, TimeLogType},
    user::{NewUser, User},
};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("duplicate record")]
    Duplicate,

    #[error("user already has an open time log")]
    OpenSessionExists,

    #[error("stored row is invalid: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Inclusive bounds; `None` leaves that side open.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Window {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

impl Window {
    pub fn between(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    #[cfg(test)]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

#[derive(Debug, Default, Clone)]
pub struct TimeLogFilter {
    pub user_id: Option<u64>,
    pub kind: Option<TimeLogType>,
    /// `Some(true)` keeps only open logs, `Some(false)` only closed ones.
    pub open: Option<bool>,
    pub started: Window,
    pub created: Window,
    /// Closed logs whose end time is at or before this instant.
    pub ended_by: Option<NaiveDateTime>,
}

impl TimeLogFilter {
    pub fn for_user(user_id: u64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TaskFilter {
    pub assignee_id: Option<u64>,
    pub status: Option<TaskStatus>,
    pub created: Window,
    pub updated: Window,
}

pub trait UserStore {
    /// Fails with `Duplicate` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: u64) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Ordered by name.
    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>>;
    async fn update_user_role(&self, id: u64, role: Role, at: NaiveDateTime) -> StoreResult<User>;
}

pub trait TimeLogStore {
    /// Inserts an open log, failing with `OpenSessionExists` when the user
    /// already has one. Check and insert are atomic.
    async fn open_session(&self, log: NewTimeLog) -> StoreResult<TimeLog>;
    async fn find_open_session(&self, user_id: u64) -> StoreResult<Option<TimeLog>>;
    async fn close_session(&self, id: u64, end_time: NaiveDateTime) -> StoreResult<TimeLog>;
    async fn find_time_log(&self, id: u64) -> StoreResult<Option<TimeLog>>;
    async fn update_time_log_notes(&self, id: u64, notes: Option<String>) -> StoreResult<TimeLog>;
    /// Ordered by start time, newest first.
    async fn list_time_logs(&self, filter: &TimeLogFilter) -> StoreResult<Vec<TimeLog>>;
}

pub trait TaskStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task>;
    async fn find_task(&self, id: u64) -> StoreResult<Option<Task>>;
    async fn update_task_status(
        &self,
        id: u64,
        status: TaskStatus,
        at: NaiveDateTime,
    ) -> StoreResult<Task>;
    /// Ordered by creation time, newest first.
    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;
}

pub trait AttendanceStore {
    async fn insert_attendance(&self, record: NewAttendance) -> StoreResult<Attendance>;
    /// Ordered by timestamp, newest first.
    async fn list_attendance(&self, user_id: u64, window: Window) -> StoreResult<Vec<Attendance>>;
    async fn latest_attendance(&self, user_id: u64) -> StoreResult<Option<Attendance>>;
}
