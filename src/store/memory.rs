//! In-memory store used by unit tests. A single mutex guards all tables,
//! which makes every trait method atomic.

use std::sync::Mutex;

use chrono::NaiveDateTime;

use crate::model::{
    attendance::{Attendance, NewAttendance},
    role::Role,
    task::{NewTask, Task, TaskStatus},
    time_log::{NewTimeLog, TimeLog},
    user::{NewUser, User},
};
use crate::store::{
    AttendanceStore, StoreError, StoreResult, TaskFilter, TaskStore, TimeLogFilter, TimeLogStore,
    UserStore, Window,
};

fn log_matches(filter: &TimeLogFilter, log: &TimeLog) -> bool {
    filter.user_id.is_none_or(|id| log.user_id == id)
        && filter.kind.is_none_or(|kind| log.kind == kind)
        && filter.open.is_none_or(|open| log.is_open() == open)
        && filter.started.contains(log.start_time)
        && filter.created.contains(log.created_at)
        && filter
            .ended_by
            .is_none_or(|to| log.end_time.is_some_and(|end| end <= to))
}

fn task_matches(filter: &TaskFilter, task: &Task) -> bool {
    filter.assignee_id.is_none_or(|id| task.assignee_id == Some(id))
        && filter.status.is_none_or(|status| task.status == status)
        && filter.created.contains(task.created_at)
        && filter.updated.contains(task.updated_at)
}

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: Vec<User>,
    time_logs: Vec<TimeLog>,
    tasks: Vec<Task>,
    attendance: Vec<Attendance>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut tables)
    }

    /// Count of open logs for a user, bypassing the trait.
    pub fn open_count(&self, user_id: u64) -> usize {
        self.with(|t| {
            t.time_logs
                .iter()
                .filter(|l| l.user_id == user_id && l.is_open())
                .count()
        })
    }

    /// Inserts a finished log directly, for seeding report fixtures.
    pub fn seed_time_log(&self, mut log: TimeLog) -> TimeLog {
        self.with(|t| {
            log.id = t.next_id();
            t.time_logs.push(log.clone());
            log
        })
    }

    /// Overwrites a task's status and update time without going through the board.
    pub fn seed_task_status(&self, id: u64, status: TaskStatus, at: NaiveDateTime) {
        self.with(|t| {
            if let Some(task) = t.tasks.iter_mut().find(|task| task.id == id) {
                task.status = status;
                task.updated_at = at;
            }
        })
    }
}

impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.with(|t| {
            if t.users.iter().any(|u| u.email == user.email) {
                return Err(StoreError::Duplicate);
            }
            let record = User {
                id: t.next_id(),
                email: user.email,
                name: user.name,
                role: user.role,
                password_hash: user.password_hash,
                created_at: user.created_at,
                updated_at: user.created_at,
            };
            t.users.push(record.clone());
            Ok(record)
        })
    }

    async fn find_user(&self, id: u64) -> StoreResult<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.email == email).cloned()))
    }

    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.with(|t| {
            t.users
                .iter()
                .filter(|u| role.is_none_or(|r| u.role == r))
                .cloned()
                .collect()
        });
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn update_user_role(&self, id: u64, role: Role, at: NaiveDateTime) -> StoreResult<User> {
        self.with(|t| {
            let user = t
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or(StoreError::NotFound)?;
            user.role = role;
            user.updated_at = at;
            Ok(user.clone())
        })
    }
}

impl TimeLogStore for MemoryStore {
    async fn open_session(&self, log: NewTimeLog) -> StoreResult<TimeLog> {
        self.with(|t| {
            if t.time_logs
                .iter()
                .any(|l| l.user_id == log.user_id && l.is_open())
            {
                return Err(StoreError::OpenSessionExists);
            }
            let record = TimeLog {
                id: t.next_id(),
                user_id: log.user_id,
                kind: log.kind,
                start_time: log.start_time,
                end_time: None,
                task_id: log.task_id,
                notes: None,
                created_at: log.start_time,
            };
            t.time_logs.push(record.clone());
            Ok(record)
        })
    }

    async fn find_open_session(&self, user_id: u64) -> StoreResult<Option<TimeLog>> {
        Ok(self.with(|t| {
            t.time_logs
                .iter()
                .find(|l| l.user_id == user_id && l.is_open())
                .cloned()
        }))
    }

    async fn close_session(&self, id: u64, end_time: NaiveDateTime) -> StoreResult<TimeLog> {
        self.with(|t| {
            let log = t
                .time_logs
                .iter_mut()
                .find(|l| l.id == id && l.is_open())
                .ok_or(StoreError::NotFound)?;
            log.end_time = Some(end_time);
            Ok(log.clone())
        })
    }

    async fn find_time_log(&self, id: u64) -> StoreResult<Option<TimeLog>> {
        Ok(self.with(|t| t.time_logs.iter().find(|l| l.id == id).cloned()))
    }

    async fn update_time_log_notes(&self, id: u64, notes: Option<String>) -> StoreResult<TimeLog> {
        self.with(|t| {
            let log = t
                .time_logs
                .iter_mut()
                .find(|l| l.id == id)
                .ok_or(StoreError::NotFound)?;
            log.notes = notes;
            Ok(log.clone())
        })
    }

    async fn list_time_logs(&self, filter: &TimeLogFilter) -> StoreResult<Vec<TimeLog>> {
        let mut logs: Vec<TimeLog> = self.with(|t| {
            t.time_logs
                .iter()
                .filter(|l| log_matches(filter, l))
                .cloned()
                .collect()
        });
        logs.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        Ok(logs)
    }
}

impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        Ok(self.with(|t| {
            let record = Task {
                id: t.next_id(),
                name: task.name,
                description: task.description,
                status: TaskStatus::Planned,
                creator_id: task.creator_id,
                assignee_id: task.assignee_id,
                created_at: task.created_at,
                updated_at: task.created_at,
            };
            t.tasks.push(record.clone());
            record
        }))
    }

    async fn find_task(&self, id: u64) -> StoreResult<Option<Task>> {
        Ok(self.with(|t| t.tasks.iter().find(|task| task.id == id).cloned()))
    }

    async fn update_task_status(
        &self,
        id: u64,
        status: TaskStatus,
        at: NaiveDateTime,
    ) -> StoreResult<Task> {
        self.with(|t| {
            let task = t
                .tasks
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or(StoreError::NotFound)?;
            task.status = status;
            task.updated_at = at;
            Ok(task.clone())
        })
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self.with(|t| {
            t.tasks
                .iter()
                .filter(|task| task_matches(filter, task))
                .cloned()
                .collect()
        });
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tasks)
    }
}

impl AttendanceStore for MemoryStore {
    async fn insert_attendance(&self, record: NewAttendance) -> StoreResult<Attendance> {
        Ok(self.with(|t| {
            let row = Attendance {
                id: t.next_id(),
                user_id: record.user_id,
                kind: record.kind,
                timestamp: record.timestamp,
                latitude: record.latitude,
                longitude: record.longitude,
                location_name: record.location_name,
            };
            t.attendance.push(row.clone());
            row
        }))
    }

    async fn list_attendance(&self, user_id: u64, window: Window) -> StoreResult<Vec<Attendance>> {
        let mut rows: Vec<Attendance> = self.with(|t| {
            t.attendance
                .iter()
                .filter(|a| a.user_id == user_id && window.contains(a.timestamp))
                .cloned()
                .collect()
        });
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn latest_attendance(&self, user_id: u64) -> StoreResult<Option<Attendance>> {
        Ok(self.list_attendance(user_id, Window::default()).await?.into_iter().next())
    }
}
