use std::str::FromStr;

use chrono::NaiveDateTime;
use sqlx::{
    FromRow, MySqlPool,
    mysql::{MySql, MySqlArguments},
    query::QueryAs,
};

use crate::model::{
    attendance::{Attendance, AttendanceType, NewAttendance},
    role::Role,
    task::{NewTask, Task, TaskStatus},
    time_log::{NewTimeLog, TimeLog, TimeLogType},
    user::{NewUser, User},
};
use crate::store::{
    AttendanceStore, StoreError, StoreResult, TaskFilter, TaskStore, TimeLogFilter, TimeLogStore,
    UserStore, Window,
};

/// Unique-key violations (MySQL 1062 and friends) become `on_duplicate`.
/// Foreign-key and other constraint failures stay database errors.
fn map_unique_violation(e: sqlx::Error, on_duplicate: StoreError) -> StoreError {
    let unique = matches!(&e, sqlx::Error::Database(db_err) if db_err.is_unique_violation());
    if unique {
        on_duplicate
    } else {
        StoreError::from(e)
    }
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> StoreResult<T> {
    T::from_str(value).map_err(|_| StoreError::Corrupt(format!("{column} = {value:?}")))
}

// Helper enum for typed SQLx binding of dynamic WHERE clauses
#[derive(Debug, PartialEq)]
enum FilterValue {
    U64(u64),
    Str(String),
    DateTime(NaiveDateTime),
}

#[derive(Default)]
struct WhereClause {
    sql: String,
    args: Vec<FilterValue>,
}

impl WhereClause {
    fn push(&mut self, condition: &str, value: FilterValue) {
        self.push_raw(condition);
        self.args.push(value);
    }

    fn push_raw(&mut self, condition: &str) {
        self.sql
            .push_str(if self.sql.is_empty() { " WHERE " } else { " AND " });
        self.sql.push_str(condition);
    }

    fn push_window(&mut self, column: &str, window: Window) {
        if let Some(from) = window.from {
            self.push(&format!("{column} >= ?"), FilterValue::DateTime(from));
        }
        if let Some(to) = window.to {
            self.push(&format!("{column} <= ?"), FilterValue::DateTime(to));
        }
    }

    fn bind<'q, O>(
        self,
        mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    ) -> QueryAs<'q, MySql, O, MySqlArguments> {
        for arg in self.args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Str(s) => query.bind(s),
                FilterValue::DateTime(t) => query.bind(t),
            };
        }
        query
    }
}

fn time_log_clause(filter: &TimeLogFilter) -> WhereClause {
    let mut clause = WhereClause::default();

    if let Some(user_id) = filter.user_id {
        clause.push("user_id = ?", FilterValue::U64(user_id));
    }
    if let Some(kind) = filter.kind {
        clause.push("log_type = ?", FilterValue::Str(kind.to_string()));
    }
    match filter.open {
        Some(true) => clause.push_raw("end_time IS NULL"),
        Some(false) => clause.push_raw("end_time IS NOT NULL"),
        None => {}
    }
    clause.push_window("start_time", filter.started);
    clause.push_window("created_at", filter.created);
    if let Some(to) = filter.ended_by {
        clause.push("end_time <= ?", FilterValue::DateTime(to));
    }
    clause
}

fn task_clause(filter: &TaskFilter) -> WhereClause {
    let mut clause = WhereClause::default();

    if let Some(assignee_id) = filter.assignee_id {
        clause.push("assignee_id = ?", FilterValue::U64(assignee_id));
    }
    if let Some(status) = filter.status {
        clause.push("status = ?", FilterValue::Str(status.to_string()));
    }
    clause.push_window("created_at", filter.created);
    clause.push_window("updated_at", filter.updated);
    clause
}

#[derive(FromRow)]
struct UserRow {
    id: u64,
    email: String,
    name: String,
    password_hash: String,
    role_id: u8,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        let role = Role::from_id(row.role_id)
            .ok_or_else(|| StoreError::Corrupt(format!("role_id = {}", row.role_id)))?;
        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TimeLogRow {
    id: u64,
    user_id: u64,
    log_type: String,
    start_time: NaiveDateTime,
    end_time: Option<NaiveDateTime>,
    task_id: Option<u64>,
    notes: Option<String>,
    created_at: NaiveDateTime,
}

impl TryFrom<TimeLogRow> for TimeLog {
    type Error = StoreError;

    fn try_from(row: TimeLogRow) -> StoreResult<Self> {
        Ok(TimeLog {
            id: row.id,
            user_id: row.user_id,
            kind: parse_column::<TimeLogType>("log_type", &row.log_type)?,
            start_time: row.start_time,
            end_time: row.end_time,
            task_id: row.task_id,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct TaskRow {
    id: u64,
    name: String,
    description: Option<String>,
    status: String,
    creator_id: u64,
    assignee_id: Option<u64>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> StoreResult<Self> {
        Ok(Task {
            id: row.id,
            name: row.name,
            description: row.description,
            status: parse_column::<TaskStatus>("status", &row.status)?,
            creator_id: row.creator_id,
            assignee_id: row.assignee_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    attendance_type: String,
    timestamp: NaiveDateTime,
    latitude: f64,
    longitude: f64,
    location_name: Option<String>,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> StoreResult<Self> {
        Ok(Attendance {
            id: row.id,
            user_id: row.user_id,
            kind: parse_column::<AttendanceType>("attendance_type", &row.attendance_type)?,
            timestamp: row.timestamp,
            latitude: row.latitude,
            longitude: row.longitude,
            location_name: row.location_name,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const USER_COLUMNS: &str = "id, email, name, password_hash, role_id, created_at, updated_at";
const TIME_LOG_COLUMNS: &str =
    "id, user_id, log_type, start_time, end_time, task_id, notes, created_at";
const TASK_COLUMNS: &str =
    "id, name, description, status, creator_id, assignee_id, created_at, updated_at";
const ATTENDANCE_COLUMNS: &str =
    "id, user_id, attendance_type, timestamp, latitude, longitude, location_name";

/// sqlx-backed store shared by every handler through `web::Data`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn touch_last_login(&self, user_id: u64, at: NaiveDateTime) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at_unix: i64,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, FROM_UNIXTIME(?))
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at_unix)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Revokes a live refresh token, returning its owner. `None` when the jti
    /// is unknown or already revoked.
    pub async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let owner = sqlx::query_scalar::<_, u64>(
            "SELECT user_id FROM refresh_tokens WHERE jti = ? AND revoked = 0 FOR UPDATE",
        )
        .bind(jti)
        .fetch_optional(&mut *tx)
        .await?;

        if owner.is_some() {
            sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?")
                .bind(jti)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(owner)
    }

    async fn fetch_time_log(&self, id: u64) -> StoreResult<TimeLog> {
        self.find_time_log(id).await?.ok_or(StoreError::NotFound)
    }

    async fn fetch_task(&self, id: u64) -> StoreResult<Task> {
        self.find_task(id).await?.ok_or(StoreError::NotFound)
    }
}

impl UserStore for MySqlStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, name, password_hash, role_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.id())
        .bind(user.created_at)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, StoreError::Duplicate))?;

        self.find_user(result.last_insert_id())
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_user(&self, id: u64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>> {
        let rows = match role {
            Some(role) => {
                let sql =
                    format!("SELECT {USER_COLUMNS} FROM users WHERE role_id = ? ORDER BY name, id");
                sqlx::query_as::<_, UserRow>(&sql)
                    .bind(role.id())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY name, id");
                sqlx::query_as::<_, UserRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        convert_all(rows)
    }

    async fn update_user_role(&self, id: u64, role: Role, at: NaiveDateTime) -> StoreResult<User> {
        sqlx::query("UPDATE users SET role_id = ?, updated_at = ? WHERE id = ?")
            .bind(role.id())
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        // rows_affected is 0 for an unchanged value, so existence comes from the re-read
        self.find_user(id).await?.ok_or(StoreError::NotFound)
    }
}

impl TimeLogStore for MySqlStore {
    async fn open_session(&self, log: NewTimeLog) -> StoreResult<TimeLog> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the owner serialises concurrent starts for one user.
        sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE id = ? FOR UPDATE")
            .bind(log.user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

        let open = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM time_logs WHERE user_id = ? AND end_time IS NULL LIMIT 1",
        )
        .bind(log.user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if open.is_some() {
            return Err(StoreError::OpenSessionExists);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO time_logs (user_id, log_type, start_time, task_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(log.user_id)
        .bind(log.kind.to_string())
        .bind(log.start_time)
        .bind(log.task_id)
        .bind(log.start_time)
        .execute(&mut *tx)
        .await
        // uq_time_logs_open backs up the row lock
        .map_err(|e| map_unique_violation(e, StoreError::OpenSessionExists))?;

        tx.commit().await?;
        self.fetch_time_log(result.last_insert_id()).await
    }

    async fn find_open_session(&self, user_id: u64) -> StoreResult<Option<TimeLog>> {
        let sql = format!(
            "SELECT {TIME_LOG_COLUMNS} FROM time_logs WHERE user_id = ? AND end_time IS NULL"
        );
        sqlx::query_as::<_, TimeLogRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(TimeLog::try_from)
            .transpose()
    }

    async fn close_session(&self, id: u64, end_time: NaiveDateTime) -> StoreResult<TimeLog> {
        let result =
            sqlx::query("UPDATE time_logs SET end_time = ? WHERE id = ? AND end_time IS NULL")
                .bind(end_time)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.fetch_time_log(id).await
    }

    async fn find_time_log(&self, id: u64) -> StoreResult<Option<TimeLog>> {
        let sql = format!("SELECT {TIME_LOG_COLUMNS} FROM time_logs WHERE id = ?");
        sqlx::query_as::<_, TimeLogRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(TimeLog::try_from)
            .transpose()
    }

    async fn update_time_log_notes(&self, id: u64, notes: Option<String>) -> StoreResult<TimeLog> {
        sqlx::query("UPDATE time_logs SET notes = ? WHERE id = ?")
            .bind(notes)
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.fetch_time_log(id).await
    }

    async fn list_time_logs(&self, filter: &TimeLogFilter) -> StoreResult<Vec<TimeLog>> {
        let clause = time_log_clause(filter);
        let sql = format!(
            "SELECT {TIME_LOG_COLUMNS} FROM time_logs{} ORDER BY start_time DESC, id DESC",
            clause.sql
        );

        let query = clause.bind(sqlx::query_as::<_, TimeLogRow>(&sql));
        convert_all(query.fetch_all(&self.pool).await?)
    }
}

impl TaskStore for MySqlStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (name, description, status, creator_id, assignee_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.name)
        .bind(&task.description)
        .bind(TaskStatus::Planned.to_string())
        .bind(task.creator_id)
        .bind(task.assignee_id)
        .bind(task.created_at)
        .bind(task.created_at)
        .execute(&self.pool)
        .await?;

        self.fetch_task(result.last_insert_id()).await
    }

    async fn find_task(&self, id: u64) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?");
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Task::try_from)
            .transpose()
    }

    async fn update_task_status(
        &self,
        id: u64,
        status: TaskStatus,
        at: NaiveDateTime,
    ) -> StoreResult<Task> {
        sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.fetch_task(id).await
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let clause = task_clause(filter);
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks{} ORDER BY created_at DESC, id DESC",
            clause.sql
        );

        let query = clause.bind(sqlx::query_as::<_, TaskRow>(&sql));
        convert_all(query.fetch_all(&self.pool).await?)
    }
}

impl AttendanceStore for MySqlStore {
    async fn insert_attendance(&self, record: NewAttendance) -> StoreResult<Attendance> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (user_id, attendance_type, timestamp, latitude, longitude, location_name)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(record.kind.to_string())
        .bind(record.timestamp)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(&record.location_name)
        .execute(&self.pool)
        .await?;

        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?");
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(result.last_insert_id())
            .fetch_one(&self.pool)
            .await?;
        Attendance::try_from(row)
    }

    async fn list_attendance(&self, user_id: u64, window: Window) -> StoreResult<Vec<Attendance>> {
        let mut clause = WhereClause::default();
        clause.push("user_id = ?", FilterValue::U64(user_id));
        clause.push_window("timestamp", window);

        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance{} ORDER BY timestamp DESC, id DESC",
            clause.sql
        );

        let query = clause.bind(sqlx::query_as::<_, AttendanceRow>(&sql));
        convert_all(query.fetch_all(&self.pool).await?)
    }

    async fn latest_attendance(&self, user_id: u64) -> StoreResult<Option<Attendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? ORDER BY timestamp DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Attendance::try_from)
            .transpose()
    }
}
