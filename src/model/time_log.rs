use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeLogType {
    #[default]
    Work,
    Break,
}

/// A work or break interval. `end_time` is `None` while the session is open.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeLog {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7)]
    pub user_id: u64,
    #[serde(rename = "type")]
    pub kind: TimeLogType,
    #[schema(example = "2026-01-01T09:00:00", value_type = String, format = "date-time")]
    pub start_time: NaiveDateTime,
    #[schema(example = "2026-01-01T09:30:00", value_type = Option<String>, format = "date-time")]
    pub end_time: Option<NaiveDateTime>,
    #[schema(example = 3, nullable = true)]
    pub task_id: Option<u64>,
    #[schema(example = "Standup and code review", nullable = true)]
    pub notes: Option<String>,
    #[schema(example = "2026-01-01T09:00:00", value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

impl TimeLog {
    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Milliseconds between start and end, clamped at zero. `None` while open.
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds().max(0))
    }
}

#[derive(Debug, Clone)]
pub struct NewTimeLog {
    pub user_id: u64,
    pub kind: TimeLogType,
    pub start_time: NaiveDateTime,
    pub task_id: Option<u64>,
}
