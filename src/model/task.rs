use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Task lifecycle. Any authorized actor may set any value; transitions are
/// not checked for order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Planned,
    InProgress,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Prepare monthly report")]
    pub name: String,
    #[schema(example = "Collect figures from finance", nullable = true)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[schema(example = 2)]
    pub creator_id: u64,
    /// `None` for tasks an admin created without an assignee
    #[schema(example = 7, nullable = true)]
    pub assignee_id: Option<u64>,
    #[schema(example = "2026-01-01T09:00:00", value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(example = "2026-01-01T09:00:00", value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub creator_id: u64,
    pub assignee_id: Option<u64>,
    pub created_at: NaiveDateTime,
}
