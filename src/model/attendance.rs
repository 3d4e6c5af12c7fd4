use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceType {
    Login,
    Logout,
}

/// Append-only login/logout event.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7)]
    pub user_id: u64,
    #[serde(rename = "type")]
    pub kind: AttendanceType,
    #[schema(example = "2026-01-01T09:00:00", value_type = String, format = "date-time")]
    pub timestamp: NaiveDateTime,
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
    #[schema(example = "Head office", nullable = true)]
    pub location_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: u64,
    pub kind: AttendanceType,
    pub timestamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
}
