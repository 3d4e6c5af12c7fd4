use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "jane@keytrak.com")]
    pub email: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    pub role: Role,
    #[serde(skip)]
    pub password_hash: String,
    #[schema(example = "2026-01-01T09:00:00", value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(example = "2026-01-01T09:00:00", value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
}
