use crate::{
    auth::auth::AuthUser,
    error::ServiceError,
    model::attendance::AttendanceType,
    service::attendance::{self, MarkAttendanceInput},
    store::{MySqlStore, Window},
    utils::time_window::{self, end_of_day, start_of_day},
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceReq {
    #[serde(rename = "type")]
    pub kind: AttendanceType,
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
    #[schema(example = "Head office", nullable = true)]
    pub location_name: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    #[param(example = "2026-01-01", value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[param(example = "2026-01-31", value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
}

impl HistoryQuery {
    /// Whole days, inclusive on both ends.
    pub fn window(&self) -> Window {
        Window {
            from: self.start_date.map(start_of_day),
            to: self.end_date.map(end_of_day),
        }
    }
}

/// Record a LOGIN or LOGOUT event
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendanceReq,
    responses(
        (status = 201, description = "Attendance recorded", body = Attendance),
        (status = 400, description = "Coordinates out of range", body = Object, example = json!({
            "error": "Latitude must be between -90 and 90"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark(
    auth: AuthUser,
    body: web::Json<MarkAttendanceReq>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let body = body.into_inner();
    let record = attendance::mark_attendance(
        store.get_ref(),
        auth.user_id,
        MarkAttendanceInput {
            kind: body.kind,
            latitude: body.latitude,
            longitude: body.longitude,
            location_name: body.location_name,
        },
        time_window::now(),
    )
    .await?;
    Ok(HttpResponse::Created().json(record))
}

/// Own attendance records, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Attendance records", body = [Attendance]),
        (status = 400, description = "start_date after end_date"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    query: web::Query<HistoryQuery>,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let records =
        attendance::attendance_history(store.get_ref(), auth.user_id, query.window()).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Most recent own attendance record, or null
#[utoipa::path(
    get,
    path = "/api/attendance/latest",
    responses(
        (status = 200, description = "Latest record or null", body = Attendance),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn latest(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> Result<HttpResponse, ServiceError> {
    let record = attendance::latest_attendance(store.get_ref(), auth.user_id).await?;
    Ok(HttpResponse::Ok().json(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_window_covers_whole_days() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let query = HistoryQuery {
            start_date: Some(day),
            end_date: Some(day),
        };
        let window = query.window();
        assert!(window.contains(day.and_hms_opt(0, 0, 0).unwrap()));
        assert!(window.contains(day.and_hms_milli_opt(23, 59, 59, 999).unwrap()));
        assert!(!window.contains(day.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap()));
    }

    #[test]
    fn open_history_window_when_no_dates() {
        let query = HistoryQuery {
            start_date: None,
            end_date: None,
        };
        assert_eq!(query.window(), Window::default());
    }
}
