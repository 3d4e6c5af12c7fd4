use chrono::NaiveDateTime;
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::model::attendance::{Attendance, AttendanceType, NewAttendance};
use crate::store::{AttendanceStore, Window};

#[derive(Debug, Clone)]
pub struct MarkAttendanceInput {
    pub kind: AttendanceType,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
}

/// Appends a LOGIN/LOGOUT event. Consecutive events of the same type are
/// accepted.
pub async fn mark_attendance<S: AttendanceStore>(
    store: &S,
    user_id: u64,
    input: MarkAttendanceInput,
    now: NaiveDateTime,
) -> ServiceResult<Attendance> {
    if !input.latitude.is_finite() || !(-90.0..=90.0).contains(&input.latitude) {
        return Err(ServiceError::Validation(
            "Latitude must be between -90 and 90".into(),
        ));
    }
    if !input.longitude.is_finite() || !(-180.0..=180.0).contains(&input.longitude) {
        return Err(ServiceError::Validation(
            "Longitude must be between -180 and 180".into(),
        ));
    }

    let record = store
        .insert_attendance(NewAttendance {
            user_id,
            kind: input.kind,
            timestamp: now,
            latitude: input.latitude,
            longitude: input.longitude,
            location_name: input
                .location_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })
        .await?;

    info!(user_id, attendance_id = record.id, kind = %record.kind, "Attendance marked");
    Ok(record)
}

pub async fn attendance_history<S: AttendanceStore>(
    store: &S,
    user_id: u64,
    window: Window,
) -> ServiceResult<Vec<Attendance>> {
    if let (Some(from), Some(to)) = (window.from, window.to) {
        if from > to {
            return Err(ServiceError::Validation(
                "start_date cannot be after end_date".into(),
            ));
        }
    }
    Ok(store.list_attendance(user_id, window).await?)
}

pub async fn latest_attendance<S: AttendanceStore>(
    store: &S,
    user_id: u64,
) -> ServiceResult<Option<Attendance>> {
    Ok(store.latest_attendance(user_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn mark(kind: AttendanceType) -> MarkAttendanceInput {
        MarkAttendanceInput {
            kind,
            latitude: 23.81,
            longitude: 90.41,
            location_name: Some("Head office".into()),
        }
    }

    #[actix_web::test]
    async fn consecutive_logins_are_accepted() {
        let store = MemoryStore::new();
        mark_attendance(&store, 1, mark(AttendanceType::Login), at(2, 9))
            .await
            .unwrap();
        mark_attendance(&store, 1, mark(AttendanceType::Login), at(2, 10))
            .await
            .unwrap();

        let history = attendance_history(&store, 1, Window::default()).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[actix_web::test]
    async fn rejects_out_of_range_coordinates() {
        let store = MemoryStore::new();
        let mut bad = mark(AttendanceType::Login);
        bad.latitude = 91.0;
        let err = mark_attendance(&store, 1, bad, at(2, 9)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut bad = mark(AttendanceType::Login);
        bad.longitude = f64::NAN;
        let err = mark_attendance(&store, 1, bad, at(2, 9)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[actix_web::test]
    async fn history_is_windowed_and_newest_first() {
        let store = MemoryStore::new();
        mark_attendance(&store, 1, mark(AttendanceType::Login), at(1, 9))
            .await
            .unwrap();
        mark_attendance(&store, 1, mark(AttendanceType::Login), at(2, 9))
            .await
            .unwrap();
        mark_attendance(&store, 1, mark(AttendanceType::Logout), at(2, 17))
            .await
            .unwrap();
        mark_attendance(&store, 2, mark(AttendanceType::Login), at(2, 9))
            .await
            .unwrap();

        let window = Window::between(at(2, 0), at(2, 23));
        let history = attendance_history(&store, 1, window).await.unwrap();
        let stamps: Vec<_> = history.iter().map(|a| a.timestamp).collect();
        assert_eq!(stamps, vec![at(2, 17), at(2, 9)]);

        let err = attendance_history(&store, 1, Window::between(at(3, 0), at(2, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[actix_web::test]
    async fn latest_is_most_recent_or_none() {
        let store = MemoryStore::new();
        assert_eq!(latest_attendance(&store, 1).await.unwrap(), None);

        mark_attendance(&store, 1, mark(AttendanceType::Login), at(2, 9))
            .await
            .unwrap();
        mark_attendance(&store, 1, mark(AttendanceType::Logout), at(2, 17))
            .await
            .unwrap();

        let latest = latest_attendance(&store, 1).await.unwrap().unwrap();
        assert_eq!(latest.kind, AttendanceType::Logout);
        assert_eq!(latest.location_name.as_deref(), Some("Head office"));
    }
}
