use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Daily attendance outcome. PRESENT/LATE/ALPHA are derived from clock
/// events (or their absence); PERMIT/SICK/LEAVE are assigned through the
/// leave-approval flow and override the time-derived value; OFF marks a
/// rest day.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
    ToSchema,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    Alpha,
    Permit,
    Sick,
    Leave,
    Off,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 42,
    "date": "2026-01-05",
    "shift_code": "P",
    "clock_in": "2026-01-05T08:02:00",
    "clock_out": "2026-01-05T20:01:00",
    "status": "PRESENT",
    "late_minutes": 2,
    "early_leave_minutes": 0,
    "latitude": -6.251426,
    "longitude": 107.113798,
    "evidence_path": null
}))]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,

    /// Resolved shift the record was created against: P, PM, M or OFF.
    pub shift_code: String,

    pub clock_in: Option<NaiveDateTime>,
    pub clock_out: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
    pub late_minutes: u32,
    pub early_leave_minutes: u32,

    /// Coordinate reported at clock-in.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Opaque reference to an uploaded evidence image, if any.
    pub evidence_path: Option<String>,
}
