use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Manual (employee, date) -> shift assignment. Unique per pair; takes
/// precedence over the rotation formula when present.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ScheduleOverride {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// P, PM, M or OFF.
    #[schema(example = "PM")]
    pub shift_code: String,
}
