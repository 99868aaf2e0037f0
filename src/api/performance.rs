use crate::{
    auth::auth::AuthUser,
    core::score::score_record,
    model::attendance::{Attendance, AttendanceStatus},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PerformanceQuery {
    /// Supervisors/admins may inspect another employee
    pub employee_id: Option<u64>,
    /// Month in YYYY-MM form
    #[schema(example = "2026-01")]
    pub month: String,
}

#[derive(Serialize, ToSchema)]
pub struct DailyScore {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[schema(example = 65)]
    pub score: u8,
}

#[derive(Serialize, ToSchema)]
pub struct PerformanceResponse {
    pub employee_id: u64,
    #[schema(example = "2026-01")]
    pub month: String,
    pub days: Vec<DailyScore>,
    /// Mean of the daily scores, rounded to two decimals; null with no records
    #[schema(example = 92.5)]
    pub average: Option<f64>,
}

/// Month performance summary derived from attendance records
#[utoipa::path(
    get,
    path = "/api/v1/performance",
    params(
        ("employee_id" = Option<u64>, Query, description = "Inspect another employee (supervisor/admin)"),
        ("month" = String, Query, description = "Month as YYYY-MM")
    ),
    responses(
        (status = 200, description = "Daily scores and the month average", body = PerformanceResponse),
        (status = 400, description = "Malformed month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Performance"
)]
pub async fn month_performance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PerformanceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = match query.employee_id {
        Some(other) => {
            auth.require_supervisor_or_admin()?;
            other
        }
        None => auth.require_employee()?,
    };

    let first = NaiveDate::parse_from_str(&format!("{}-01", query.month), "%Y-%m-%d")
        .map_err(|_| actix_web::error::ErrorBadRequest("month must be formatted as YYYY-MM"))?;
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .expect("first of month is valid");
    let last = next_month - Duration::days(1);

    let records = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, employee_id, date, shift_code, clock_in, clock_out, status,
               late_minutes, early_leave_minutes, latitude, longitude, evidence_path
        FROM attendance
        WHERE employee_id = ? AND date BETWEEN ? AND ?
        ORDER BY date ASC
        "#,
    )
    .bind(employee_id)
    .bind(first)
    .bind(last)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch attendance for scoring");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let days: Vec<DailyScore> = records
        .iter()
        .map(|record| DailyScore {
            date: record.date,
            status: record.status,
            score: score_record(record),
        })
        .collect();

    let average = if days.is_empty() {
        None
    } else {
        let sum: u32 = days.iter().map(|d| d.score as u32).sum();
        Some((sum as f64 / days.len() as f64 * 100.0).round() / 100.0)
    };

    Ok(HttpResponse::Ok().json(PerformanceResponse {
        employee_id,
        month: query.month.clone(),
        days,
        average,
    }))
}
