use crate::{
    auth::auth::AuthUser,
    config::Config,
    core::shift::{DayShift, resolve_with_override},
    model::schedule::ScheduleOverride,
    utils::activity_log::{self, NewActivity},
};
use actix_web::{HttpRequest, HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::error;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleQuery {
    /// Supervisors/admins may inspect another employee
    pub employee_id: Option<u64>,
    /// Month in YYYY-MM form; defaults to the current month
    #[schema(example = "2026-01")]
    pub month: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ScheduledDay {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// P, PM, M or OFF
    #[schema(example = "P")]
    pub shift: String,
    /// Scheduled hours; absent on rest days
    #[schema(example = 12)]
    pub hours: Option<i64>,
    /// True when a manual override beat the rotation formula
    pub overridden: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ScheduleResponse {
    pub employee_id: u64,
    pub days: Vec<ScheduledDay>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OverrideFilter {
    pub employee_id: u64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpsertOverride {
    pub employee_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// P, PM, M or OFF
    #[schema(example = "OFF")]
    pub shift_code: String,
}

fn parse_month(raw: Option<&str>) -> actix_web::Result<NaiveDate> {
    match raw {
        None => {
            let today = chrono::Local::now().date_naive();
            Ok(today.with_day(1).expect("first of month is valid"))
        }
        Some(s) => NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .map_err(|_| actix_web::error::ErrorBadRequest("month must be formatted as YYYY-MM")),
    }
}

/// Resolved month schedule: rotation formula with overrides applied
#[utoipa::path(
    get,
    path = "/api/v1/schedule",
    params(
        ("employee_id" = Option<u64>, Query, description = "Inspect another employee (supervisor/admin)"),
        ("month" = Option<String>, Query, description = "Month as YYYY-MM")
    ),
    responses(
        (status = 200, description = "Resolved schedule for the month", body = ScheduleResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn month_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ScheduleQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = match query.employee_id {
        Some(other) => {
            auth.require_supervisor_or_admin()?;
            other
        }
        None => auth.require_employee()?,
    };

    let first = parse_month(query.month.as_deref())?;
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .expect("first of month is valid");
    let last = next_month - Duration::days(1);

    let rotation_offset =
        sqlx::query_scalar::<_, u8>("SELECT rotation_offset FROM employees WHERE id = ?")
            .bind(employee_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, employee_id, "Failed to fetch employee");
                ErrorInternalServerError("Internal Server Error")
            })?;

    let Some(rotation_offset) = rotation_offset else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    let overrides: HashMap<NaiveDate, String> = sqlx::query_as::<_, (NaiveDate, String)>(
        r#"
        SELECT date, shift_code FROM schedule_overrides
        WHERE employee_id = ? AND date BETWEEN ? AND ?
        "#,
    )
    .bind(employee_id)
    .bind(first)
    .bind(last)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch overrides");
        ErrorInternalServerError("Internal Server Error")
    })?
    .into_iter()
    .collect();

    let mut days = Vec::with_capacity(31);
    let mut date = first;
    while date <= last {
        let override_shift = match overrides.get(&date) {
            Some(code) => Some(DayShift::parse(code).ok_or_else(|| {
                error!(employee_id, %date, %code, "Unparseable schedule override");
                ErrorInternalServerError("Schedule data is corrupt")
            })?),
            None => None,
        };

        let day = resolve_with_override(override_shift, date, rotation_offset);
        let hours = match day {
            DayShift::Work(code) => Some(code.duration_hours()),
            DayShift::Off => None,
        };
        days.push(ScheduledDay {
            date,
            shift: day.as_str().to_string(),
            hours,
            overridden: override_shift.is_some(),
        });

        date += Duration::days(1);
    }

    Ok(HttpResponse::Ok().json(ScheduleResponse { employee_id, days }))
}

/// Create or replace a manual shift assignment
#[utoipa::path(
    post,
    path = "/api/v1/schedule/override",
    request_body = UpsertOverride,
    responses(
        (status = 200, description = "Override stored"),
        (status = 400, description = "Invalid shift code"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn upsert_override(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    payload: web::Json<UpsertOverride>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if DayShift::parse(&payload.shift_code).is_none() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "shift_code must be one of: P, PM, M, OFF"
        })));
    }

    // unique (employee_id, date) key makes this a replace
    sqlx::query(
        r#"
        INSERT INTO schedule_overrides (employee_id, date, shift_code)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE shift_code = VALUES(shift_code)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.date)
    .bind(&payload.shift_code)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = payload.employee_id, "Failed to store override");
        ErrorInternalServerError("Internal Server Error")
    })?;

    activity_log::record(
        pool.get_ref(),
        config.activity_retention_days,
        NewActivity {
            user_id: auth.user_id,
            action: "schedule.override",
            target: Some("/schedule/override"),
            details: Some(format!(
                "employee {} {} -> {}",
                payload.employee_id, payload.date, payload.shift_code
            )),
            user_agent: req
                .headers()
                .get(actix_web::http::header::USER_AGENT)
                .and_then(|h| h.to_str().ok()),
        },
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Override stored"
    })))
}

/// List manual shift assignments for an employee
#[utoipa::path(
    get,
    path = "/api/v1/schedule/override",
    params(
        ("employee_id" = u64, Query, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Overrides ordered by date", body = [ScheduleOverride]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn list_overrides(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<OverrideFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let overrides = sqlx::query_as::<_, ScheduleOverride>(
        r#"
        SELECT id, employee_id, date, shift_code
        FROM schedule_overrides
        WHERE employee_id = ?
        ORDER BY date ASC
        "#,
    )
    .bind(query.employee_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = query.employee_id, "Failed to list overrides");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(overrides))
}

/// Remove a manual shift assignment
#[utoipa::path(
    delete,
    path = "/api/v1/schedule/override/{id}",
    params(
        ("id" = u64, Path, description = "Override ID")
    ),
    responses(
        (status = 200, description = "Override removed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Override not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Schedule"
)]
pub async fn delete_override(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let override_id = path.into_inner();

    let result = sqlx::query("DELETE FROM schedule_overrides WHERE id = ?")
        .bind(override_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, override_id, "Failed to delete override");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Override not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Override removed"
    })))
}
