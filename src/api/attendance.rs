use crate::{
    auth::auth::AuthUser,
    config::Config,
    core::{
        evaluation::{self, CLOCK_OUT_TOLERANCE_MIN},
        geofence,
        shift::{DayShift, resolve_with_override},
    },
    events::{EventHub, LiveEvent, LiveEventKind},
    model::attendance::{Attendance, AttendanceStatus},
    utils::activity_log::{self, NewActivity},
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpRequest, HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::{error, warn};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ClockInRequest {
    #[schema(example = -6.251427)]
    pub latitude: f64,
    #[schema(example = 107.113802)]
    pub longitude: f64,
    /// Opaque reference to an already-uploaded evidence image
    pub evidence_path: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Supervisors/admins may inspect another employee
    pub employee_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Deserialize, ToSchema)]
pub struct AbsenceRequest {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
}

enum FilterValue {
    U64(u64),
    Date(NaiveDate),
}

fn user_agent(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
}

/// Resolved day for one employee on one date, overrides first.
async fn resolve_day(
    pool: &MySqlPool,
    employee_id: u64,
    rotation_offset: u8,
    date: NaiveDate,
) -> Result<DayShift, actix_web::Error> {
    let override_code = sqlx::query_scalar::<_, String>(
        "SELECT shift_code FROM schedule_overrides WHERE employee_id = ? AND date = ?",
    )
    .bind(employee_id)
    .bind(date)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch schedule override");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let override_shift = match override_code {
        Some(code) => Some(DayShift::parse(&code).ok_or_else(|| {
            // corrupt override is a data error, never defaulted away
            error!(employee_id, %date, %code, "Unparseable schedule override");
            ErrorInternalServerError("Schedule data is corrupt")
        })?),
        None => None,
    };

    Ok(resolve_with_override(override_shift, date, rotation_offset))
}

/// Geofenced clock-in
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body = ClockInRequest,
    responses(
        (status = 200, description = "Clocked in", body = Object, example = json!({
            "message": "Clocked in",
            "shift": "P",
            "status": "LATE",
            "late_minutes": 35
        })),
        (status = 400, description = "Outside the office area, or already clocked in"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    hub: web::Data<EventHub>,
    req: HttpRequest,
    payload: web::Json<ClockInRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if !geofence::is_within_radius(
        payload.latitude,
        payload.longitude,
        config.office_latitude,
        config.office_longitude,
        config.geofence_radius_m,
    ) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Location is outside the office area"
        })));
    }

    let rotation_offset = sqlx::query_scalar::<_, u8>(
        "SELECT rotation_offset FROM employees WHERE id = ? AND status = 'active'",
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to fetch employee");
        ErrorInternalServerError("Internal Server Error")
    })?
    .ok_or_else(|| actix_web::error::ErrorForbidden("No active employee profile"))?;

    let now = Local::now().naive_local();
    let today = now.date();

    let day = resolve_day(pool.get_ref(), employee_id, rotation_offset, today).await?;

    // clock-in on an OFF day is accepted as PRESENT with zero lateness
    let eval = evaluation::evaluate(now, None, Some(day)).map_err(|e| {
        error!(error = %e, employee_id, "Attendance evaluation failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO attendance
        (employee_id, date, shift_code, clock_in, status, late_minutes, early_leave_minutes,
         latitude, longitude, evidence_path)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(today)
    .bind(day.as_str())
    .bind(now)
    .bind(eval.status)
    .bind(eval.late_minutes)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(&payload.evidence_path)
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        // unique (employee_id, date) key resolves concurrent clock-ins
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "Already clocked in today"
                })));
            }
        }

        error!(error = %e, employee_id, "Clock-in failed");
        return Err(ErrorInternalServerError("Internal Server Error"));
    }

    activity_log::record(
        pool.get_ref(),
        config.activity_retention_days,
        NewActivity {
            user_id: auth.user_id,
            action: "attendance.clock_in",
            target: Some("/attendance"),
            details: Some(format!("shift {} late {}m", day.as_str(), eval.late_minutes)),
            user_agent: user_agent(&req),
        },
    )
    .await;

    hub.publish(LiveEvent::new(
        LiveEventKind::ClockIn,
        employee_id,
        format!("{} clocked in ({})", auth.username, day.as_str()),
    ));

    Ok(HttpResponse::Ok().json(json!({
        "message": "Clocked in",
        "shift": day.as_str(),
        "status": eval.status,
        "late_minutes": eval.late_minutes
    })))
}

/// Clock-out, gated to the tolerance window before the scheduled end
#[utoipa::path(
    put,
    path = "/api/v1/attendance",
    responses(
        (status = 200, description = "Clocked out", body = Object, example = json!({
            "message": "Clocked out",
            "early_leave_minutes": 0
        })),
        (status = 400, description = "No active clock-in, or before the allowed window"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    hub: web::Data<EventHub>,
    req: HttpRequest,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let now = Local::now().naive_local();
    let today = now.date();

    // the overnight M shift clocks out on the following morning, so the
    // open record may carry yesterday's date
    let yesterday = today - Duration::days(1);

    let record = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, employee_id, date, shift_code, clock_in, clock_out, status,
               late_minutes, early_leave_minutes, latitude, longitude, evidence_path
        FROM attendance
        WHERE employee_id = ? AND clock_out IS NULL AND date >= ?
        ORDER BY date DESC
        LIMIT 1
        "#,
    )
    .bind(employee_id)
    .bind(yesterday)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Clock-out lookup failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(record) = record else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No active clock-in found"
        })));
    };

    let day = DayShift::parse(&record.shift_code).ok_or_else(|| {
        error!(record_id = record.id, code = %record.shift_code, "Corrupt shift code on record");
        ErrorInternalServerError("Attendance record has no valid scheduled shift")
    })?;

    if let DayShift::Work(code) = day {
        let window = code.window(record.date);
        if !evaluation::can_clock_out(now, window.end) {
            let opens = window.end - Duration::minutes(CLOCK_OUT_TOLERANCE_MIN);
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!(
                    "Clock-out is not allowed yet; it opens at {}",
                    opens.format("%H:%M")
                )
            })));
        }
    }

    let clock_in = record.clock_in.ok_or_else(|| {
        error!(record_id = record.id, "Open attendance record without clock-in");
        ErrorInternalServerError("Attendance record is missing its clock-in")
    })?;

    let eval = evaluation::evaluate(clock_in, Some(now), Some(day)).map_err(|e| {
        error!(error = %e, record_id = record.id, "Attendance evaluation failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET clock_out = ?, early_leave_minutes = ?
        WHERE id = ? AND clock_out IS NULL
        "#,
    )
    .bind(now)
    .bind(eval.early_leave_minutes)
    .bind(record.id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Clock-out failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No active clock-in found"
        })));
    }

    activity_log::record(
        pool.get_ref(),
        config.activity_retention_days,
        NewActivity {
            user_id: auth.user_id,
            action: "attendance.clock_out",
            target: Some("/attendance"),
            details: Some(format!("early {}m", eval.early_leave_minutes)),
            user_agent: user_agent(&req),
        },
    )
    .await;

    hub.publish(LiveEvent::new(
        LiveEventKind::ClockOut,
        employee_id,
        format!("{} clocked out", auth.username),
    ));

    Ok(HttpResponse::Ok().json(json!({
        "message": "Clocked out",
        "early_leave_minutes": eval.early_leave_minutes
    })))
}

/// Paginated attendance history
#[utoipa::path(
    get,
    path = "/api/v1/attendance/records",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page"),
        ("employee_id" = Option<u64>, Query, description = "Inspect another employee (supervisor/admin)"),
        ("from" = Option<String>, Query, description = "Start date"),
        ("to" = Option<String>, Query, description = "End date")
    ),
    responses(
        (status = 200, description = "Paginated attendance records", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = match query.employee_id {
        Some(other) => {
            auth.require_supervisor_or_admin()?;
            other
        }
        None => auth.require_employee()?,
    };

    let per_page = query.per_page.unwrap_or(31).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE employee_id = ?");
    let mut args = vec![FilterValue::U64(employee_id)];

    if let Some(from) = query.from {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Date(from));
    }
    if let Some(to) = query.to {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Date(to));
    }

    let count_sql = format!("SELECT COUNT(*) FROM attendance{}", where_sql);
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count attendance records");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, employee_id, date, shift_code, clock_in, clock_out, status,
               late_minutes, early_leave_minutes, latitude, longitude, evidence_path
        FROM attendance
        {}
        ORDER BY date DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Attendance>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Date(d) => data_q.bind(*d),
        };
    }

    let records = data_q
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch attendance records");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: records,
        page,
        per_page,
        total,
    }))
}

/// Admin correction — the only mutation allowed after clock-out
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Record corrected"),
        (status = 400, description = "Invalid field or value"),
        (status = 404, description = "Record not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn correct_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let record_id = path.into_inner();

    const COLUMNS: [&str; 7] = [
        "clock_in",
        "clock_out",
        "status",
        "late_minutes",
        "early_leave_minutes",
        "evidence_path",
        "shift_code",
    ];

    if let Some(status) = body.get("status") {
        let valid = status
            .as_str()
            .is_some_and(|s| s.parse::<AttendanceStatus>().is_ok());
        if !valid {
            return Err(actix_web::error::ErrorBadRequest("Invalid status value"));
        }
    }
    if let Some(code) = body.get("shift_code") {
        let valid = code.as_str().is_some_and(|s| DayShift::parse(s).is_some());
        if !valid {
            return Err(actix_web::error::ErrorBadRequest("Invalid shift code"));
        }
    }

    let update = build_update_sql("attendance", &body, &COLUMNS, "id", record_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, record_id, "Attendance correction failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })));
    }

    activity_log::record(
        pool.get_ref(),
        config.activity_retention_days,
        NewActivity {
            user_id: auth.user_id,
            action: "attendance.correct",
            target: Some("/attendance"),
            details: Some(format!("record {record_id}")),
            user_agent: user_agent(&req),
        },
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance record corrected"
    })))
}

/// Mark ALPHA for every scheduled employee without a record on a date
#[utoipa::path(
    post,
    path = "/api/v1/attendance/absences",
    request_body = AbsenceRequest,
    responses(
        (status = 200, description = "Absences marked", body = Object, example = json!({
            "message": "Absences marked",
            "marked": 3
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_absences(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<AbsenceRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let date = payload.date;

    let employees = sqlx::query_as::<_, (u64, u8)>(
        "SELECT id, rotation_offset FROM employees WHERE status = 'active'",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch employees for absence sweep");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let overrides: HashMap<u64, String> = sqlx::query_as::<_, (u64, String)>(
        "SELECT employee_id, shift_code FROM schedule_overrides WHERE date = ?",
    )
    .bind(date)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch overrides for absence sweep");
        ErrorInternalServerError("Internal Server Error")
    })?
    .into_iter()
    .collect();

    let mut marked = 0u64;

    for (employee_id, rotation_offset) in employees {
        let override_shift = match overrides.get(&employee_id) {
            Some(code) => match DayShift::parse(code) {
                Some(day) => Some(day),
                None => {
                    warn!(employee_id, %code, "Skipping unparseable override");
                    continue;
                }
            },
            None => None,
        };

        let day = resolve_with_override(override_shift, date, rotation_offset);
        if day.is_off() {
            continue;
        }

        // INSERT IGNORE leaves existing records (clock-ins, approved leave)
        // untouched via the (employee_id, date) unique key
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO attendance
            (employee_id, date, shift_code, status, late_minutes, early_leave_minutes)
            VALUES (?, ?, ?, ?, 0, 0)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(day.as_str())
        .bind(AttendanceStatus::Alpha)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Absence insert failed");
            ErrorInternalServerError("Internal Server Error")
        })?;

        marked += result.rows_affected();
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Absences marked",
        "marked": marked
    })))
}
