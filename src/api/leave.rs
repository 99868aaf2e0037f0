use crate::{
    auth::auth::AuthUser,
    config::Config,
    core::shift::{DayShift, resolve_with_override},
    events::{EventHub, LiveEvent, LiveEventKind},
    model::attendance::AttendanceStatus,
    utils::activity_log::{self, NewActivity},
};
use actix_web::{HttpRequest, HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, prelude::FromRow};
use std::collections::HashMap;
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

/// Off-roster day types an employee can request. Each maps onto the
/// attendance status written when the request is approved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Permit,
    Sick,
    Leave,
}

impl LeaveType {
    fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Permit => "permit",
            LeaveType::Sick => "sick",
            LeaveType::Leave => "leave",
        }
    }

    fn attendance_status(&self) -> AttendanceStatus {
        match self {
            LeaveType::Permit => AttendanceStatus::Permit,
            LeaveType::Sick => AttendanceStatus::Sick,
            LeaveType::Leave => AttendanceStatus::Leave,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "permit" => Some(LeaveType::Permit),
            "sick" => Some(LeaveType::Sick),
            "leave" => Some(LeaveType::Leave),
            _ => None,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-11", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: LeaveType,
    #[schema(example = "high fever")]
    pub reason: Option<String>,
    /// Reference to an uploaded doctor's note or similar
    pub evidence_path: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Filter by request status
    #[param(example = "pending")]
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveResponse {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-11", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: String,
    pub reason: Option<String>,
    pub evidence_path: Option<String>,
    #[schema(example = "pending")]
    pub status: Option<String>,
    #[schema(example = "2026-01-09T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = CreateLeave,
    responses(
        (status = 200, description = "Request submitted", body = Object, example = json!({
            "message": "Leave request submitted",
            "status": "pending"
        })),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if payload.start_date > payload.end_date {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "start_date cannot be after end_date"
        })));
    }

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (employee_id, start_date, end_date, leave_type, reason, evidence_path, status)
        VALUES (?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(employee_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.leave_type.as_str())
    .bind(&payload.reason)
    .bind(&payload.evidence_path)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to create leave request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request submitted",
        "status": "pending"
    })))
}

#[derive(FromRow)]
struct PendingLeave {
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_type: String,
}

/// Write the approved status into attendance for every scheduled work day
/// in the range; existing rows (e.g. an earlier clock-in) are overridden.
async fn apply_leave_to_attendance(
    pool: &MySqlPool,
    leave: &PendingLeave,
) -> Result<(), actix_web::Error> {
    let leave_type = LeaveType::parse(&leave.leave_type).ok_or_else(|| {
        error!(leave_type = %leave.leave_type, "Unknown leave type on approval");
        ErrorInternalServerError("Leave request data is corrupt")
    })?;
    let status = leave_type.attendance_status();

    let rotation_offset = sqlx::query_scalar::<_, u8>(
        "SELECT rotation_offset FROM employees WHERE id = ?",
    )
    .bind(leave.employee_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch employee for leave approval");
        ErrorInternalServerError("Internal Server Error")
    })?
    .ok_or_else(|| ErrorInternalServerError("Employee no longer exists"))?;

    let overrides: HashMap<NaiveDate, String> = sqlx::query_as::<_, (NaiveDate, String)>(
        r#"
        SELECT date, shift_code FROM schedule_overrides
        WHERE employee_id = ? AND date BETWEEN ? AND ?
        "#,
    )
    .bind(leave.employee_id)
    .bind(leave.start_date)
    .bind(leave.end_date)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch overrides for leave approval");
        ErrorInternalServerError("Internal Server Error")
    })?
    .into_iter()
    .collect();

    let mut date = leave.start_date;
    while date <= leave.end_date {
        let override_shift = overrides.get(&date).and_then(|code| {
            let parsed = DayShift::parse(code);
            if parsed.is_none() {
                warn!(employee_id = leave.employee_id, %date, %code, "Skipping unparseable override");
            }
            parsed
        });

        let day = resolve_with_override(override_shift, date, rotation_offset);

        // rest days need no leave status; the scorer treats them as neutral
        if !day.is_off() {
            sqlx::query(
                r#"
                INSERT INTO attendance
                (employee_id, date, shift_code, status, late_minutes, early_leave_minutes)
                VALUES (?, ?, ?, ?, 0, 0)
                ON DUPLICATE KEY UPDATE status = VALUES(status)
                "#,
            )
            .bind(leave.employee_id)
            .bind(date)
            .bind(day.as_str())
            .bind(status)
            .execute(pool)
            .await
            .map_err(|e| {
                error!(error = %e, %date, "Failed to write leave status");
                ErrorInternalServerError("Internal Server Error")
            })?;
        }

        date += Duration::days(1);
    }

    Ok(())
}

/* =========================
Approve leave (supervisor/admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved"),
        (status = 400, description = "Not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    hub: web::Data<EventHub>,
    req: HttpRequest,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, PendingLeave>(
        r#"
        SELECT employee_id, start_date, end_date, leave_type
        FROM leave_requests
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Approve leave lookup failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(leave) = leave else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave request not found or already processed"
        })));
    };

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'approved'
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Approve leave failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave request not found or already processed"
        })));
    }

    apply_leave_to_attendance(pool.get_ref(), &leave).await?;

    activity_log::record(
        pool.get_ref(),
        config.activity_retention_days,
        NewActivity {
            user_id: auth.user_id,
            action: "leave.approve",
            target: Some("/leave"),
            details: Some(format!("request {leave_id}")),
            user_agent: req
                .headers()
                .get(actix_web::http::header::USER_AGENT)
                .and_then(|h| h.to_str().ok()),
        },
    )
    .await;

    hub.publish(LiveEvent::new(
        LiveEventKind::LeaveDecision,
        leave.employee_id,
        format!("Leave request {leave_id} approved"),
    ));

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved"
    })))
}

/* =========================
Reject leave (supervisor/admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected"),
        (status = 400, description = "Not found or already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    hub: web::Data<EventHub>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let leave_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'rejected'
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(leave_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Reject leave failed");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Leave request not found or already processed"
        })));
    }

    let employee_id = sqlx::query_scalar::<_, u64>(
        "SELECT employee_id FROM leave_requests WHERE id = ?",
    )
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await
    .ok()
    .flatten()
    .unwrap_or(0);

    hub.publish(LiveEvent::new(
        LiveEventKind::LeaveDecision,
        employee_id,
        format!("Leave request {leave_id} rejected"),
    ));

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected"
    })))
}

/// Get one leave request
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, LeaveResponse>(
        r#"
        SELECT id, employee_id, start_date, end_date, leave_type, reason,
               evidence_path, status, created_at
        FROM leave_requests
        WHERE id = ?
        "#,
    )
    .bind(leave_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Failed to fetch leave request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match leave {
        Some(data) => Ok(HttpResponse::Ok().json(data)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave request not found"
        }))),
    }
}

/// List leave requests
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count leave requests");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, employee_id, start_date, end_date, leave_type, reason,
               evidence_path, status, created_at
        FROM leave_requests
        {}
        ORDER BY created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveResponse>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch leave list");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
