use crate::{
    auth::auth::AuthUser,
    config::Config,
    events::{EventHub, LiveEvent, LiveEventKind},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySqlPool, prelude::FromRow};
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct PingRequest {
    #[schema(example = -6.2513)]
    pub latitude: f64,
    #[schema(example = 107.1139)]
    pub longitude: f64,
}

#[derive(Serialize, FromRow, ToSchema)]
pub struct LivePosition {
    pub employee_id: u64,
    pub full_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[schema(example = "2026-01-05T08:00:00", format = "date-time", value_type = String)]
    pub reported_at: NaiveDateTime,
}

/// Report the employee's current position
#[utoipa::path(
    post,
    path = "/api/v1/tracking/ping",
    request_body = PingRequest,
    responses(
        (status = 200, description = "Position stored (or tracking not applicable)"),
        (status = 400, description = "Malformed coordinates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tracking"
)]
pub async fn ping(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    hub: web::Data<EventHub>,
    payload: web::Json<PingRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    if !payload.latitude.is_finite() || !payload.longitude.is_finite() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Malformed coordinates"
        })));
    }

    if !config.tracking_required {
        return Ok(HttpResponse::Ok().json(json!({
            "message": "Location tracking is disabled"
        })));
    }

    if !config.is_tracked_role(auth.role) {
        return Ok(HttpResponse::Ok().json(json!({
            "message": "This role is not tracked; position ignored"
        })));
    }

    // last write wins per employee
    sqlx::query(
        r#"
        INSERT INTO location_pings (employee_id, latitude, longitude, reported_at)
        VALUES (?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            latitude = VALUES(latitude),
            longitude = VALUES(longitude),
            reported_at = VALUES(reported_at)
        "#,
    )
    .bind(employee_id)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(Utc::now().naive_utc())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to store tracking ping");
        ErrorInternalServerError("Internal Server Error")
    })?;

    hub.publish(LiveEvent::new(
        LiveEventKind::TrackingPing,
        employee_id,
        format!("{} reported position", auth.username),
    ));

    Ok(HttpResponse::Ok().json(json!({
        "message": "Position stored"
    })))
}

/// Latest known position per employee for the dashboard map
#[utoipa::path(
    get,
    path = "/api/v1/tracking/live",
    responses(
        (status = 200, description = "Latest positions", body = [LivePosition]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Tracking"
)]
pub async fn live_positions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_supervisor_or_admin()?;

    let positions = sqlx::query_as::<_, LivePosition>(
        r#"
        SELECT p.employee_id, e.full_name, p.latitude, p.longitude, p.reported_at
        FROM location_pings p
        JOIN employees e ON e.id = p.employee_id
        ORDER BY p.reported_at DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch live positions");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(positions))
}
