use crate::api::activity::{ActivityEntry, ActivityListResponse};
use crate::api::attendance::{
    AbsenceRequest, AttendanceListResponse, ClockInRequest,
};
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::leave::{
    CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse, LeaveType,
};
use crate::api::performance::{DailyScore, PerformanceResponse};
use crate::api::schedule::{ScheduleResponse, ScheduledDay, UpsertOverride};
use crate::model::schedule::ScheduleOverride;
use crate::api::tracking::{LivePosition, PingRequest};
use crate::core::shift::ShiftCode;
use crate::model::attendance::{Attendance, AttendanceStatus};
use crate::model::employee::{Employee, EmployeeStatus};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Absensi API",
        version = "1.0.0",
        description = r#"
## Employee attendance & scheduling service

This API powers a single-site attendance system with geofenced clock-in/out,
a fixed 5-day shift rotation, leave approval and live location tracking.

### Key features
- **Attendance** — geofenced clock-in/out, lateness and early-leave scoring
- **Scheduling** — rotation-derived month schedules with manual overrides
- **Leave** — permit/sick/leave requests with approval workflow
- **Tracking** — last-known employee positions for the dashboard map
- **Performance** — 0-100 daily scores derived from attendance

### Security
All endpoints under the API prefix require **JWT Bearer authentication**.
Administrative operations additionally require the admin or supervisor role.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::list_attendance,
        crate::api::attendance::correct_attendance,
        crate::api::attendance::mark_absences,

        crate::api::schedule::month_schedule,
        crate::api::schedule::upsert_override,
        crate::api::schedule::list_overrides,
        crate::api::schedule::delete_override,

        crate::api::leave::create_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::get_leave,
        crate::api::leave::leave_list,

        crate::api::tracking::ping,
        crate::api::tracking::live_positions,

        crate::api::activity::list_activity,

        crate::api::performance::month_performance,

        crate::events::stream_events,
    ),
    components(
        schemas(
            Employee,
            EmployeeStatus,
            CreateEmployee,
            EmployeeListResponse,
            Attendance,
            AttendanceStatus,
            ShiftCode,
            ClockInRequest,
            AttendanceListResponse,
            AbsenceRequest,
            ScheduleResponse,
            ScheduledDay,
            UpsertOverride,
            ScheduleOverride,
            CreateLeave,
            LeaveType,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            PingRequest,
            LivePosition,
            ActivityEntry,
            ActivityListResponse,
            DailyScore,
            PerformanceResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Clock-in/out and attendance records"),
        (name = "Schedule", description = "Shift rotation and manual overrides"),
        (name = "Leave", description = "Permit/sick/leave requests"),
        (name = "Employee", description = "Employee management"),
        (name = "Tracking", description = "Live location tracking"),
        (name = "Activity", description = "Rolling audit log"),
        (name = "Performance", description = "Daily performance scores"),
        (name = "Events", description = "Live dashboard updates"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
