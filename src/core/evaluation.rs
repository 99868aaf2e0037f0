use crate::core::shift::DayShift;
use crate::model::attendance::AttendanceStatus;
use chrono::{Duration, NaiveDateTime};
use derive_more::Display;

/// Clock-out is accepted from this many minutes before the scheduled end.
pub const CLOCK_OUT_TOLERANCE_MIN: i64 = 5;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum EvalError {
    /// The scheduled shift could not be determined for a computation that
    /// requires one. Must surface to the caller, never default to zero.
    #[display(fmt = "scheduled shift is missing for this attendance record")]
    MissingSchedule,
}

impl std::error::Error for EvalError {}

/// Outcome of comparing actual clock times against the scheduled window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub status: AttendanceStatus,
    pub late_minutes: u32,
    pub early_leave_minutes: u32,
}

/// Evaluate actual clock-in/out against the resolved day.
///
/// `scheduled` is `None` when the schedule could not be determined at all
/// (corrupt or missing data) — that is an error, distinct from a known OFF
/// day. A clock-in on an OFF day is accepted as PRESENT with zero lateness.
pub fn evaluate(
    clock_in: NaiveDateTime,
    clock_out: Option<NaiveDateTime>,
    scheduled: Option<DayShift>,
) -> Result<Evaluation, EvalError> {
    let day = scheduled.ok_or(EvalError::MissingSchedule)?;

    let code = match day {
        DayShift::Off => {
            return Ok(Evaluation {
                status: AttendanceStatus::Present,
                late_minutes: 0,
                early_leave_minutes: 0,
            });
        }
        DayShift::Work(code) => code,
    };

    let window = code.window(clock_in.date());

    let late_minutes = (clock_in - window.start).num_minutes().max(0) as u32;
    let early_leave_minutes = clock_out
        .map(|out| (window.end - out).num_minutes().max(0) as u32)
        .unwrap_or(0);

    let status = if late_minutes > 0 {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    };

    Ok(Evaluation {
        status,
        late_minutes,
        early_leave_minutes,
    })
}

/// Clock-out window predicate: permitted from five minutes before the
/// scheduled end onward. Violations reject the action, they never clamp
/// the timestamp.
pub fn can_clock_out(now: NaiveDateTime, scheduled_out: NaiveDateTime) -> bool {
    now >= scheduled_out - Duration::minutes(CLOCK_OUT_TOLERANCE_MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shift::ShiftCode;
    use chrono::NaiveDate;

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn p_shift() -> Option<DayShift> {
        Some(DayShift::Work(ShiftCode::P))
    }

    #[test]
    fn on_time_clock_in_is_present() {
        let eval = evaluate(dt(5, 8, 0), None, p_shift()).unwrap();
        assert_eq!(eval.status, AttendanceStatus::Present);
        assert_eq!(eval.late_minutes, 0);
    }

    #[test]
    fn late_clock_in_counts_whole_minutes() {
        // 08:35 against an 08:00 start
        let eval = evaluate(dt(5, 8, 35), None, p_shift()).unwrap();
        assert_eq!(eval.status, AttendanceStatus::Late);
        assert_eq!(eval.late_minutes, 35);
    }

    #[test]
    fn lateness_is_monotonic_in_clock_in() {
        let base = evaluate(dt(5, 8, 10), None, p_shift()).unwrap();
        for extra in 1..60 {
            let later = evaluate(
                dt(5, 8, 10) + Duration::minutes(extra),
                None,
                p_shift(),
            )
            .unwrap();
            assert_eq!(later.late_minutes, base.late_minutes + extra as u32);
        }
    }

    #[test]
    fn early_leave_counts_whole_minutes() {
        let eval = evaluate(dt(5, 8, 0), Some(dt(5, 19, 30)), p_shift()).unwrap();
        assert_eq!(eval.early_leave_minutes, 30);
        assert_eq!(eval.status, AttendanceStatus::Present);
    }

    #[test]
    fn full_day_has_no_early_leave() {
        let eval = evaluate(dt(5, 8, 0), Some(dt(5, 20, 10)), p_shift()).unwrap();
        assert_eq!(eval.early_leave_minutes, 0);
    }

    #[test]
    fn night_shift_clock_out_next_morning() {
        // M runs 20:00 -> 08:00 next day; leaving 07:30 is 30 minutes early
        let eval = evaluate(
            dt(7, 20, 10),
            Some(dt(8, 7, 30)),
            Some(DayShift::Work(ShiftCode::M)),
        )
        .unwrap();
        assert_eq!(eval.late_minutes, 10);
        assert_eq!(eval.early_leave_minutes, 30);
    }

    #[test]
    fn off_day_clock_in_is_present_with_zero() {
        let eval = evaluate(dt(8, 9, 0), None, Some(DayShift::Off)).unwrap();
        assert_eq!(
            eval,
            Evaluation {
                status: AttendanceStatus::Present,
                late_minutes: 0,
                early_leave_minutes: 0
            }
        );
    }

    #[test]
    fn missing_schedule_is_an_error() {
        assert_eq!(
            evaluate(dt(5, 8, 0), None, None).unwrap_err(),
            EvalError::MissingSchedule
        );
    }

    #[test]
    fn clock_out_gate_tolerance() {
        let out = dt(5, 20, 0);
        assert!(can_clock_out(dt(5, 19, 56), out));
        assert!(can_clock_out(dt(5, 19, 55), out)); // boundary inclusive
        assert!(!can_clock_out(dt(5, 19, 54), out));
        assert!(can_clock_out(dt(5, 20, 30), out));
    }
}
