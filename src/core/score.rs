use crate::model::attendance::{Attendance, AttendanceStatus};

/// Daily performance score in [0, 100].
///
/// Authorized absences are neutral and never penalized; an unexcused
/// absence zeroes the day; worked days lose one point per minute of
/// lateness or early leave.
pub fn score(status: AttendanceStatus, late_minutes: u32, early_leave_minutes: u32) -> u8 {
    match status {
        AttendanceStatus::Alpha => 0,
        AttendanceStatus::Sick
        | AttendanceStatus::Permit
        | AttendanceStatus::Leave
        | AttendanceStatus::Off => 100,
        AttendanceStatus::Present | AttendanceStatus::Late => {
            let penalty = late_minutes as i64 + early_leave_minutes as i64;
            (100 - penalty).clamp(0, 100) as u8
        }
    }
}

pub fn score_record(record: &Attendance) -> u8 {
    score(record.status, record.late_minutes, record.early_leave_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_minutes_deduct_points() {
        assert_eq!(score(AttendanceStatus::Late, 35, 0), 65);
        assert_eq!(score(AttendanceStatus::Present, 0, 0), 100);
        assert_eq!(score(AttendanceStatus::Present, 0, 12), 88);
    }

    #[test]
    fn heavy_penalty_clamps_to_zero() {
        assert_eq!(score(AttendanceStatus::Late, 90, 40), 0);
        assert_eq!(score(AttendanceStatus::Late, 100, 0), 0);
    }

    #[test]
    fn unexcused_absence_is_zero() {
        assert_eq!(score(AttendanceStatus::Alpha, 0, 0), 0);
    }

    #[test]
    fn authorized_statuses_are_neutral() {
        for status in [
            AttendanceStatus::Sick,
            AttendanceStatus::Permit,
            AttendanceStatus::Leave,
            AttendanceStatus::Off,
        ] {
            assert_eq!(score(status, 30, 30), 100);
        }
    }

    #[test]
    fn score_is_idempotent_and_bounded() {
        for late in [0u32, 5, 50, 500] {
            let a = score(AttendanceStatus::Late, late, 7);
            let b = score(AttendanceStatus::Late, late, 7);
            assert_eq!(a, b);
            assert!(a <= 100);
        }
    }
}
