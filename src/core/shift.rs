use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// The three working shifts. `M` runs overnight and ends on the next
/// calendar day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum ShiftCode {
    P,
    PM,
    M,
}

impl ShiftCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftCode::P => "P",
            ShiftCode::PM => "PM",
            ShiftCode::M => "M",
        }
    }

    /// Scheduled clock-in/clock-out window for this shift on `date`.
    pub fn window(&self, date: NaiveDate) -> ShiftWindow {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        let (start, end, overnight) = match self {
            ShiftCode::P => (t(8, 0), t(20, 0), false),
            ShiftCode::PM => (t(13, 0), t(20, 0), false),
            ShiftCode::M => (t(20, 0), t(8, 0), true),
        };

        let end_date = if overnight {
            date.succ_opt().expect("date out of range")
        } else {
            date
        };

        ShiftWindow {
            start: date.and_time(start),
            end: end_date.and_time(end),
        }
    }

    pub fn duration_hours(&self) -> i64 {
        match self {
            ShiftCode::P | ShiftCode::M => 12,
            ShiftCode::PM => 7,
        }
    }
}

/// Materialized scheduled window. For `M` the end lands on the following day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// What the rotation yields for one employee on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayShift {
    Work(ShiftCode),
    Off,
}

impl DayShift {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayShift::Work(code) => code.as_str(),
            DayShift::Off => "OFF",
        }
    }

    pub fn parse(s: &str) -> Option<DayShift> {
        if s == "OFF" {
            return Some(DayShift::Off);
        }
        s.parse::<ShiftCode>().ok().map(DayShift::Work)
    }

    pub fn is_off(&self) -> bool {
        matches!(self, DayShift::Off)
    }
}

/// The fixed 5-slot rotation cycle every employee walks through.
const ROTATION: [DayShift; 5] = [
    DayShift::Work(ShiftCode::P),
    DayShift::Work(ShiftCode::PM),
    DayShift::Work(ShiftCode::M),
    DayShift::Off,
    DayShift::Off,
];

/// Number of admin-assignable rotation phases; offsets must be below this.
pub const ROTATION_LEN: u8 = ROTATION.len() as u8;

/// Resolve the shift for `date` given the employee's rotation offset.
///
/// The day index is the proleptic Gregorian day number (days counted from
/// 0001-01-01), so the cycle is continuous across month and year boundaries
/// and a given (date, offset) pair always resolves to the same slot. The
/// anchor is fixed forever; changing it would shift every historical
/// schedule. Offsets are reduced modulo the cycle length, so any stored
/// value still maps to a defined slot.
pub fn resolve_shift(date: NaiveDate, rotation_offset: u8) -> DayShift {
    let day_index = date.num_days_from_ce() as u64;
    let slot = ((day_index + rotation_offset as u64) % ROTATION.len() as u64) as usize;
    ROTATION[slot]
}

/// Manual override rows take precedence over the computed rotation.
pub fn resolve_with_override(
    override_shift: Option<DayShift>,
    date: NaiveDate,
    rotation_offset: u8,
) -> DayShift {
    override_shift.unwrap_or_else(|| resolve_shift(date, rotation_offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn cycle_order_and_wrap() {
        // 2024-01-05 sits on slot 0 for offset 0
        let base = d(2024, 1, 5);
        let expect = [
            DayShift::Work(ShiftCode::P),
            DayShift::Work(ShiftCode::PM),
            DayShift::Work(ShiftCode::M),
            DayShift::Off,
            DayShift::Off,
            DayShift::Work(ShiftCode::P), // wraps
        ];
        for (i, want) in expect.iter().enumerate() {
            let date = base + chrono::Duration::days(i as i64);
            assert_eq!(resolve_shift(date, 0), *want, "day {i}");
        }
    }

    #[test]
    fn five_day_periodicity() {
        for offset in 0..ROTATION_LEN {
            for i in 0..30 {
                let date = d(2023, 12, 1) + chrono::Duration::days(i);
                let plus_cycle = date + chrono::Duration::days(5);
                assert_eq!(resolve_shift(date, offset), resolve_shift(plus_cycle, offset));
            }
        }
    }

    #[test]
    fn offset_shifts_phase() {
        let date = d(2024, 1, 5);
        assert_eq!(resolve_shift(date, 0), DayShift::Work(ShiftCode::P));
        assert_eq!(resolve_shift(date, 1), DayShift::Work(ShiftCode::PM));
        assert_eq!(resolve_shift(date, 2), DayShift::Work(ShiftCode::M));
        assert_eq!(resolve_shift(date, 3), DayShift::Off);
        assert_eq!(resolve_shift(date, 4), DayShift::Off);
        // out-of-range offsets reduce modulo the cycle
        assert_eq!(resolve_shift(date, 5), DayShift::Work(ShiftCode::P));
    }

    #[test]
    fn continuous_across_month_boundary() {
        // consecutive slots, no reset on the 1st
        let jan31 = resolve_shift(d(2024, 1, 31), 0);
        let feb1 = resolve_shift(d(2024, 2, 1), 0);
        assert_eq!(jan31, DayShift::Work(ShiftCode::PM));
        assert_eq!(feb1, DayShift::Work(ShiftCode::M));
    }

    #[test]
    fn override_wins() {
        let date = d(2024, 1, 5);
        assert_eq!(
            resolve_with_override(Some(DayShift::Off), date, 0),
            DayShift::Off
        );
        assert_eq!(
            resolve_with_override(None, date, 0),
            DayShift::Work(ShiftCode::P)
        );
    }

    #[test]
    fn night_shift_window_ends_next_day() {
        let w = ShiftCode::M.window(d(2024, 1, 7));
        assert_eq!(w.start, d(2024, 1, 7).and_hms_opt(20, 0, 0).unwrap());
        assert_eq!(w.end, d(2024, 1, 8).and_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn day_shift_round_trips_as_str() {
        for s in ["P", "PM", "M", "OFF"] {
            assert_eq!(DayShift::parse(s).unwrap().as_str(), s);
        }
        assert!(DayShift::parse("X").is_none());
    }
}
