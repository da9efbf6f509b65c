//! Recurrence window bounding expansion and materialization.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{CalDayError, CalDayResult};

/// Closed interval `[start, end]` of wall-clock time.
///
/// Always bounded: open-ended recurrence rules are cut off at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl RecurrenceWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> CalDayResult<Self> {
        if end < start {
            return Err(CalDayError::Config(format!(
                "Recurrence window ends ({end}) before it starts ({start})"
            )));
        }
        Ok(RecurrenceWindow { start, end })
    }

    /// Window reaching `past` back and `future` ahead of `now`.
    pub fn around(now: NaiveDateTime, past: Duration, future: Duration) -> CalDayResult<Self> {
        let start = now
            .checked_sub_signed(past.abs())
            .ok_or_else(|| CalDayError::Config(format!("Window start {past} before {now} is out of range")))?;
        let end = now
            .checked_add_signed(future.abs())
            .ok_or_else(|| CalDayError::Config(format!("Window end {future} after {now} is out of range")))?;

        Ok(RecurrenceWindow { start, end })
    }

    /// Window covering whole days, from `from` 00:00 to the last millisecond of `to`.
    pub fn days(from: NaiveDate, to: NaiveDate) -> CalDayResult<Self> {
        let start = from.and_time(NaiveTime::MIN);
        let end = to.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::milliseconds(1);
        Self::new(start, end)
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let window = RecurrenceWindow::days(date(2025, 6, 1), date(2025, 6, 3)).unwrap();

        assert!(window.contains(date(2025, 6, 1).and_hms_opt(0, 0, 0).unwrap()));
        assert!(window.contains(date(2025, 6, 3).and_hms_milli_opt(23, 59, 59, 999).unwrap()));
        assert!(!window.contains(date(2025, 6, 4).and_hms_opt(0, 0, 0).unwrap()));
        assert!(!window.contains(date(2025, 5, 31).and_hms_opt(23, 59, 59).unwrap()));
    }

    #[test]
    fn reversed_window_is_rejected() {
        assert!(RecurrenceWindow::days(date(2025, 6, 3), date(2025, 6, 1)).is_err());
    }

    #[test]
    fn around_ignores_sign_of_spans() {
        let now = date(2025, 6, 10).and_hms_opt(12, 0, 0).unwrap();
        let window = RecurrenceWindow::around(now, Duration::days(-2), Duration::days(3)).unwrap();

        assert_eq!(window.start, date(2025, 6, 8).and_hms_opt(12, 0, 0).unwrap());
        assert_eq!(window.end, date(2025, 6, 13).and_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn around_rejects_spans_past_the_calendar_range() {
        let now = date(2025, 6, 10).and_hms_opt(12, 0, 0).unwrap();
        let huge = Duration::days(365 * 1_000_000);

        assert!(matches!(
            RecurrenceWindow::around(now, huge, Duration::days(1)),
            Err(CalDayError::Config(_))
        ));
        assert!(matches!(
            RecurrenceWindow::around(now, Duration::days(1), huge),
            Err(CalDayError::Config(_))
        ));
    }
}
