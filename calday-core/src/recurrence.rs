//! RRULE expansion for recurring events.
//!
//! Expands a recurring event into concrete occurrences inside a
//! [`RecurrenceWindow`], skipping EXDATEs. Expansion is lazy and stops at the
//! first candidate past the window end, so unbounded rules terminate.
//!
//! The rrule crate works on zoned datetimes. Wall-clock values are tagged as
//! UTC on the way in and read back with `naive_utc`, so no zone shifting
//! happens in between.

use chrono::{Duration, NaiveDateTime};
use rrule::RRuleSet;

use crate::date_range::RecurrenceWindow;
use crate::error::{CalDayError, CalDayResult};
use crate::event::utc_to_local;

const ICS_DATETIME: &str = "%Y%m%dT%H%M%S";

/// The recurrence part of a VEVENT: its RRULE value and excluded instants.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceRule {
    pub rrule: String,
    pub exdates: Vec<NaiveDateTime>,
}

/// One expanded occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl RecurrenceRule {
    pub fn new(rrule: impl Into<String>) -> Self {
        RecurrenceRule {
            rrule: rrule.into(),
            exdates: Vec::new(),
        }
    }

    /// Build the rule set anchored at the event's original start.
    pub fn to_rrule_set(&self, start: NaiveDateTime) -> CalDayResult<RRuleSet> {
        build_rrule_string(start, self)
            .parse()
            .map_err(|e: rrule::RRuleError| CalDayError::Parse(format!("Invalid RRULE '{}': {}", self.rrule, e)))
    }
}

/// Build an iCalendar-format rule string for the rrule crate parser.
fn build_rrule_string(start: NaiveDateTime, rule: &RecurrenceRule) -> String {
    let mut lines = Vec::with_capacity(rule.exdates.len() + 2);

    lines.push(format!("DTSTART:{}Z", start.format(ICS_DATETIME)));
    lines.push(format!("RRULE:{}", normalize_rrule(&rule.rrule)));

    for exdate in &rule.exdates {
        lines.push(format!("EXDATE:{}Z", exdate.format(ICS_DATETIME)));
    }

    lines.join("\n")
}

/// Rewrite UNTIL into the same UTC-tagged form as DTSTART.
///
/// Date-only UNTIL covers the whole day; floating UNTIL gets a `Z`. A UTC
/// UNTIL is moved onto the local wall clock first, like UTC DTSTARTs are.
fn normalize_rrule(rrule: &str) -> String {
    normalize_rrule_with(rrule, utc_to_local)
}

fn normalize_rrule_with(
    rrule: &str,
    to_wall_clock: impl Fn(NaiveDateTime) -> NaiveDateTime,
) -> String {
    rrule
        .trim()
        .trim_start_matches("RRULE:")
        .split(';')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => {
                if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
                    format!("UNTIL={value}T235959Z")
                } else if let Some(utc) = value.strip_suffix('Z') {
                    match NaiveDateTime::parse_from_str(utc, ICS_DATETIME) {
                        Ok(until) => format!("UNTIL={}Z", to_wall_clock(until).format(ICS_DATETIME)),
                        Err(_) => part.to_string(),
                    }
                } else {
                    format!("UNTIL={value}Z")
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Lazily expand `set` into occurrences inside `window`.
///
/// Each occurrence lasts `duration`. Iteration stops at the first candidate
/// after `window.end`; candidates before `window.start` are skipped.
pub fn expand(
    set: &RRuleSet,
    duration: Duration,
    window: RecurrenceWindow,
) -> impl Iterator<Item = Occurrence> + '_ {
    set.into_iter()
        .map(|dt| dt.naive_utc())
        .take_while(move |start| *start <= window.end)
        .filter(move |start| *start >= window.start)
        .map(move |start| Occurrence {
            start,
            end: start + duration,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn occurrences(
        rule: &RecurrenceRule,
        start: NaiveDateTime,
        duration: Duration,
        window: RecurrenceWindow,
    ) -> Vec<Occurrence> {
        let set = rule.to_rrule_set(start).expect("rule should parse");
        expand(&set, duration, window).collect()
    }

    #[test]
    fn unbounded_daily_rule_is_cut_at_window_end() {
        let rule = RecurrenceRule::new("FREQ=DAILY");
        let window = RecurrenceWindow::new(at(2025, 6, 1, 0), at(2025, 6, 3, 0)).unwrap();

        let occs = occurrences(&rule, at(2025, 1, 1, 0), Duration::hours(1), window);

        let starts: Vec<_> = occs.iter().map(|o| o.start).collect();
        assert_eq!(
            starts,
            vec![at(2025, 6, 1, 0), at(2025, 6, 2, 0), at(2025, 6, 3, 0)]
        );
        for occ in &occs {
            assert_eq!(occ.end - occ.start, Duration::hours(1));
        }
    }

    #[test]
    fn occurrences_stay_inside_window() {
        let rule = RecurrenceRule::new("FREQ=WEEKLY;BYDAY=MO,WE,FR");
        let window = RecurrenceWindow::days(date(2025, 3, 1), date(2025, 4, 30)).unwrap();

        let occs = occurrences(&rule, at(2024, 11, 4, 9), Duration::minutes(30), window);

        assert!(!occs.is_empty());
        assert!(occs.iter().all(|o| window.contains(o.start)));
        assert!(occs.windows(2).all(|w| w[0].start < w[1].start));
    }

    #[test]
    fn exdates_are_skipped() {
        let mut rule = RecurrenceRule::new("FREQ=DAILY;COUNT=5");
        rule.exdates.push(at(2025, 6, 3, 9));
        let window = RecurrenceWindow::days(date(2025, 6, 1), date(2025, 6, 30)).unwrap();

        let occs = occurrences(&rule, at(2025, 6, 1, 9), Duration::hours(1), window);

        assert_eq!(occs.len(), 4);
        assert!(!occs.iter().any(|o| o.start == at(2025, 6, 3, 9)));
    }

    #[test]
    fn floating_until_is_accepted() {
        let rule = RecurrenceRule::new("FREQ=DAILY;UNTIL=20250603T090000");
        let window = RecurrenceWindow::days(date(2025, 6, 1), date(2025, 6, 30)).unwrap();

        let occs = occurrences(&rule, at(2025, 6, 1, 9), Duration::hours(1), window);
        assert_eq!(occs.len(), 3);
    }

    #[test]
    fn date_only_until_covers_the_whole_day() {
        let rule = RecurrenceRule::new("FREQ=DAILY;UNTIL=20250605");
        let window = RecurrenceWindow::days(date(2025, 6, 1), date(2025, 6, 30)).unwrap();

        let occs = occurrences(&rule, at(2025, 6, 1, 0), Duration::days(1), window);
        assert_eq!(occs.len(), 5);
        assert_eq!(occs[4].end, at(2025, 6, 6, 0));
    }

    #[test]
    fn window_entirely_before_series_yields_nothing() {
        let rule = RecurrenceRule::new("FREQ=DAILY");
        let window = RecurrenceWindow::days(date(2024, 1, 1), date(2024, 1, 31)).unwrap();

        let occs = occurrences(&rule, at(2025, 1, 1, 9), Duration::hours(1), window);
        assert!(occs.is_empty());
    }

    #[test]
    fn invalid_rule_is_a_parse_error() {
        let rule = RecurrenceRule::new("FREQ=SOMETIMES");
        let err = rule.to_rrule_set(at(2025, 1, 1, 9)).unwrap_err();
        assert!(matches!(err, CalDayError::Parse(_)));
    }

    #[test]
    fn normalize_keeps_other_parts() {
        assert_eq!(
            normalize_rrule("FREQ=WEEKLY;UNTIL=20250101T100000;BYDAY=MO"),
            "FREQ=WEEKLY;UNTIL=20250101T100000Z;BYDAY=MO"
        );
        assert_eq!(
            normalize_rrule_with("FREQ=DAILY;UNTIL=20250101T100000Z", |t| t),
            "FREQ=DAILY;UNTIL=20250101T100000Z"
        );
    }

    #[test]
    fn utc_until_moves_with_the_start_east_of_utc() {
        let helsinki = |t: NaiveDateTime| t + Duration::hours(3);

        assert_eq!(
            normalize_rrule_with("FREQ=DAILY;UNTIL=20250603T100000Z", helsinki),
            "FREQ=DAILY;UNTIL=20250603T130000Z"
        );

        // DTSTART:20250601T100000Z read on the same +03:00 wall clock
        let set: RRuleSet = format!(
            "DTSTART:{}Z\nRRULE:{}",
            helsinki(at(2025, 6, 1, 10)).format(ICS_DATETIME),
            normalize_rrule_with("FREQ=DAILY;UNTIL=20250603T100000Z", helsinki)
        )
        .parse()
        .unwrap();
        let window = RecurrenceWindow::days(date(2025, 5, 1), date(2025, 7, 31)).unwrap();
        let starts: Vec<_> = expand(&set, Duration::hours(1), window).map(|o| o.start).collect();

        assert_eq!(
            starts,
            vec![at(2025, 6, 1, 13), at(2025, 6, 2, 13), at(2025, 6, 3, 13)]
        );
    }

    #[test]
    fn utc_start_and_until_keep_every_occurrence_on_the_host_clock() {
        let start = utc_to_local(at(2025, 6, 1, 10));
        let rule = RecurrenceRule::new("FREQ=DAILY;UNTIL=20250603T100000Z");
        let window = RecurrenceWindow::days(date(2025, 5, 1), date(2025, 7, 31)).unwrap();

        let occs = occurrences(&rule, start, Duration::hours(1), window);

        assert_eq!(occs.len(), 3);
        assert_eq!(occs[2].start, utc_to_local(at(2025, 6, 3, 10)));
    }
}
