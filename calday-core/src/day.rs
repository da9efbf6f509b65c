//! Day queries: which events show up on a given date, and in what order.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::event::CalendarEvent;

/// Display class of an event on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    AllDay,
    Timed,
}

/// Options for a day query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayQuery {
    pub hide_all_day: bool,
}

/// An event visible on the queried day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayEntry {
    pub event: CalendarEvent,
    pub kind: EventKind,
    pub multi_day: bool,
}

/// Classify an event as all-day or timed, and whether it spans several days.
///
/// All-day events span several days when their dates differ by more than
/// one (their end is the following midnight). Timed events do as soon as
/// they end on another date.
pub fn classify(event: &CalendarEvent) -> (EventKind, bool) {
    let day_diff = (event.end.date() - event.start.date()).num_days();

    if event.is_all_day() {
        (EventKind::AllDay, day_diff > 1)
    } else {
        (EventKind::Timed, day_diff != 0)
    }
}

/// Whether `event` is visible on `date`.
pub fn overlaps(event: &CalendarEvent, date: NaiveDate) -> bool {
    let (day_start, day_end) = day_bounds(date);

    // An all-day end sits on the next midnight, which belongs to the next day.
    let end = if event.is_all_day() {
        event.end - Duration::milliseconds(1)
    } else {
        event.end
    };

    let in_day = |t: NaiveDateTime| day_start <= t && t <= day_end;

    in_day(event.start) || in_day(end) || (event.start < day_start && end > day_end)
}

/// Events visible on `date`: all-day first, then timed, each ascending by start.
pub fn events_on(events: &[CalendarEvent], date: NaiveDate, query: DayQuery) -> Vec<DayEntry> {
    let mut entries: Vec<DayEntry> = events
        .iter()
        .filter(|event| overlaps(event, date))
        .map(|event| {
            let (kind, multi_day) = classify(event);
            (event, kind, multi_day)
        })
        .filter(|(_, kind, _)| !(query.hide_all_day && *kind == EventKind::AllDay))
        .map(|(event, kind, multi_day)| DayEntry {
            event: event.clone(),
            kind,
            multi_day,
        })
        .collect();

    entries.sort_by_key(|entry| (entry.kind, entry.event.start));
    entries
}

/// First and last millisecond of `date`.
fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    (start, start + Duration::days(1) - Duration::milliseconds(1))
}
