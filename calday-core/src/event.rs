//! Event types.
//!
//! `DecodedEvent` is what the ICS decoder hands to the materializer, and
//! `CalendarEvent` is the canonical, materialized form that the store
//! persists and day queries read.
//!
//! All timestamps are wall-clock `NaiveDateTime`s. Floating and TZID values
//! are taken as they appear in the feed; UTC values are shifted to local time.

use std::fmt;

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceRule;

/// Summary used for events that have no (or an empty) SUMMARY.
pub const UNTITLED_EVENT: &str = "Untitled Event";

/// A materialized calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Unique per occurrence. Expanded occurrences use `{uid}-{epochMillis}`.
    pub uid: String,
    pub summary: String,
    pub description: String,
    pub location: String,
    #[serde(with = "wall_clock")]
    pub start: NaiveDateTime,
    #[serde(with = "wall_clock")]
    pub end: NaiveDateTime,
    /// Attendee display names, in feed order
    pub attendees: Vec<String>,
}

impl CalendarEvent {
    /// All-day events start and end exactly on a local midnight.
    pub fn is_all_day(&self) -> bool {
        is_midnight(self.start) && is_midnight(self.end)
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.summary)
    }
}

/// One VEVENT as decoded from the feed, before materialization.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDescriptor {
    pub uid: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: NaiveDateTime,
    /// Resolved from DTEND or DURATION; never negative
    pub duration: Duration,
    pub attendees: Vec<String>,
    /// Set when this VEVENT overrides one occurrence of a recurring event
    pub recurrence_id: Option<NaiveDateTime>,
}

impl EventDescriptor {
    pub fn end(&self) -> NaiveDateTime {
        self.start + self.duration
    }

    /// Build the canonical event for one occurrence of this descriptor,
    /// applying the defaults for missing optional fields.
    pub(crate) fn to_event(
        &self,
        uid: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> CalendarEvent {
        let summary = self
            .summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNTITLED_EVENT)
            .to_string();

        CalendarEvent {
            uid,
            summary,
            description: self.description.clone().unwrap_or_default(),
            location: self.location.clone().unwrap_or_default(),
            start,
            end,
            attendees: self.attendees.clone(),
        }
    }
}

/// A decoded VEVENT: either a one-off event or a recurring master.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    Singular(EventDescriptor),
    Recurring(EventDescriptor, RecurrenceRule),
}

impl DecodedEvent {
    pub fn descriptor(&self) -> &EventDescriptor {
        match self {
            DecodedEvent::Singular(d) | DecodedEvent::Recurring(d, _) => d,
        }
    }
}

/// Read a UTC instant on the local wall clock.
pub(crate) fn utc_to_local(t: NaiveDateTime) -> NaiveDateTime {
    t.and_utc().with_timezone(&Local).naive_local()
}

pub fn is_midnight(t: NaiveDateTime) -> bool {
    t.hour() == 0 && t.minute() == 0
}

/// Milliseconds since the epoch, reading the wall-clock value as UTC.
///
/// Keeps occurrence uids stable regardless of the host time zone.
pub fn epoch_millis(t: NaiveDateTime) -> i64 {
    t.and_utc().timestamp_millis()
}

/// Uid of one expanded occurrence: `{uid}-{epochMillis}`.
pub fn occurrence_uid(uid: &str, start: NaiveDateTime) -> String {
    format!("{}-{}", uid, epoch_millis(start))
}

/// Serde adapter writing wall-clock timestamps as ISO-8601 with milliseconds.
pub(crate) mod wall_clock {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&t.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;

        NaiveDateTime::parse_from_str(&s, FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(&s).map(|dt| dt.naive_local()))
            .map_err(|e| D::Error::custom(format!("invalid timestamp '{s}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn descriptor() -> EventDescriptor {
        EventDescriptor {
            uid: "abc".to_string(),
            summary: None,
            description: None,
            location: None,
            start: at(2025, 6, 10, 9, 0),
            duration: Duration::hours(1),
            attendees: vec![],
            recurrence_id: None,
        }
    }

    #[test]
    fn missing_fields_get_defaults() {
        let d = descriptor();
        let event = d.to_event(d.uid.clone(), d.start, d.end());

        assert_eq!(event.summary, UNTITLED_EVENT);
        assert_eq!(event.description, "");
        assert_eq!(event.location, "");
        assert_eq!(event.end, at(2025, 6, 10, 10, 0));
    }

    #[test]
    fn blank_summary_is_untitled() {
        let d = EventDescriptor {
            summary: Some("   ".to_string()),
            ..descriptor()
        };
        let event = d.to_event(d.uid.clone(), d.start, d.end());
        assert_eq!(event.summary, UNTITLED_EVENT);
    }

    #[test]
    fn all_day_requires_both_midnights() {
        let d = descriptor();
        let mut event = d.to_event(d.uid.clone(), at(2025, 6, 10, 0, 0), at(2025, 6, 11, 0, 0));
        assert!(event.is_all_day());

        event.end = at(2025, 6, 10, 23, 0);
        assert!(!event.is_all_day());
    }

    #[test]
    fn occurrence_uid_uses_wall_clock_millis() {
        let uid = occurrence_uid("base", at(2025, 6, 1, 0, 0));
        assert_eq!(uid, "base-1748736000000");
    }

    #[test]
    fn timestamps_serialize_with_millis() {
        let d = descriptor();
        let event = d.to_event("abc".to_string(), d.start, d.end());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["start"], "2025-06-10T09:00:00.000");

        let back: CalendarEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
