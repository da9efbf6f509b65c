//! ICS feed parsing using the icalendar crate's parser.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};
use tracing::{debug, warn};

use crate::error::{CalDayError, CalDayResult};
use crate::event::{DecodedEvent, EventDescriptor, utc_to_local};
use crate::recurrence::RecurrenceRule;

/// Parse a whole feed into decoded events.
///
/// Fails only when the text is not a calendar at all. A VEVENT that cannot be
/// decoded is logged and skipped so it does not take the rest of the feed down.
pub fn parse_feed(content: &str) -> CalDayResult<Vec<DecodedEvent>> {
    if !content.contains("BEGIN:VCALENDAR") {
        return Err(CalDayError::Parse("missing BEGIN:VCALENDAR".into()));
    }

    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| CalDayError::Parse(e.to_string()))?;

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    let total = vevents.len();
    let events: Vec<DecodedEvent> = vevents
        .into_iter()
        .filter_map(|vevent| match parse_vevent(vevent) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Skipping event");
                None
            }
        })
        .collect();

    debug!(decoded = events.len(), total, "Decoded calendar feed");
    Ok(events)
}

fn collect_vevents<'a>(components: &'a [Component<'a>], out: &mut Vec<&'a Component<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            out.push(component);
        } else if component.name == "VCALENDAR" {
            collect_vevents(&component.components, out);
        }
    }
}

fn parse_vevent(vevent: &Component) -> CalDayResult<DecodedEvent> {
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .filter(|uid| !uid.trim().is_empty())
        .ok_or_else(|| CalDayError::per_event("<missing>", "no UID"))?;

    let (start, start_is_date) = vevent
        .find_prop("DTSTART")
        .and_then(parse_time_property)
        .ok_or_else(|| CalDayError::per_event(&uid, "missing or invalid DTSTART"))?;

    let end = match (vevent.find_prop("DTEND"), vevent.find_prop("DURATION")) {
        (Some(dtend), _) => {
            parse_time_property(dtend)
                .ok_or_else(|| CalDayError::per_event(&uid, "invalid DTEND"))?
                .0
        }
        (None, Some(duration)) => start + parse_duration(duration.val.as_ref(), &uid)?,
        // RFC 5545: a date-only start without an end lasts one day
        (None, None) if start_is_date => start + Duration::days(1),
        (None, None) => start,
    };

    let duration = end - start;
    if duration < Duration::zero() {
        return Err(CalDayError::per_event(&uid, "event ends before it starts"));
    }

    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(parse_time_property)
        .map(|(t, _)| t);

    let descriptor = EventDescriptor {
        summary: text_prop(vevent, "SUMMARY"),
        description: text_prop(vevent, "DESCRIPTION"),
        location: text_prop(vevent, "LOCATION"),
        start,
        duration,
        attendees: attendee_names(vevent),
        recurrence_id,
        uid,
    };

    // An override instance carries RECURRENCE-ID and is always a one-off.
    let rrule = vevent
        .find_prop("RRULE")
        .map(|p| p.val.to_string())
        .filter(|_| recurrence_id.is_none());

    Ok(match rrule {
        Some(rrule) => {
            let exdates = vevent
                .properties
                .iter()
                .filter(|p| p.name == "EXDATE")
                .flat_map(parse_exdate_property)
                .collect();
            DecodedEvent::Recurring(descriptor, RecurrenceRule { rrule, exdates })
        }
        None => DecodedEvent::Singular(descriptor),
    })
}

fn text_prop(vevent: &Component, name: &str) -> Option<String> {
    vevent.find_prop(name).map(|p| unescape_text(p.val.as_ref()))
}

/// Undo RFC 5545 TEXT escaping (`\n`, `\,`, `\;`, `\\`).
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

/// Collect CN parameters of every ATTENDEE, in feed order.
///
/// Attendees without a CN contribute nothing. Repeated CN parameters on one
/// attendee are flattened in order.
fn attendee_names(vevent: &Component) -> Vec<String> {
    vevent
        .properties
        .iter()
        .filter(|p| p.name == "ATTENDEE")
        .flat_map(|p| {
            p.params
                .iter()
                .filter(|param| param.key == "CN")
                .filter_map(|param| param.val.as_ref())
                .map(|v| v.as_ref().trim().trim_matches('"').to_string())
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Parse DTSTART/DTEND/RECURRENCE-ID into wall-clock time.
///
/// Returns the time and whether the value was date-only.
fn parse_time_property(prop: &Property) -> Option<(NaiveDateTime, bool)> {
    match DatePerhapsTime::try_from(prop) {
        Ok(DatePerhapsTime::Date(d)) => Some((midnight(d), true)),
        Ok(DatePerhapsTime::DateTime(dt)) => Some((to_wall_clock(dt), false)),
        Err(_) => {
            let first = prop.val.as_ref().split(',').next()?.trim();
            parse_time_value(first, is_date_valued(prop))
        }
    }
}

fn to_wall_clock(dt: CalendarDateTime) -> NaiveDateTime {
    match dt {
        CalendarDateTime::Utc(utc) => utc_to_local(utc.naive_utc()),
        CalendarDateTime::Floating(naive) => naive,
        CalendarDateTime::WithTimezone { date_time, .. } => date_time,
    }
}

fn midnight(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::MIN)
}

fn is_date_valued(prop: &Property) -> bool {
    prop.params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"))
}

/// Parse a raw date or date-time value.
///
/// Handles `20240108`, `20240108T100000Z` and floating `20240108T100000`.
/// TZID-qualified values are taken as wall-clock time.
fn parse_time_value(s: &str, is_date: bool) -> Option<(NaiveDateTime, bool)> {
    if is_date || (s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit())) {
        return NaiveDate::parse_from_str(s, "%Y%m%d")
            .ok()
            .map(|d| (midnight(d), true));
    }

    if let Some(utc) = s.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| (utc_to_local(dt), false));
    }

    NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| (dt, false))
}

/// Parse an EXDATE property, which may hold comma-separated values.
fn parse_exdate_property(prop: &Property) -> Vec<NaiveDateTime> {
    let is_date = is_date_valued(prop);

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| parse_time_value(s, is_date))
        .map(|(t, _)| t)
        .collect()
}

/// Parse a DURATION value (`PT1H30M`, `P1D`, `P2W`).
fn parse_duration(value: &str, uid: &str) -> CalDayResult<Duration> {
    let value = value.trim();
    if value.starts_with('-') {
        return Err(CalDayError::per_event(uid, "negative DURATION"));
    }

    let parsed = iso8601::duration(value.trim_start_matches('+'))
        .map_err(|e| CalDayError::per_event(uid, format!("invalid DURATION '{value}': {e}")))?;
    let std_duration: std::time::Duration = parsed.into();

    Duration::from_std(std_duration)
        .map_err(|e| CalDayError::per_event(uid, format!("DURATION out of range: {e}")))
}
