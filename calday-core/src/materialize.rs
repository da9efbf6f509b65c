//! Materialization of decoded events into the canonical event list.
//!
//! Expands recurring events, keeps one-off events that start inside the
//! window, deduplicates and sorts. One bad event never fails the batch.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::date_range::RecurrenceWindow;
use crate::error::CalDayResult;
use crate::event::{CalendarEvent, DecodedEvent, EventDescriptor, epoch_millis, occurrence_uid};
use crate::recurrence::{RecurrenceRule, expand};

/// Build the canonical list: deduplicated, ascending by start.
pub fn materialize(decoded: &[DecodedEvent], window: &RecurrenceWindow) -> Vec<CalendarEvent> {
    let overrides = override_instants(decoded);

    let mut events = Vec::new();
    for item in decoded {
        match materialize_one(item, window, &overrides) {
            Ok(batch) => events.extend(batch),
            Err(e) => warn!(uid = %item.descriptor().uid, error = %e, "Skipping event"),
        }
    }

    let mut events = dedupe(events);
    // Stable: ties keep insertion order
    events.sort_by_key(|e| e.start);

    debug!(count = events.len(), "Materialized events");
    events
}

fn materialize_one(
    item: &DecodedEvent,
    window: &RecurrenceWindow,
    overrides: &HashMap<&str, Vec<NaiveDateTime>>,
) -> CalDayResult<Vec<CalendarEvent>> {
    match item {
        DecodedEvent::Singular(descriptor) => {
            if !window.contains(descriptor.start) {
                return Ok(Vec::new());
            }
            let uid = match descriptor.recurrence_id {
                Some(instant) => occurrence_uid(&descriptor.uid, instant),
                None => descriptor.uid.clone(),
            };
            Ok(vec![descriptor.to_event(uid, descriptor.start, descriptor.end())])
        }
        DecodedEvent::Recurring(descriptor, rule) => {
            expand_recurring(descriptor, rule, window, overrides)
        }
    }
}

fn expand_recurring(
    descriptor: &EventDescriptor,
    rule: &RecurrenceRule,
    window: &RecurrenceWindow,
    overrides: &HashMap<&str, Vec<NaiveDateTime>>,
) -> CalDayResult<Vec<CalendarEvent>> {
    let set = match overrides.get(descriptor.uid.as_str()) {
        Some(instants) => {
            let mut rule = rule.clone();
            rule.exdates.extend(instants.iter().copied());
            rule.to_rrule_set(descriptor.start)?
        }
        None => rule.to_rrule_set(descriptor.start)?,
    };

    let events = expand(&set, descriptor.duration, *window)
        .map(|occ| descriptor.to_event(occurrence_uid(&descriptor.uid, occ.start), occ.start, occ.end))
        .collect();

    Ok(events)
}

/// Instants of recurring series replaced by RECURRENCE-ID overrides, by uid.
fn override_instants(decoded: &[DecodedEvent]) -> HashMap<&str, Vec<NaiveDateTime>> {
    let mut overrides: HashMap<&str, Vec<NaiveDateTime>> = HashMap::new();

    for item in decoded {
        if let DecodedEvent::Singular(descriptor) = item {
            if let Some(instant) = descriptor.recurrence_id {
                overrides.entry(descriptor.uid.as_str()).or_default().push(instant);
            }
        }
    }

    overrides
}

/// Drop duplicates keyed by `(summary, start)`, first seen wins.
///
/// This collapses the same meeting listed under two UIDs, at the cost of
/// merging two distinct same-titled events that start together. Repeated
/// uids are dropped as well so uids stay unique.
fn dedupe(events: Vec<CalendarEvent>) -> Vec<CalendarEvent> {
    let mut seen_keys: HashSet<(String, i64)> = HashSet::new();
    let mut seen_uids: HashSet<String> = HashSet::new();

    events
        .into_iter()
        .filter(|event| {
            let key = (event.summary.clone(), epoch_millis(event.start));
            if seen_keys.contains(&key) || seen_uids.contains(&event.uid) {
                debug!(uid = %event.uid, summary = %event.summary, "Dropping duplicate event");
                return false;
            }
            seen_keys.insert(key);
            seen_uids.insert(event.uid.clone());
            true
        })
        .collect()
}
