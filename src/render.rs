//! Terminal rendering for calday types using owo_colors.

use calday_core::CalendarEvent;
use calday_core::day::{DayEntry, EventKind};
use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for DayEntry {
    fn render(&self) -> String {
        let event = &self.event;
        let mut line = match self.kind {
            EventKind::AllDay => format!("  {:>7}  {}", "all-day".dimmed(), event.summary),
            EventKind::Timed => format!(
                "  {:>7}  {} {}",
                event.start.format("%H:%M").to_string(),
                event.summary,
                format!("until {}", event.end.format("%H:%M")).dimmed()
            ),
        };

        if self.multi_day {
            line.push_str(&format!(" {}", "(multi-day)".cyan()));
        }
        if !event.location.is_empty() {
            line.push_str(&format!(" {}", format!("@ {}", event.location).dimmed()));
        }

        line
    }
}

impl Render for CalendarEvent {
    fn render(&self) -> String {
        let mut lines = vec![self.summary.bold().to_string()];

        lines.push(format!("  When:       {}", render_span(self)));
        if !self.location.is_empty() {
            lines.push(format!("  Where:      {}", self.location));
        }
        if !self.attendees.is_empty() {
            lines.push(format!("  Attendees:  {}", self.attendees.join(", ")));
        }
        lines.push(format!("  UID:        {}", self.uid.dimmed()));

        if !self.description.is_empty() {
            lines.push(String::new());
            lines.extend(self.description.lines().map(|l| format!("  {}", l)));
        }

        lines.join("\n")
    }
}

/// Heading for a day (e.g. "Today · Tue Jun 10")
pub fn day_heading(date: NaiveDate) -> String {
    let label = date.format("%a %b %-d").to_string();
    let relative = match (date - Local::now().date_naive()).num_days() {
        0 => Some("Today"),
        1 => Some("Tomorrow"),
        -1 => Some("Yesterday"),
        _ => None,
    };

    match relative {
        Some(relative) => format!("{} · {}", relative, label),
        None => label,
    }
}

fn render_span(event: &CalendarEvent) -> String {
    if event.is_all_day() {
        let last_day = event.end.date().pred_opt().unwrap_or(event.end.date());
        if last_day <= event.start.date() {
            format!("{} (all-day)", event.start.format("%a %b %-d %Y"))
        } else {
            format!(
                "{} to {} (all-day)",
                event.start.format("%a %b %-d"),
                last_day.format("%a %b %-d %Y")
            )
        }
    } else if event.start.date() == event.end.date() {
        format!(
            "{} {} to {}",
            event.start.format("%a %b %-d %Y"),
            event.start.format("%H:%M"),
            event.end.format("%H:%M")
        )
    } else {
        format!(
            "{} to {}",
            event.start.format("%a %b %-d %Y %H:%M"),
            event.end.format("%a %b %-d %Y %H:%M")
        )
    }
}
