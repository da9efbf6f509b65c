//! Core of calday.
//!
//! Fetches an iCalendar feed, expands recurring events inside a bounded
//! window, and keeps a deduplicated, sorted event list that day queries read:
//!
//! ```text
//! fetch → ics → recurrence → materialize → store → day
//! ```
//!
//! [`engine::Engine`] ties these together and owns the current list.

pub mod config;
pub mod date_range;
pub mod day;
pub mod description;
pub mod engine;
pub mod error;
pub mod event;
pub mod fetch;
pub mod ics;
pub mod materialize;
pub mod recurrence;
pub mod store;

pub use error::{CalDayError, CalDayResult};
pub use event::CalendarEvent;
