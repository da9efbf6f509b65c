//! ICS feed decoding.
//!
//! Turns raw iCalendar text into [`DecodedEvent`](crate::event::DecodedEvent)s
//! using the icalendar crate's parser.

mod parse;

pub use parse::parse_feed;
