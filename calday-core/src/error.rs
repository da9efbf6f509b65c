//! Error types for calday.

use thiserror::Error;

/// Errors that can occur while fetching, decoding and caching calendar data.
#[derive(Error, Debug)]
pub enum CalDayError {
    #[error("Could not reach calendar feed: {0}")]
    Transport(String),

    #[error("Calendar feed responded with HTTP {0}")]
    HttpStatus(u16),

    #[error("ICS parse error: {0}")]
    Parse(String),

    #[error("Invalid event '{uid}': {reason}")]
    PerEvent { uid: String, reason: String },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CalDayError {
    pub(crate) fn per_event(uid: &str, reason: impl Into<String>) -> Self {
        CalDayError::PerEvent {
            uid: uid.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for calday operations.
pub type CalDayResult<T> = Result<T, CalDayError>;
