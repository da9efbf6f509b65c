//! User settings.
//!
//! Settings are persisted in the settings section of the state record (see
//! [`crate::store`]). `CALDAY_*` environment variables override single keys,
//! e.g. `CALDAY_ICS_URL`.

use std::path::PathBuf;

use chrono::{Duration, NaiveDateTime};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::date_range::RecurrenceWindow;
use crate::day::DayQuery;
use crate::error::{CalDayError, CalDayResult};

const ENV_PREFIX: &str = "CALDAY";

static DEFAULT_WINDOW_PAST: &str = "30days";
static DEFAULT_WINDOW_FUTURE: &str = "90days";

/// Longest accepted window span in either direction.
const MAX_WINDOW_SPAN_DAYS: i64 = 100 * 366;

fn default_window_past() -> String {
    DEFAULT_WINDOW_PAST.to_string()
}

fn default_window_future() -> String {
    DEFAULT_WINDOW_FUTURE.to_string()
}

/// Keys accepted by [`Settings::set`].
pub const SETTING_KEYS: &[&str] = &[
    "ics_url",
    "template_path",
    "notes_folder",
    "trim_teams_links",
    "hide_all_day_events",
    "window_past",
    "window_future",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Feed location; empty disables fetching
    #[serde(default)]
    pub ics_url: String,

    /// Note template, used by the note-creation collaborator only
    #[serde(default)]
    pub template_path: String,

    /// Folder for created notes, used by the note-creation collaborator only
    #[serde(default)]
    pub notes_folder: String,

    /// Strip meeting-invite boilerplate from descriptions
    #[serde(default)]
    pub trim_teams_links: bool,

    #[serde(default)]
    pub hide_all_day_events: bool,

    /// How far back recurring events are expanded (humantime, e.g. "30days")
    #[serde(default = "default_window_past")]
    pub window_past: String,

    /// How far ahead recurring events are expanded (humantime, e.g. "12weeks")
    #[serde(default = "default_window_future")]
    pub window_future: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ics_url: String::new(),
            template_path: String::new(),
            notes_folder: String::new(),
            trim_teams_links: false,
            hide_all_day_events: false,
            window_past: default_window_past(),
            window_future: default_window_future(),
        }
    }
}

impl Settings {
    /// Apply `CALDAY_*` environment overrides on top of these settings.
    ///
    /// Invalid window spans fall back to their defaults with a warning.
    pub fn resolve(self) -> CalDayResult<Self> {
        self.resolve_with(Environment::with_prefix(ENV_PREFIX))
    }

    fn resolve_with(self, env: Environment) -> CalDayResult<Self> {
        let base =
            serde_json::to_string(&self).map_err(|e| CalDayError::Config(e.to_string()))?;

        let settings: Settings = Config::builder()
            .add_source(File::from_str(&base, FileFormat::Json))
            .add_source(env.try_parsing(true))
            .build()
            .map_err(|e| CalDayError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalDayError::Config(e.to_string()))?;

        Ok(settings.sanitized())
    }

    /// Reset window spans that do not parse to their defaults.
    pub fn sanitized(mut self) -> Self {
        if let Err(e) = self.past_span() {
            warn!(error = %e, default = DEFAULT_WINDOW_PAST, "Using default window_past");
            self.window_past = default_window_past();
        }
        if let Err(e) = self.future_span() {
            warn!(error = %e, default = DEFAULT_WINDOW_FUTURE, "Using default window_future");
            self.window_future = default_window_future();
        }
        self
    }

    pub fn fetch_enabled(&self) -> bool {
        !self.ics_url.trim().is_empty()
    }

    pub fn past_span(&self) -> CalDayResult<Duration> {
        parse_span("window_past", &self.window_past)
    }

    pub fn future_span(&self) -> CalDayResult<Duration> {
        parse_span("window_future", &self.window_future)
    }

    /// The expansion window around `now`.
    pub fn recurrence_window(&self, now: NaiveDateTime) -> CalDayResult<RecurrenceWindow> {
        RecurrenceWindow::around(now, self.past_span()?, self.future_span()?)
    }

    pub fn day_query(&self) -> DayQuery {
        DayQuery {
            hide_all_day: self.hide_all_day_events,
        }
    }

    /// Notes folder with `~` expanded.
    pub fn notes_folder_path(&self) -> Option<PathBuf> {
        expand_path(&self.notes_folder)
    }

    /// Template path with `~` expanded.
    pub fn template_file(&self) -> Option<PathBuf> {
        expand_path(&self.template_path)
    }

    /// Update one key from its textual value.
    pub fn set(&mut self, key: &str, value: &str) -> CalDayResult<()> {
        match key {
            "ics_url" => self.ics_url = value.trim().to_string(),
            "template_path" => self.template_path = value.to_string(),
            "notes_folder" => self.notes_folder = value.to_string(),
            "trim_teams_links" => self.trim_teams_links = parse_bool(key, value)?,
            "hide_all_day_events" => self.hide_all_day_events = parse_bool(key, value)?,
            "window_past" => {
                parse_span(key, value)?;
                self.window_past = value.to_string();
            }
            "window_future" => {
                parse_span(key, value)?;
                self.window_future = value.to_string();
            }
            _ => {
                return Err(CalDayError::Config(format!(
                    "Unknown setting '{}'. Available: {}",
                    key,
                    SETTING_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn parse_span(key: &str, value: &str) -> CalDayResult<Duration> {
    let std_duration = humantime::parse_duration(value.trim())
        .map_err(|e| CalDayError::Config(format!("Invalid {key} '{value}': {e}")))?;

    let span = Duration::from_std(std_duration)
        .map_err(|e| CalDayError::Config(format!("Invalid {key} '{value}': {e}")))?;

    if span > Duration::days(MAX_WINDOW_SPAN_DAYS) {
        return Err(CalDayError::Config(format!(
            "Invalid {key} '{value}': longer than 100 years"
        )));
    }
    Ok(span)
}

fn parse_bool(key: &str, value: &str) -> CalDayResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(CalDayError::Config(format!(
            "Invalid {key} '{value}': expected true or false"
        ))),
    }
}

fn expand_path(path: &str) -> Option<PathBuf> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    Some(PathBuf::from(shellexpand::tilde(path).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"ics_url": "https://example.com/cal.ics"}"#).unwrap();

        assert_eq!(settings.ics_url, "https://example.com/cal.ics");
        assert_eq!(settings.window_past, "30days");
        assert_eq!(settings.window_future, "90days");
        assert!(!settings.hide_all_day_events);
    }

    #[test]
    fn test_environment_overrides_keys() {
        let settings = Settings {
            ics_url: "https://example.com/a.ics".into(),
            ..Settings::default()
        };

        let resolved = settings
            .resolve_with(env(&[
                ("CALDAY_ICS_URL", "https://example.com/b.ics"),
                ("CALDAY_HIDE_ALL_DAY_EVENTS", "true"),
            ]))
            .unwrap();

        assert_eq!(resolved.ics_url, "https://example.com/b.ics");
        assert!(resolved.hide_all_day_events);
        assert_eq!(resolved.window_future, "90days");
    }

    #[test]
    fn test_invalid_window_falls_back_to_default() {
        let settings = Settings {
            ics_url: "https://example.com/cal.ics".into(),
            window_past: "soonish".into(),
            window_future: "2weeks".into(),
            ..Settings::default()
        };

        let resolved = settings.resolve_with(env(&[])).unwrap();

        assert_eq!(resolved.window_past, "30days");
        assert_eq!(resolved.window_future, "2weeks");
        assert_eq!(resolved.ics_url, "https://example.com/cal.ics");
    }

    #[test]
    fn test_oversized_window_is_rejected() {
        let mut settings = Settings::default();

        assert!(settings.set("window_past", "1000000years").is_err());
        assert_eq!(settings.window_past, "30days");

        settings.window_future = "1000000years".into();
        let now = NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert!(settings.recurrence_window(now).is_err());
        assert_eq!(settings.sanitized().window_future, "90days");
    }

    #[test]
    fn test_recurrence_window_around_now() {
        let settings = Settings {
            window_past: "2days".into(),
            window_future: "1week".into(),
            ..Settings::default()
        };
        let now = NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let window = settings.recurrence_window(now).unwrap();
        assert_eq!(window.start, now - Duration::days(2));
        assert_eq!(window.end, now + Duration::days(7));
    }

    #[test]
    fn test_set_validates_values() {
        let mut settings = Settings::default();

        settings.set("trim_teams_links", "yes").unwrap();
        assert!(settings.trim_teams_links);

        settings.set("ics_url", " webcal://example.com/cal.ics ").unwrap();
        assert_eq!(settings.ics_url, "webcal://example.com/cal.ics");

        assert!(settings.set("hide_all_day_events", "maybe").is_err());
        assert!(settings.set("window_future", "soon").is_err());
        assert!(settings.set("color", "blue").is_err());
        assert_eq!(settings.window_future, "90days");
    }

    #[test]
    fn test_empty_url_disables_fetching() {
        let mut settings = Settings::default();
        assert!(!settings.fetch_enabled());

        settings.ics_url = "  ".into();
        assert!(!settings.fetch_enabled());
    }

    #[test]
    fn test_paths_expand_tilde() {
        let settings = Settings {
            notes_folder: "~/notes".into(),
            ..Settings::default()
        };

        let path = settings.notes_folder_path().unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(settings.template_file().is_none());
    }
}
