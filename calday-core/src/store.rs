//! Persisted state: settings plus the cached canonical event list.
//!
//! Both live in one JSON record so the event list survives restarts and the
//! UI can show events before the network is reachable:
//!
//! ```json
//! { "settings": { "ics_url": "..." }, "events": [ { "uid": "...", ... } ] }
//! ```
//!
//! Reading never fails the caller: a missing or corrupt section degrades to
//! its default. Writes go to a temp file that is renamed over the record.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{CalDayError, CalDayResult};
use crate::event::CalendarEvent;

const STATE_FILE: &str = "state.json";
const SETTINGS_KEY: &str = "settings";
const EVENTS_KEY: &str = "events";

#[derive(Debug, Clone)]
pub struct EventStore {
    path: PathBuf,
}

impl EventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EventStore { path: path.into() }
    }

    /// `<data dir>/calday/state.json`
    pub fn default_path() -> CalDayResult<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| CalDayError::Config("Could not determine data directory".into()))?
            .join("calday");

        Ok(data_dir.join(STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restore the cached event list, or an empty list if there is none.
    pub async fn load(&self) -> Vec<CalendarEvent> {
        let Some(events) = self.read_section(EVENTS_KEY).await else {
            return Vec::new();
        };

        match serde_json::from_value::<Vec<CalendarEvent>>(events) {
            Ok(events) => {
                debug!(count = events.len(), "Loaded cached events");
                events
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt event cache");
                Vec::new()
            }
        }
    }

    /// Persist the event list. Failures are logged; caching is best-effort.
    pub async fn save(&self, events: &[CalendarEvent]) {
        let result = match serde_json::to_value(events) {
            Ok(value) => self.write_section(EVENTS_KEY, value).await,
            Err(e) => Err(CalDayError::Cache(e.to_string())),
        };

        match result {
            Ok(()) => debug!(count = events.len(), "Saved event cache"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Could not save event cache"),
        }
    }

    /// Stored settings, or defaults if there are none.
    pub async fn load_settings(&self) -> Settings {
        let Some(settings) = self.read_section(SETTINGS_KEY).await else {
            return Settings::default();
        };

        serde_json::from_value(settings).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Ignoring corrupt settings");
            Settings::default()
        })
    }

    pub async fn save_settings(&self, settings: &Settings) -> CalDayResult<()> {
        let value =
            serde_json::to_value(settings).map_err(|e| CalDayError::Cache(e.to_string()))?;
        self.write_section(SETTINGS_KEY, value).await
    }

    async fn read_record(&self) -> Option<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read state file");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(record)) => Some(record),
            _ => {
                warn!(path = %self.path.display(), "State file is not a JSON object, ignoring it");
                None
            }
        }
    }

    async fn read_section(&self, key: &str) -> Option<Value> {
        self.read_record().await?.remove(key)
    }

    /// Replace one section, keeping the other intact.
    async fn write_section(&self, key: &str, value: Value) -> CalDayResult<()> {
        let mut record = self.read_record().await.unwrap_or_default();
        record.insert(key.to_string(), value);

        let content = serde_json::to_string_pretty(&Value::Object(record))
            .map_err(|e| CalDayError::Cache(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}
