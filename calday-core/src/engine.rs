//! The calday engine: settings, cache and the current event list, plus the
//! fetch → decode → materialize → store refresh pipeline.
//!
//! The canonical list is only ever replaced wholesale. Readers take a
//! snapshot (`Arc`) and never observe a half-updated list.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::day::{self, DayEntry};
use crate::error::CalDayResult;
use crate::event::CalendarEvent;
use crate::fetch::FeedFetcher;
use crate::ics::parse_feed;
use crate::materialize::materialize;
use crate::store::EventStore;

/// Period of the background refresh.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// What started a refresh. Only manual refreshes are user-visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Manual,
    Startup,
    Timer,
}

impl RefreshTrigger {
    pub fn is_silent(self) -> bool {
        !matches!(self, RefreshTrigger::Manual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The canonical list was replaced
    Updated { events: usize },
    /// No feed URL is configured
    Disabled,
    /// Another refresh was in flight; this one did nothing
    AlreadyRunning,
}

pub struct Engine {
    settings: Settings,
    store: EventStore,
    fetcher: FeedFetcher,
    events: RwLock<Arc<Vec<CalendarEvent>>>,
    refresh_lock: Mutex<()>,
}

impl Engine {
    /// Load settings and the cached event list from `store`.
    pub async fn open(store: EventStore) -> CalDayResult<Self> {
        let stored = store.load_settings().await;
        let settings = stored.clone().resolve().unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring environment overrides");
            stored.sanitized()
        });
        let events = store.load().await;
        debug!(cached = events.len(), path = %store.path().display(), "Opened event store");

        Ok(Self::with_events(settings, store, FeedFetcher::new()?, events))
    }

    pub fn with_events(
        settings: Settings,
        store: EventStore,
        fetcher: FeedFetcher,
        events: Vec<CalendarEvent>,
    ) -> Self {
        Engine {
            settings,
            store,
            fetcher,
            events: RwLock::new(Arc::new(events)),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// The current canonical list.
    pub async fn snapshot(&self) -> Arc<Vec<CalendarEvent>> {
        Arc::clone(&*self.events.read().await)
    }

    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Events visible on `date`, honoring `hide_all_day_events`.
    pub async fn events_on(&self, date: NaiveDate) -> Vec<DayEntry> {
        day::events_on(&self.snapshot().await, date, self.settings.day_query())
    }

    pub async fn find(&self, uid: &str) -> Option<CalendarEvent> {
        self.snapshot().await.iter().find(|e| e.uid == uid).cloned()
    }

    /// Fetch, decode and materialize the feed, then replace the list and cache.
    ///
    /// On error the previous list and cache are left untouched. Refreshes are
    /// single-flight: a refresh started while another one runs returns
    /// [`RefreshOutcome::AlreadyRunning`].
    pub async fn refresh(&self, trigger: RefreshTrigger) -> CalDayResult<RefreshOutcome> {
        let result = self.refresh_at(Local::now().naive_local()).await;

        // Manual failures are shown to the user by the caller.
        match (&result, trigger.is_silent()) {
            (Ok(outcome), _) => debug!(?trigger, ?outcome, "Refresh finished"),
            (Err(e), true) => warn!(?trigger, error = %e, "Background refresh failed"),
            (Err(e), false) => debug!(?trigger, error = %e, "Refresh failed"),
        }

        result
    }

    async fn refresh_at(&self, now: NaiveDateTime) -> CalDayResult<RefreshOutcome> {
        if !self.settings.fetch_enabled() {
            return Ok(RefreshOutcome::Disabled);
        }

        let Ok(_guard) = self.refresh_lock.try_lock() else {
            return Ok(RefreshOutcome::AlreadyRunning);
        };

        let content = self.fetcher.fetch(&self.settings.ics_url).await?;
        self.apply_feed(&content, now).await
    }

    /// Materialize `content` against the window around `now` and swap it in.
    pub(crate) async fn apply_feed(
        &self,
        content: &str,
        now: NaiveDateTime,
    ) -> CalDayResult<RefreshOutcome> {
        let window = self.settings.recurrence_window(now)?;
        let decoded = parse_feed(content)?;
        let events = materialize(&decoded, &window);
        let count = events.len();

        self.store.save(&events).await;
        *self.events.write().await = Arc::new(events);

        info!(events = count, "Calendar refreshed");
        Ok(RefreshOutcome::Updated { events: count })
    }

    /// Refresh once now and then every [`REFRESH_INTERVAL`] until `shutdown`
    /// completes. All of these refreshes are silent.
    pub async fn watch<F: Future<Output = ()>>(&self, shutdown: F) {
        self.watch_every(REFRESH_INTERVAL, shutdown).await
    }

    async fn watch_every<F: Future<Output = ()>>(&self, period: Duration, shutdown: F) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut trigger = RefreshTrigger::Startup;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // Errors are already logged; the next tick retries.
                    let _ = self.refresh(trigger).await;
                    trigger = RefreshTrigger::Timer;
                }
                _ = &mut shutdown => {
                    debug!("Stopping background refresh");
                    break;
                }
            }
        }
    }
}
