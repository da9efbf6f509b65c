use anyhow::Result;
use calday_core::engine::Engine;
use chrono::NaiveDate;
use owo_colors::OwoColorize;

use crate::commands::refresh;
use crate::render::{Render, day_heading};

pub async fn run(engine: &Engine, date: NaiveDate, refresh_first: bool) -> Result<()> {
    if refresh_first {
        if let Err(e) = refresh::refresh(engine).await {
            eprintln!("{}", format!("Refresh failed: {}. Showing cached events.", e).yellow());
        }
    }

    if engine.event_count().await == 0 {
        if engine.settings().fetch_enabled() {
            println!("{}", "No events cached yet. Run: calday refresh".dimmed());
        } else {
            println!(
                "{}",
                "No calendar configured. Set one with: calday config set ics_url <URL>".dimmed()
            );
        }
        return Ok(());
    }

    let entries = engine.events_on(date).await;

    println!("{}", day_heading(date).bold());
    if entries.is_empty() {
        println!("  {}", "No events".dimmed());
    }
    for entry in &entries {
        println!("{}", entry.render());
    }

    Ok(())
}
