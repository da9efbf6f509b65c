use anyhow::Result;
use calday_core::CalDayResult;
use calday_core::engine::{Engine, RefreshOutcome, RefreshTrigger};
use owo_colors::OwoColorize;

use crate::utils::tui;

pub async fn run(engine: &Engine) -> Result<()> {
    refresh(engine).await?;
    Ok(())
}

/// Manual refresh behind a spinner. Successful outcomes print a one-line
/// summary; errors are left to the caller.
pub async fn refresh(engine: &Engine) -> CalDayResult<RefreshOutcome> {
    let spinner = tui::create_spinner("Refreshing calendar...".to_string());
    let outcome = engine.refresh(RefreshTrigger::Manual).await;
    spinner.finish_and_clear();
    let outcome = outcome?;

    match outcome {
        RefreshOutcome::Updated { events } => {
            println!(
                "{} {} {}",
                "✓".green(),
                events,
                tui::pluralize("event", events)
            );
        }
        RefreshOutcome::Disabled => {
            println!(
                "{}",
                "No feed URL configured. Set one with: calday config set ics_url <URL>".yellow()
            );
        }
        RefreshOutcome::AlreadyRunning => {
            println!("{}", "A refresh is already running".dimmed());
        }
    }

    Ok(outcome)
}
