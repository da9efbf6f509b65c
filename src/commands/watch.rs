use std::future::Future;
use std::io;

use anyhow::Result;
use calday_core::engine::Engine;
use owo_colors::OwoColorize;
use tracing::error;

pub async fn run(engine: &Engine) -> Result<()> {
    if !engine.settings().fetch_enabled() {
        anyhow::bail!("No feed URL configured. Set one with: calday config set ics_url <URL>");
    }

    println!(
        "{}",
        "Refreshing now and every 12 hours. Press Ctrl-C to stop.".dimmed()
    );

    engine.watch(until_signal(tokio::signal::ctrl_c())).await;

    println!("Stopped with {} cached events", engine.event_count().await);
    Ok(())
}

/// Resolve when `signal` fires. If the handler cannot be installed, never
/// resolve, so the refresher keeps running until the process is killed.
async fn until_signal<F: Future<Output = io::Result<()>>>(signal: F) {
    if let Err(e) = signal.await {
        error!(error = %e, "Could not listen for Ctrl-C; stop calday by killing the process");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_ends_the_wait() {
        let waited = tokio::time::timeout(
            Duration::from_millis(200),
            until_signal(async { Ok(()) }),
        )
        .await;

        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn test_failed_handler_waits_forever() {
        let waited = tokio::time::timeout(
            Duration::from_millis(100),
            until_signal(async { Err(io::Error::other("no signal support")) }),
        )
        .await;

        assert!(waited.is_err());
    }
}
