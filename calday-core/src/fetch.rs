//! Feed fetching over HTTP.
//!
//! No retries here: the periodic refresh is the retry.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

use crate::error::{CalDayError, CalDayResult};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new() -> CalDayResult<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> CalDayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("calday/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CalDayError::Transport(e.to_string()))?;

        Ok(FeedFetcher { client })
    }

    /// Fetch the raw feed text. Anything but HTTP 200 is an error; an empty
    /// body is not.
    pub async fn fetch(&self, location: &str) -> CalDayResult<String> {
        let url = feed_url(location)?;
        debug!(%url, "Fetching calendar feed");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CalDayError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CalDayError::HttpStatus(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| CalDayError::Transport(e.to_string()))
    }
}

/// Parse a feed location, mapping `webcal://` to `https://`.
pub fn feed_url(location: &str) -> CalDayResult<Url> {
    let location = location.trim();

    let normalized = match location.get(..9) {
        Some(scheme) if scheme.eq_ignore_ascii_case("webcal://") => {
            format!("https://{}", &location[9..])
        }
        _ => location.to_string(),
    };

    let url = Url::parse(&normalized)
        .map_err(|e| CalDayError::Transport(format!("Invalid feed URL '{location}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CalDayError::Transport(format!(
            "Unsupported feed URL scheme '{other}'"
        ))),
    }
}
