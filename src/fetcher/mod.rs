use anyhow::{Context, Result, anyhow};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::config::FetchSettings;

pub mod dom;

/// HTTP client shared by every firm scraper
pub struct PageFetcher {
    client: Client,
    settings: FetchSettings,
}

impl PageFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, settings })
    }

    /// Fetch a page body.
    ///
    /// Returns `Ok(None)` when the server says the page does not exist (404/410),
    /// which listings treat as the end of pagination. Transport errors, 429 and 5xx
    /// responses are retried with a linear backoff.
    pub async fn fetch(&self, url: &str) -> Result<Option<String>> {
        let attempts = self.settings.retry_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!("GET {} (attempt {}/{})", url, attempt, attempts);

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
                        info!("Page not found: {} ({})", url, status);
                        return Ok(None);
                    }

                    if status.is_success() {
                        let body = response
                            .text()
                            .await
                            .with_context(|| format!("Failed to read body of {url}"))?;
                        return Ok(Some(body));
                    }

                    if !is_retryable(status) {
                        return Err(anyhow!("Failed to fetch {}: {}", url, status));
                    }

                    warn!("Fetching {} returned {}", url, status);
                    last_error = Some(anyhow!("Failed to fetch {}: {}", url, status));
                }
                Err(e) => {
                    warn!("Request to {} failed: {}", url, e);
                    last_error = Some(anyhow::Error::new(e).context(format!("Failed to fetch {url}")));
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.settings.retry_backoff * attempt).await;
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Failed to fetch {url}")))
    }

    /// Polite delay between consecutive requests to the same site
    pub async fn pause(&self) {
        if !self.settings.page_delay.is_zero() {
            tokio::time::sleep(self.settings.page_delay).await;
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

impl Clone for PageFetcher {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            settings: self.settings.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use super::PageFetcher;
    use crate::config::FetchSettings;

    /// Fetcher without delays, for tests against a mock server
    pub fn fast_fetcher() -> PageFetcher {
        PageFetcher::new(FetchSettings {
            timeout: Duration::from_secs(5),
            retry_attempts: 2,
            retry_backoff: Duration::ZERO,
            page_delay: Duration::ZERO,
            ..FetchSettings::default()
        })
        .unwrap()
    }
}
