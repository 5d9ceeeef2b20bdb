//! `reqwest`-backed page fetcher with linear retry backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use tracing::{debug, warn};
use url::Url;

use crate::application::sources::{FetchError, PageFetcher};
use crate::config::ScrapeSettings;
use crate::infra::error::InfraError;

const TARGET: &str = "racefinder::scrape::fetch";

/// Desktop Chrome on macOS; some listing hosts refuse unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub timeout: Duration,
    /// Extra attempts after the first failure.
    pub retries: u32,
    /// Delay unit; attempt `n` waits `backoff * n` before retrying.
    pub backoff: Duration,
    pub user_agent: String,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 1,
            backoff: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&ScrapeSettings> for FetchPolicy {
    fn from(settings: &ScrapeSettings) -> Self {
        Self {
            timeout: settings.timeout,
            retries: settings.retries,
            backoff: settings.backoff,
            user_agent: settings.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    policy: FetchPolicy,
}

impl HttpPageFetcher {
    pub fn new(policy: FetchPolicy) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(policy.user_agent.as_str())
            .timeout(policy.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self { client, policy })
    }

    async fn fetch_once(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, ACCEPT_HTML)
            .send()
            .await
            .map_err(|err| classify(url, &err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|err| classify(url, &err))
    }
}

fn classify(url: &Url, err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let mut attempt: u32 = 1;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!(
                        target: TARGET,
                        url = %url,
                        attempt,
                        bytes = body.len(),
                        "Fetched listing page"
                    );
                    return Ok(body);
                }
                Err(err) if attempt <= self.policy.retries => {
                    let delay = self.policy.backoff * attempt;
                    warn!(
                        target: TARGET,
                        url = %url,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Fetch attempt failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(
                        target: TARGET,
                        url = %url,
                        attempt,
                        error = %err,
                        "Fetch attempts exhausted"
                    );
                    return Err(err);
                }
            }
        }
    }
}
