//! Plain HTTP client for pages that do not need a rendered browser.

mod user_agent;

pub use user_agent::{random_user_agent, resolve_user_agent, IMPERSONATE_USER_AGENTS, USER_AGENT};

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::debug;

/// HTTP client with a fixed user agent and a polite delay between requests.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_delay: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration, request_delay: Duration) -> Self {
        Self::with_user_agent(timeout, request_delay, None)
    }

    /// Client with an explicit user-agent choice; the value is
    /// interpreted by [`resolve_user_agent`].
    pub fn with_user_agent(
        timeout: Duration,
        request_delay: Duration,
        user_agent_config: Option<&str>,
    ) -> Self {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            request_delay,
        }
    }

    /// GET a URL, sleeping the configured delay afterwards.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        debug!(
            url,
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "GET request completed"
        );

        tokio::time::sleep(self.request_delay).await;

        Ok(response)
    }
}
