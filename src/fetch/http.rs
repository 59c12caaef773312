//! HTTP-backed fetch session.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::{DocumentFetcher, FetchError};

/// Browser user agents rotated between sessions. Some publisher platforms
/// serve reduced markup, or a block page, to obvious non-browser agents.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0",
];

/// Fetcher backed by a reqwest client that is rebuilt on every reconnect.
///
/// Each session picks the next agent from the pool, so a restart after a
/// wedged session also changes how the fetcher presents itself. An explicit
/// agent override pins every session to one string.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    agent_override: Option<String>,
    session: usize,
}

impl HttpFetcher {
    /// Build the first session.
    pub fn new(timeout: Duration, agent_override: Option<String>) -> Result<Self, FetchError> {
        let agent = agent_override
            .as_deref()
            .unwrap_or(USER_AGENTS[0])
            .to_string();
        let client = build_client(timeout, &agent)?;
        Ok(Self {
            client,
            timeout,
            agent_override,
            session: 0,
        })
    }

    /// The user agent the current session presents.
    pub fn user_agent(&self) -> &str {
        self.agent_override
            .as_deref()
            .unwrap_or(USER_AGENTS[self.session % USER_AGENTS.len()])
    }

    /// How many times the session has been rebuilt.
    pub fn session(&self) -> usize {
        self.session
    }
}

fn build_client(timeout: Duration, agent: &str) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| FetchError::Session(e.to_string()))
}

fn classify(link: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(link.to_string())
    } else if let Some(status) = err.status() {
        FetchError::Status {
            status: status.as_u16(),
            link: link.to_string(),
        }
    } else {
        FetchError::Network(err.to_string())
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&mut self, link: &str) -> Result<String, FetchError> {
        let url = Url::parse(link).map_err(|_| FetchError::InvalidLink(link.to_string()))?;
        debug!(%url, session = self.session, "fetching");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(link, e))?
            .error_for_status()
            .map_err(|e| classify(link, e))?;
        response.text().await.map_err(|e| classify(link, e))
    }

    async fn reconnect(&mut self) -> Result<(), FetchError> {
        self.session += 1;
        let agent = self.user_agent().to_string();
        self.client = build_client(self.timeout, &agent)?;
        info!(session = self.session, agent = %agent, "fetch session rebuilt");
        Ok(())
    }
}
