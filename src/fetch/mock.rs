//! Scripted in-memory fetcher for tests and dry runs.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{DocumentFetcher, FetchError};

/// One scripted reply.
#[derive(Debug, Clone)]
enum Response {
    Page(String),
    Timeout,
    Failure,
}

#[derive(Debug, Default)]
struct Script {
    responses: Vec<Response>,
    cursor: usize,
}

impl Script {
    fn next(&mut self) -> Response {
        // The last scripted response repeats for any further fetches, so a
        // single entry behaves like a static page.
        let index = self.cursor.min(self.responses.len() - 1);
        self.cursor += 1;
        self.responses[index].clone()
    }
}

/// Fetcher that replays scripted responses per link and records every call.
///
/// Responses for a link play back in the order they were added, with the
/// last one repeating. Links with no script fail with a network error.
#[derive(Debug, Default)]
pub struct MockFetcher {
    scripts: HashMap<String, Script>,
    fetched: Vec<String>,
    reconnects: usize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful page for a link.
    pub fn with_page(mut self, link: &str, html: &str) -> Self {
        self.push(link, Response::Page(html.to_string()));
        self
    }

    /// Script one timeout for a link.
    pub fn with_timeout(mut self, link: &str) -> Self {
        self.push(link, Response::Timeout);
        self
    }

    /// Script one fatal network failure for a link.
    pub fn with_failure(mut self, link: &str) -> Self {
        self.push(link, Response::Failure);
        self
    }

    fn push(&mut self, link: &str, response: Response) {
        self.scripts
            .entry(link.to_string())
            .or_default()
            .responses
            .push(response);
    }

    /// Every link fetched, in call order, repeats included.
    pub fn fetched(&self) -> &[String] {
        &self.fetched
    }

    /// How many times one link was fetched.
    pub fn fetch_count(&self, link: &str) -> usize {
        self.fetched.iter().filter(|l| l.as_str() == link).count()
    }

    /// How many times the session was re-established.
    pub fn reconnects(&self) -> usize {
        self.reconnects
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch(&mut self, link: &str) -> Result<String, FetchError> {
        self.fetched.push(link.to_string());
        let Some(script) = self.scripts.get_mut(link) else {
            return Err(FetchError::Network(format!(
                "no scripted response for {}",
                link
            )));
        };
        match script.next() {
            Response::Page(html) => Ok(html),
            Response::Timeout => Err(FetchError::Timeout(link.to_string())),
            Response::Failure => Err(FetchError::Network(format!("scripted failure for {}", link))),
        }
    }

    async fn reconnect(&mut self) -> Result<(), FetchError> {
        self.reconnects += 1;
        Ok(())
    }
}
