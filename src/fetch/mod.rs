//! The document fetch seam between the runner and the network.
//!
//! The runner drives one fetch session, strictly one document at a time.
//! Implementations return the raw page source as a string; parsing happens
//! in the engine, on this side of any await point.

pub mod http;
pub mod mock;

pub use http::HttpFetcher;
pub use mock::MockFetcher;

use async_trait::async_trait;

/// Errors that can occur while fetching a document
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request timed out; the session is assumed wedged
    #[error("Timed out fetching {0}")]
    Timeout(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} fetching {link}")]
    Status { status: u16, link: String },

    /// Network-level failure (connect, TLS, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// The link is not a fetchable URL
    #[error("Invalid link: {0}")]
    InvalidLink(String),

    /// The session could not be built or rebuilt
    #[error("Session error: {0}")]
    Session(String),
}

impl FetchError {
    /// Transient failures warrant a session restart and another attempt
    /// within the same pass; everything else aborts the pass.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

/// A navigable fetch session.
///
/// `reconnect` must leave the fetcher usable again after a wedged session;
/// the runner calls it after every transient failure and after a pass
/// abort, before the next pass begins.
#[async_trait]
pub trait DocumentFetcher: Send + std::fmt::Debug {
    /// Fetch the page source for a link.
    async fn fetch(&mut self, link: &str) -> Result<String, FetchError>;

    /// Tear down and re-establish the fetch session.
    async fn reconnect(&mut self) -> Result<(), FetchError>;
}
