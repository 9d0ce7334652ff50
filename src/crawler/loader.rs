//! Page loading over a shared HTTP session
//!
//! This module handles all network access for the pipeline, including:
//! - Building the shared HTTP client with the configured user agent and timeouts
//! - Loading listing and detail pages with a bounded load timeout
//! - Classifying failures so callers can decide what is transient

use crate::config::HttpConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A listing or detail page that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageLoadError {
    #[error("timed out loading {url}")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("{url} loaded but never showed '{selector}'")]
    NotReady { url: String, selector: String },
}

impl PageLoadError {
    /// Returns true if retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::NotReady { .. } => false,
        }
    }
}

/// Loads the markup of one page
///
/// Implementations are shared read-only across concurrent loads.
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &Url) -> Result<String, PageLoadError>;
}

/// Builds the shared HTTP client
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::HttpConfig;
/// use catalog_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.load_timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageLoader`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpPageLoader {
    client: Client,
    load_timeout: Duration,
}

impl HttpPageLoader {
    pub fn new(client: Client, load_timeout: Duration) -> Self {
        Self {
            client,
            load_timeout,
        }
    }

    async fn fetch(&self, url: &Url) -> Result<String, PageLoadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(url, status));
        }

        response.text().await.map_err(|e| classify(url, e))
    }
}

#[async_trait]
impl PageLoader for HttpPageLoader {
    async fn load(&self, url: &Url) -> Result<String, PageLoadError> {
        tracing::debug!("Loading {}", url);

        // The client timeout covers the request; this bounds body streaming as well.
        match tokio::time::timeout(self.load_timeout, self.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(PageLoadError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

fn classify(url: &Url, error: reqwest::Error) -> PageLoadError {
    if error.is_timeout() {
        PageLoadError::Timeout {
            url: url.to_string(),
        }
    } else if let Some(status) = error.status() {
        PageLoadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else if error.is_connect() {
        PageLoadError::Network {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        PageLoadError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Maps a status code to the error the loader would report for it
fn status_error(url: &Url, status: StatusCode) -> PageLoadError {
    PageLoadError::Status {
        url: url.to_string(),
        status: status.as_u16(),
    }
}
