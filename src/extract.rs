//! Feed extraction over HTTP

use crate::config::FeedConfig;
use crate::error::{Error, FetchFailure, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// Value of the `action` query parameter selecting the sample list
pub const LIST_ACTION: &str = "getlist";

/// Source of the raw sample list feed
///
/// Implementations make exactly one attempt per call and never retry.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the raw feed text
    ///
    /// # Errors
    /// Returns [`Error::Fetch`] on transport failure, a non-success status,
    /// or a blank body.
    async fn fetch(&self) -> Result<String>;
}

/// Fetches the feed from the MalShare API
pub struct HttpFeedSource {
    /// HTTP client with the configured timeout
    http_client: reqwest::Client,

    /// Endpoint and credentials
    config: FeedConfig,
}

impl HttpFeedSource {
    /// Create a feed source for the given endpoint configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: FeedConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("malshare-etl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<String> {
        debug!("Fetching sample list from {}", self.config.base_url);

        let response = self
            .http_client
            .get(&self.config.base_url)
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("action", LIST_ACTION),
            ])
            .send()
            .await
            .map_err(|e| FetchFailure::Transport {
                message: transport_message(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status {
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.text().await.map_err(|e| FetchFailure::Transport {
            message: transport_message(e),
        })?;

        if body.trim().is_empty() {
            return Err(FetchFailure::EmptyBody.into());
        }

        info!("Fetched sample list ({} bytes)", body.len());
        Ok(body)
    }
}

// The request URL carries the API key
fn transport_message(error: reqwest::Error) -> String {
    error.without_url().to_string()
}
