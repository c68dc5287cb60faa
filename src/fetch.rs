//! Fetching listing pages over HTTP.
//!
//! The module uses a trait-based design so the pipeline can be driven from
//! anything that returns HTML:
//! - [`FetchDocument`]: Core trait defining an async page fetch
//! - [`HttpFetcher`]: `reqwest` implementation with a per-request timeout
//!
//! Retries are deliberately absent; each source is visited once per run and a
//! failed fetch is recorded as a source-level error.

use crate::error::ScrapeError;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Trait for fetching a page's HTML.
pub trait FetchDocument {
    /// Fetch `url` and return the response body.
    ///
    /// Non-2xx responses are errors.
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// [`FetchDocument`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a client that identifies itself with `user_agent` and gives up
    /// on any single request after `timeout`.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, timeout })
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FetchDocument for HttpFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await;
        let dt = t0.elapsed();

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "Request failed");
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(elapsed_ms = dt.as_millis() as u128, %status, "Non-success status");
            return Err(ScrapeError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u128,
            bytes = body.len(),
            "Fetched page"
        );
        Ok(body)
    }
}
