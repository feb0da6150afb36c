//! The HTTP transport boundary.
//!
//! Everything that touches the network goes through [`Fetcher`], a thin
//! wrapper around a shared `reqwest::Client` configured with a browser-like
//! User-Agent, an `Accept-Language` header, and a hard per-request timeout.
//! The rest of the pipeline only depends on its synchronous
//! request-in/markup-out contract.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, instrument};

/// User-Agent sent with every request. Some sources refuse obviously
/// non-browser agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Hard timeout applied to each request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A blocking-in-spirit HTTP fetcher; one instance is shared for the
/// whole run so connections can be reused.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build the shared client with default headers and timeout.
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Fetcher { client })
    }

    /// GET a URL and return its body as text.
    ///
    /// A transport error, a timeout, or a non-2xx status all surface as
    /// errors; callers decide whether the failure is fatal to their step
    /// (for this pipeline it never is).
    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}
