//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the sweep, including:
//! - Building the shared HTTP client with browser-like headers
//! - Fetching one profile page per ID
//! - Bounded retry of transient failures
//! - Capping in-flight requests to the target host
//! - Classifying every failure into a `FetchOutcome`

use crate::config::HttpConfig;
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Result of a fetch operation
///
/// Fetch failures are data: nothing past the fetcher ever sees a transport
/// error as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with the page body
    Success(String),

    /// Any status other than 200
    HttpError(u16),

    /// Connect or total timeout elapsed
    Timeout,

    /// Connection refused, DNS failure, reset, TLS error...
    NetworkError(String),
}

impl FetchOutcome {
    /// Returns true if another attempt may succeed
    fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::NetworkError(_) => true,
            Self::HttpError(status) => (500..600).contains(status),
            Self::Success(_) => false,
        }
    }
}

/// Profile URL with an `{id}` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    /// Placeholder substituted with the profile ID
    pub const PLACEHOLDER: &'static str = "{id}";

    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Renders the URL for one ID
    pub fn render(&self, id: u64) -> String {
        self.template.replace(Self::PLACEHOLDER, &id.to_string())
    }
}

/// Source of profile pages
///
/// The coordinator only depends on this trait, so the sweep can be driven by
/// an in-process fetcher in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the profile page for `id`
    ///
    /// Must never panic on transport failures; every failure is an outcome.
    async fn fetch(&self, id: u64) -> FetchOutcome;
}

/// Builds the shared HTTP client
///
/// The client carries a browser-like User-Agent, `Accept` and
/// `Accept-Language`, a short connect timeout and a slightly longer total
/// timeout so slow profiles fail fast instead of holding a batch open.
///
/// # Example
///
/// ```no_run
/// use mojo_sweep::config::HttpConfig;
/// use mojo_sweep::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> crate::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language).map_err(|e| {
            ConfigError::Validation(format!(
                "accept_language '{}' is not a valid header value: {}",
                config.accept_language, e
            ))
        })?,
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.timeout_secs))
        .pool_max_idle_per_host(config.max_idle_per_host)
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Production fetcher: one GET per ID over a shared connection pool
///
/// Clones share the client and the per-host limiter. Every profile URL points
/// at the same host, so the limiter caps connections to that host: a permit
/// is held from `send()` until the body has been read.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    template: UrlTemplate,
    host_limiter: Arc<Semaphore>,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from the HTTP configuration
    pub fn new(config: &HttpConfig) -> crate::Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            template: UrlTemplate::new(config.url_template.clone()),
            host_limiter: Arc::new(Semaphore::new(config.max_connections_per_host.max(1))),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Performs a single GET under a host permit and classifies the result
    async fn fetch_once(&self, url: &str) -> FetchOutcome {
        // Released on return, after the body is read
        let _permit = match self.host_limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => return FetchOutcome::NetworkError("host limiter closed".to_string()),
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return classify_error(&e),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return FetchOutcome::HttpError(status.as_u16());
        }

        match response.text().await {
            Ok(body) => FetchOutcome::Success(body),
            Err(e) => classify_error(&e),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, id: u64) -> FetchOutcome {
        let url = self.template.render(id);
        let mut attempt = 0;

        loop {
            let outcome = self.fetch_once(&url).await;
            if attempt >= self.max_retries || !outcome.is_transient() {
                return outcome;
            }

            attempt += 1;
            tracing::trace!(
                "Retrying {} ({:?}), attempt {}/{}",
                url,
                outcome,
                attempt,
                self.max_retries
            );
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

/// Maps a transport error onto an outcome
fn classify_error(e: &reqwest::Error) -> FetchOutcome {
    if e.is_timeout() {
        FetchOutcome::Timeout
    } else if e.is_connect() {
        FetchOutcome::NetworkError(format!("Connection failed: {}", e))
    } else {
        FetchOutcome::NetworkError(e.to_string())
    }
}
