//! HTTP fetcher implementation
//!
//! This module handles all requests to the registry search service, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - The `SearchService` seam between the crawler and the network
//! - Single-retry logic with a fixed backoff for transient failures

use crate::config::HttpConfig;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Total attempts for one request: the initial try plus one retry
pub const MAX_ATTEMPTS: u32 = 2;

/// Query parameter carrying the program filter
pub const PROGRAM_PARAM: &str = "p";

/// Query parameter carrying the region code
pub const REGION_PARAM: &str = "s";

/// Query parameter carrying the results page number
pub const PAGE_PARAM: &str = "pg";

/// Query parameter carrying an institution identifier
pub const ID_PARAM: &str = "id";

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

/// Parameters of one results-page request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    /// Program codes constraining the results, identical for every region
    pub program_filter: String,

    /// Region code being searched
    pub region: String,

    /// 1-based results page number
    pub page_num: u32,
}

impl SearchQuery {
    /// Creates a query for one page of a region's results
    pub fn new(program_filter: impl Into<String>, region: impl Into<String>, page_num: u32) -> Self {
        Self {
            program_filter: program_filter.into(),
            region: region.into(),
            page_num,
        }
    }
}

/// The registry search service as seen by the crawler
///
/// Implementations return raw HTML. A single call is a single attempt; retries
/// are layered on top by [`PageFetcher`].
pub trait SearchService: Send + Sync {
    /// Base URL that relative links on returned pages are resolved against
    fn base_url(&self) -> &Url;

    /// Fetches one page of search results
    fn fetch_results(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;

    /// Fetches the detail page for one institution
    fn fetch_details(
        &self,
        identifier: &str,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`SearchService`] backed by the live registry over HTTP
#[derive(Debug, Clone)]
pub struct HttpSearchService {
    client: Client,
    base_url: Url,
}

impl HttpSearchService {
    /// Creates a service issuing GET requests against `base_url`
    pub fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().extend_pairs(params);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })
    }
}

impl SearchService for HttpSearchService {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn fetch_results(&self, query: &SearchQuery) -> Result<String, FetchError> {
        let page_num = query.page_num.to_string();
        self.get(&[
            (PROGRAM_PARAM, query.program_filter.as_str()),
            (REGION_PARAM, query.region.as_str()),
            (PAGE_PARAM, page_num.as_str()),
        ])
        .await
    }

    async fn fetch_details(&self, identifier: &str) -> Result<String, FetchError> {
        self.get(&[(ID_PARAM, identifier)]).await
    }
}

/// Fetches pages through a [`SearchService`] with single-retry semantics
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Any failure on the first attempt | Wait the fixed backoff, try once more |
/// | Failure on the second attempt | Return `FetchError::Exhausted` |
///
/// There is no exponential growth and no jitter; requests are issued one at a
/// time against a single service.
#[derive(Debug)]
pub struct PageFetcher<S> {
    service: S,
    backoff: Duration,
}

impl<S: SearchService> PageFetcher<S> {
    /// Creates a fetcher waiting `backoff` between the two attempts
    pub fn new(service: S, backoff: Duration) -> Self {
        Self { service, backoff }
    }

    /// The underlying search service
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Fetches one results page, retrying once on failure
    pub async fn fetch_results(&self, query: &SearchQuery) -> Result<String, FetchError> {
        let target = format!("region = {}, page = {}", query.region, query.page_num);
        self.with_retry(&target, || self.service.fetch_results(query))
            .await
    }

    /// Fetches one institution's detail page, retrying once on failure
    pub async fn fetch_details(&self, name: &str, identifier: &str) -> Result<String, FetchError> {
        let target = format!("details of {} (id = {})", name, identifier);
        self.with_retry(&target, || self.service.fetch_details(identifier))
            .await
    }

    async fn with_retry<F, Fut>(&self, target: &str, request: F) -> Result<String, FetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String, FetchError>>,
    {
        let mut attempt = 1;
        loop {
            match request().await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < MAX_ATTEMPTS => {
                    tracing::warn!("Failed to fetch {}: {}. Will retry.", target, e);
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::info!("Max retries exceeded for fetching {}", target);
                    return Err(FetchError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
            }
        }
    }
}
