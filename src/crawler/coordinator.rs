//! Discovery coordinator - runs the paginator over every configured region
//!
//! Regions are processed strictly in order, one at a time. A region that
//! aborts never stops the ones after it.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, HttpSearchService, PageFetcher, SearchService};
use crate::crawler::paginator::{RegionEnd, RegionPaginator};
use crate::output::{InstitutionSink, RunSummary};
use crate::{ConfigError, FinderError};
use std::time::Duration;
use url::Url;

/// Country recorded on institutions found through the registry
pub const REGISTRY_COUNTRY_NAME: &str = "USA";

/// Main discovery orchestration structure
#[derive(Debug)]
pub struct DiscoveryOrchestrator<S> {
    paginator: RegionPaginator<S>,
}

impl DiscoveryOrchestrator<HttpSearchService> {
    /// Creates an orchestrator talking to the configured registry
    ///
    /// # Returns
    ///
    /// * `Ok(DiscoveryOrchestrator)` - Ready to run
    /// * `Err(FinderError)` - Missing or invalid registry URL, or the HTTP client could not be built
    pub fn from_config(config: &Config) -> Result<Self, FinderError> {
        let registry_url = config.finder.registry_url.as_deref().ok_or_else(|| {
            ConfigError::Validation(format!(
                "country '{}' must have a registry-url",
                config.finder.country
            ))
        })?;
        let base_url = Url::parse(registry_url)?;

        let client = build_http_client(&config.http)?;
        let service = HttpSearchService::new(client, base_url);
        let fetcher = PageFetcher::new(service, Duration::from_millis(config.http.retry_backoff_ms));

        Ok(Self::new(RegionPaginator::new(
            fetcher,
            config.finder.program_filter.as_str(),
            REGISTRY_COUNTRY_NAME,
        )))
    }
}

impl<S: SearchService> DiscoveryOrchestrator<S> {
    pub fn new(paginator: RegionPaginator<S>) -> Self {
        Self { paginator }
    }

    pub fn paginator(&self) -> &RegionPaginator<S> {
        &self.paginator
    }

    /// Runs discovery over `regions` in order
    ///
    /// Every institution found is forwarded to `sink` as soon as it is
    /// complete. The returned summary covers every region, including those that
    /// ended early.
    pub async fn run(&self, regions: &[String], sink: &dyn InstitutionSink) -> RunSummary {
        tracing::info!("Producing institutions for {} regions", regions.len());

        let mut summary = RunSummary::start();
        for region in regions {
            let outcome = self.paginator.run(region, sink).await;

            match outcome.end {
                RegionEnd::Completed => {}
                RegionEnd::Aborted { page } => {
                    tracing::warn!("Region {} aborted at page {}", region, page);
                }
                RegionEnd::LastPageFailed { page } => {
                    tracing::warn!("Region {} ended on failed last page {}", region, page);
                }
            }

            summary.record_region(outcome);
        }

        tracing::info!("Done");
        summary.finish()
    }
}
