//! Region paginator - walks every results page of one region
//!
//! For each page this module:
//! - Fetches the page, probing the next one if it fails
//! - Infers the page limit and whether another page follows
//! - Expands every result row into an institution via its detail page
//! - Sends each institution to the sink as soon as it is complete
//!
//! # Failure Policy
//!
//! | Situation | Action |
//! |-----------|--------|
//! | Page fails, limit unknown or more pages known | Probe the next page |
//! | Probed page also fails | Abort the region |
//! | Known last page fails | End the region without probing |
//! | Page has no result rows | End the region normally |
//! | One detail page fails | Skip that institution only |
//!
//! Institutions already sent for a region stay valid whatever happens later.

use crate::crawler::fetcher::{FetchError, PageFetcher, SearchQuery, SearchService};
use crate::crawler::parser::{
    estimate_page_limit, extract_details, InstitutionStub, ParseError, ResultsPage,
};
use crate::output::{Institution, InstitutionSink};
use crate::state::RegionProgress;
use thiserror::Error;
use url::Url;

/// How a region's pagination ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionEnd {
    /// The last page was processed, or a page came back without results
    Completed,

    /// `page` failed and so did the probe of the page after it
    Aborted { page: u32 },

    /// The known last page failed; nothing beyond it was probed
    LastPageFailed { page: u32 },
}

/// What one region produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionOutcome {
    pub region: String,

    /// Results pages fetched successfully
    pub pages_fetched: u32,

    /// Institutions sent to the sink
    pub emitted: usize,

    /// Result rows dropped because their detail page failed
    pub skipped: usize,

    pub end: RegionEnd,
}

impl RegionOutcome {
    fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            pages_fetched: 0,
            emitted: 0,
            skipped: 0,
            end: RegionEnd::Completed,
        }
    }
}

#[derive(Debug, Error)]
enum DetailError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Everything the paginator needs from one results page
enum PageScan {
    Empty,
    Results {
        page_limit: u32,
        next_link: bool,
        stubs: Vec<InstitutionStub>,
    },
}

/// Drives the results pages of one region at a time
#[derive(Debug)]
pub struct RegionPaginator<S> {
    fetcher: PageFetcher<S>,
    program_filter: String,
    country: String,
}

impl<S: SearchService> RegionPaginator<S> {
    /// Creates a paginator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetcher for results and detail pages
    /// * `program_filter` - Program codes sent with every results query
    /// * `country` - Country recorded on every institution produced
    pub fn new(
        fetcher: PageFetcher<S>,
        program_filter: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            program_filter: program_filter.into(),
            country: country.into(),
        }
    }

    pub fn fetcher(&self) -> &PageFetcher<S> {
        &self.fetcher
    }

    /// Produces every institution of one region
    ///
    /// Institutions are sent to `sink` one by one, as soon as each detail page
    /// has been parsed. Failures never escape: they end the region or skip an
    /// institution, and the returned outcome says which.
    pub async fn run(&self, region: &str, sink: &dyn InstitutionSink) -> RegionOutcome {
        tracing::info!("Producing for region = {}", region);

        let mut outcome = RegionOutcome::new(region);
        let mut progress = RegionProgress::new(region);

        loop {
            let body = match self.fetch_page(&progress).await {
                Ok(body) => body,
                Err(e) if progress.can_probe() => {
                    let failed_page = progress.page_num();
                    tracing::warn!(
                        "Failed to load page {} of results for {}, attempting next page: {}",
                        failed_page,
                        region,
                        e
                    );

                    progress = progress.probe();
                    match self.fetch_page(&progress).await {
                        Ok(body) => body,
                        Err(e) => {
                            tracing::error!(
                                "Results pages {} and {} failed for {}, not continuing with this region: {}",
                                failed_page,
                                progress.page_num(),
                                region,
                                e
                            );
                            outcome.end = RegionEnd::Aborted { page: failed_page };
                            return outcome;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Final results page {} failed for {}, ending region: {}",
                        progress.page_num(),
                        region,
                        e
                    );
                    outcome.end = RegionEnd::LastPageFailed {
                        page: progress.page_num(),
                    };
                    return outcome;
                }
            };
            outcome.pages_fetched += 1;

            let page_num = progress.page_num();
            let base_url = self.fetcher.service().base_url();

            match scan_results_page(&body, progress.page_limit(), base_url) {
                PageScan::Empty => {
                    tracing::info!("No results on page {} for {}", page_num, region);
                    progress = progress.finish();
                }
                PageScan::Results {
                    page_limit,
                    next_link,
                    stubs,
                } => {
                    if !progress.is_limit_known() && page_limit != 0 {
                        tracing::info!("{} has {} pages of results", region, page_limit);
                    }

                    progress = progress.with_page_limit(page_limit).advance(next_link);
                    if progress.has_next_page() {
                        tracing::info!("Another page of results exists");
                    } else {
                        tracing::info!("Final page of results reached");
                    }

                    tracing::info!("{} results on page {}", stubs.len(), page_num);
                    self.expand_stubs(&stubs, sink, &mut outcome).await;
                }
            }

            if !progress.has_next_page() {
                break;
            }
        }

        tracing::info!(
            "Finished region {}: {} institutions from {} pages",
            region,
            outcome.emitted,
            outcome.pages_fetched
        );
        outcome
    }

    async fn fetch_page(&self, progress: &RegionProgress) -> Result<String, FetchError> {
        let query = SearchQuery::new(
            self.program_filter.as_str(),
            progress.region(),
            progress.page_num(),
        );
        self.fetcher.fetch_results(&query).await
    }

    async fn expand_stubs(
        &self,
        stubs: &[InstitutionStub],
        sink: &dyn InstitutionSink,
        outcome: &mut RegionOutcome,
    ) {
        for stub in stubs {
            match self.institution_details(stub).await {
                Ok(institution) => {
                    sink.send(institution);
                    outcome.emitted += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping {} (id = {}): {}",
                        stub.name,
                        stub.identifier,
                        e
                    );
                    outcome.skipped += 1;
                }
            }
        }
    }

    /// Builds the complete record for one stub from its detail page
    async fn institution_details(&self, stub: &InstitutionStub) -> Result<Institution, DetailError> {
        let body = self
            .fetcher
            .fetch_details(&stub.name, &stub.identifier)
            .await?;
        let details = extract_details(&body)?;

        Ok(Institution::new(
            stub.name.as_str(),
            self.country.as_str(),
            details.address,
            details.website,
        ))
    }
}

/// Reads a fetched results page into owned values
fn scan_results_page(body: &str, current_limit: u32, base_url: &Url) -> PageScan {
    let page = ResultsPage::parse(body);
    if !page.has_result_rows() {
        return PageScan::Empty;
    }

    PageScan::Results {
        page_limit: estimate_page_limit(&page.paging_text(), current_limit),
        next_link: page.has_next_page_link(),
        stubs: page.extract_stubs(base_url),
    }
}
