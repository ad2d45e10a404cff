//! Crawler module for registry discovery
//!
//! This module contains the core discovery logic, including:
//! - HTTP fetching with single-retry logic
//! - Results and detail page parsing
//! - Per-region pagination with probe-and-abort failure handling
//! - Region-by-region orchestration

mod coordinator;
mod fetcher;
mod paginator;
mod parser;

pub use coordinator::{DiscoveryOrchestrator, REGISTRY_COUNTRY_NAME};
pub use fetcher::{
    build_http_client, FetchError, HttpSearchService, PageFetcher, SearchQuery, SearchService,
    MAX_ATTEMPTS,
};
pub use paginator::{RegionEnd, RegionOutcome, RegionPaginator};
pub use parser::{
    estimate_page_limit, extract_details, InstitutionDetails, InstitutionStub, ParseError,
    ResultsPage,
};
