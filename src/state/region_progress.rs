//! Per-region crawl progress
//!
//! This module defines the state threaded through one region's pagination.
//! Every transition consumes the current value and returns the next one, so the
//! paginator never mutates progress in place and each step can be tested
//! without any I/O.

/// Crawl state for a single region
///
/// `page_limit` is 0 while the total number of result pages is unknown. Once a
/// non-zero limit has been recorded it never changes for the region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionProgress {
    region: String,
    page_num: u32,
    page_limit: u32,
    has_next_page: bool,
}

impl RegionProgress {
    /// Creates the starting progress for a region: page 1, unknown limit
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            page_num: 1,
            page_limit: 0,
            has_next_page: false,
        }
    }

    /// The region code this progress belongs to
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The page that will be fetched next
    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    /// Total number of result pages, 0 if unknown
    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    /// Whether the last processed page indicated more results
    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    /// Returns true once the page limit has been determined
    pub fn is_limit_known(&self) -> bool {
        self.page_limit != 0
    }

    /// Returns true if a failed page may be followed by a fetch of the next page
    ///
    /// Probing is allowed when the limit is unknown or the failed page is still
    /// below the known limit. A failure on the known last page is never probed.
    pub fn can_probe(&self) -> bool {
        !self.is_limit_known() || self.page_num < self.page_limit
    }

    /// Moves to the next page after a failed fetch
    pub fn probe(self) -> Self {
        Self {
            page_num: self.page_num + 1,
            ..self
        }
    }

    /// Records the page limit if it is still unknown
    pub fn with_page_limit(self, page_limit: u32) -> Self {
        if self.is_limit_known() {
            return self;
        }

        Self { page_limit, ..self }
    }

    /// Returns true if another page should be fetched after the current one
    ///
    /// Either the known limit says so, or the page carried a "next page" link.
    pub fn continues(&self, next_link_present: bool) -> bool {
        (self.is_limit_known() && self.page_num < self.page_limit) || next_link_present
    }

    /// Finishes the current page, moving to the next one if continuation holds
    pub fn advance(self, next_link_present: bool) -> Self {
        if self.continues(next_link_present) {
            Self {
                page_num: self.page_num + 1,
                has_next_page: true,
                ..self
            }
        } else {
            self.finish()
        }
    }

    /// Marks the region as having no further pages
    pub fn finish(self) -> Self {
        Self {
            has_next_page: false,
            ..self
        }
    }
}
