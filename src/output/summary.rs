//! Run summary
//!
//! Aggregates what each region produced so the end of a run can be reported
//! in one place.

use crate::crawler::{RegionEnd, RegionOutcome};
use chrono::{DateTime, Utc};

/// Summary of one discovery run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Outcome of every region processed, in processing order
    pub regions: Vec<RegionOutcome>,

    /// Institutions handed to the sink
    pub institutions: usize,
}

impl RunSummary {
    /// Starts a summary at the current time
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            regions: Vec::new(),
            institutions: 0,
        }
    }

    /// Records a finished region
    pub fn record_region(&mut self, outcome: RegionOutcome) {
        self.institutions += outcome.emitted;
        self.regions.push(outcome);
    }

    /// Records institutions produced outside of region pagination
    pub fn record_institutions(&mut self, count: usize) {
        self.institutions += count;
    }

    /// Stamps the finish time
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Regions that ended because consecutive pages failed
    pub fn aborted_regions(&self) -> Vec<&str> {
        self.regions
            .iter()
            .filter(|outcome| matches!(outcome.end, RegionEnd::Aborted { .. }))
            .map(|outcome| outcome.region.as_str())
            .collect()
    }

    /// Institutions skipped because their detail page could not be used
    pub fn skipped_institutions(&self) -> usize {
        self.regions.iter().map(|outcome| outcome.skipped).sum()
    }

    /// Logs the summary
    pub fn log(&self) {
        tracing::info!(
            "Run finished: {} institutions from {} regions in {}s",
            self.institutions,
            self.regions.len(),
            self.duration_seconds().unwrap_or_default()
        );

        let skipped = self.skipped_institutions();
        if skipped > 0 {
            tracing::warn!("{} institutions skipped after detail failures", skipped);
        }

        let aborted = self.aborted_regions();
        if !aborted.is_empty() {
            tracing::warn!("Regions aborted early: {}", aborted.join(", "));
        }
    }
}
