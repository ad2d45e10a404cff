//! State module for tracking discovery progress
//!
//! This module provides the per-region state threaded through pagination.
//!
//! # Components
//!
//! - `RegionProgress`: Tracks the current page, the page limit, and whether more pages follow

mod region_progress;

// Re-export main types
pub use region_progress::RegionProgress;
