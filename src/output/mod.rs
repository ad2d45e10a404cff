//! Output module for delivering institutions downstream
//!
//! This module handles:
//! - The `Institution` record and the `InstitutionSink` interface
//! - A non-blocking channel sink with a JSON-lines writer task
//! - The end-of-run summary

mod channel;
mod summary;
mod traits;

pub use channel::{open_output, spawn_writer, ChannelSink};
pub use summary::RunSummary;
pub use traits::{Institution, InstitutionSink};
