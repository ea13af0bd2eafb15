//! Runtime layer for the UHC parser.
//!
//! Runs per-file reconstruction concurrently on tokio blocking tasks, merges
//! the results into one highscore and archives countable sessions as JSON.

pub mod exporter;
pub mod orchestrator;

pub use uhc_core as core;
pub use uhc_data as data;
