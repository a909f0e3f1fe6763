//! Data ingestion layer for the log analyzer.
//!
//! Responsible for discovering and reading log files, parsing individual
//! lines, grouping records into families and running the top-level analysis
//! pipeline.

pub mod aggregator;
pub mod analysis;
pub mod parser;
pub mod reader;

pub use cpelog_core as core;
