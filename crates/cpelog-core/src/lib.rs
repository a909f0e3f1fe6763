//! Core types for the FileNet CPE log analyzer.
//!
//! Holds the record and window models, the error type, relative time-window
//! resolution, message-family normalisation and the CLI settings shared by
//! the other crates.

pub mod error;
pub mod models;
pub mod normalizer;
pub mod settings;
pub mod time_window;

pub use error::{AnalyzerError, Result};
