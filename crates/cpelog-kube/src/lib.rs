//! Optional Kubernetes pre-step for the log analyzer.
//!
//! Copies only the log files matching a pattern out of running pods into a
//! local directory, which then becomes the analysis input. All cluster
//! access goes through `kubectl`.

pub mod command;
pub mod pods;
pub mod sync;

pub use sync::sync_pattern_only;
