//! crosscheck: multi-backend fact-check aggregation engine
//!
//! Sends a piece of text to several independent AI backends, parses each
//! free-text answer into a structured report, and merges the reports into
//! one with deduplicated sources, an averaged truth score and linked
//! citations.
//!
//! # Core Concepts
//!
//! - **Report**: `{ truth_percentage, fact_check, context, sources }`, parsed
//!   from one backend's answer or merged from several
//! - **Backend**: a service that fact-checks text (chat model, search + model)
//! - **Reconciliation**: merging reports while keeping each backend's narrative
//!   attributed to it
//!
//! # Example
//!
//! ```
//! use crosscheck::report::{linkify, parse};
//!
//! let report = parse("Sources:\n1. [Atlas](https://atlas.example)\n\nTruth: 80%\n\nFact Check: True [1].");
//! assert_eq!(report.truth_percentage, "80%");
//! assert!(linkify(&report.fact_check, &report.sources).contains("https://atlas.example"));
//! ```

pub mod check;
pub mod config;
pub mod report;

pub use check::{
    AttributedReport, BackendError, CheckError, CheckRequest, FactCheckBackend,
    FactCheckOrchestrator, ReportReconciler,
};
pub use config::{CheckConfig, ConfigError, Credentials};
pub use report::{FactCheckReport, Source};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
