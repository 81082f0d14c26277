//! Multi-backend fact-check pipeline
//!
//! # Architecture
//!
//! - **FactCheckBackend trait**: a service that returns a raw four-section report
//! - **FactCheckOrchestrator**: fans a request out to every configured backend,
//!   tolerates partial failure, and produces the final report
//! - **ReportReconciler**: merges per-backend reports, deduplicating sources
//!   and averaging truth percentages
//!
//! Raw answers go through [`crate::report::parse`] before reconciliation and
//! through the citation linker afterwards.
//!
//! # Example
//!
//! ```ignore
//! use crosscheck::check::{CheckRequest, FactCheckOrchestrator};
//! use crosscheck::config::{CheckConfig, Credentials};
//!
//! let config = CheckConfig::load_or_default(None)?;
//! let orchestrator = FactCheckOrchestrator::from_config(&config)?;
//! let credentials = config.resolve_credentials(&Credentials::from_env());
//!
//! let request = CheckRequest::new("The Great Wall is visible from space")
//!     .with_url("https://example.com/article");
//! let report = orchestrator.run_fact_check(&request, &credentials).await?;
//! println!("{}", report.truth_percentage);
//! ```

pub mod backends;
mod orchestrator;
pub mod prompt;
mod reconciler;
mod traits;
mod types;

pub use orchestrator::FactCheckOrchestrator;
pub use reconciler::{parse_percentage, reconcile, ReportReconciler};
pub use traits::{BackendRegistry, FactCheckBackend};
pub use types::{
    AttributedReport, BackendError, BackendFailure, BackendResult, CheckError, CheckRequest,
};
