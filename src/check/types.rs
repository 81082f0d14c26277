//! Core types for the fact-check pipeline

use crate::report::FactCheckReport;
use std::fmt;
use std::time::Duration;

/// What the user asked to have checked
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    /// Selected or pasted text
    pub selection: String,
    /// Surrounding page text, may be empty
    pub page_context: String,
    /// Page the selection came from, may be empty
    pub page_url: String,
}

impl CheckRequest {
    pub fn new(selection: impl Into<String>) -> Self {
        Self {
            selection: selection.into(),
            ..Self::default()
        }
    }

    pub fn with_context(mut self, page_context: impl Into<String>) -> Self {
        self.page_context = page_context.into();
        self
    }

    pub fn with_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = page_url.into();
        self
    }
}

/// A successful report tagged with the backend that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributedReport {
    pub backend: String,
    pub report: FactCheckReport,
}

impl AttributedReport {
    pub fn new(backend: impl Into<String>, report: FactCheckReport) -> Self {
        Self {
            backend: backend.into(),
            report,
        }
    }
}

/// Outcome of one dispatched backend call
#[derive(Debug, Clone)]
pub struct BackendResult {
    pub backend: String,
    pub outcome: Result<FactCheckReport, BackendError>,
}

impl BackendResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Why one backend did not produce a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub backend: String,
    pub error: BackendError,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.error)
    }
}

/// Per-backend errors. Recorded and excluded, never fatal on their own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response missing field: {0}")]
    MissingField(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Search step failed: {0}")]
    SearchFailed(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::MalformedResponse(err.to_string())
        } else {
            BackendError::Http(err.to_string())
        }
    }
}

/// Request-level errors surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("No fact-check backend has credentials configured")]
    NoCredentialsConfigured,

    #[error("All fact-check backends failed: {}", join_failures(.failures))]
    AllBackendsFailed { failures: Vec<BackendFailure> },

    #[error("Cannot reconcile an empty list of reports")]
    ReconcileOnEmptyInput,
}

fn join_failures(failures: &[BackendFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
