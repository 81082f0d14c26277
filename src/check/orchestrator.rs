//! Fact-check orchestrator for coordinating multiple backends
//!
//! Fans a request out to every configured backend at once, waits for all of
//! them to settle, and merges whatever succeeded.

use super::backends::registry_from_specs;
use super::prompt::truncate_chars;
use super::reconciler::ReportReconciler;
use super::traits::{BackendRegistry, FactCheckBackend};
use super::types::{
    AttributedReport, BackendError, BackendFailure, BackendResult, CheckError, CheckRequest,
};
use crate::config::{CheckConfig, Credentials};
use crate::report::{self, CitationLinker, CitationStyle, FactCheckReport};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Orchestrates fact-checking across multiple backends
pub struct FactCheckOrchestrator {
    registry: BackendRegistry,
    reconciler: ReportReconciler,
    linker: CitationLinker,
    /// Per-backend deadline
    timeout: Duration,
    /// Page context is cut to this many characters before dispatch
    max_context_chars: usize,
}

impl Default for FactCheckOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl FactCheckOrchestrator {
    /// Create an orchestrator with no backends and default settings
    pub fn new() -> Self {
        let defaults = CheckConfig::default();
        Self {
            registry: BackendRegistry::new(),
            reconciler: ReportReconciler::new(),
            linker: CitationLinker::new(defaults.citation_style),
            timeout: Duration::from_secs(defaults.timeout_seconds),
            max_context_chars: defaults.max_context_chars,
        }
    }

    /// Create an orchestrator with the backends and settings from `config`
    pub fn from_config(config: &CheckConfig) -> Result<Self, BackendError> {
        Ok(Self {
            registry: registry_from_specs(&config.backends)?,
            reconciler: ReportReconciler::new(),
            linker: CitationLinker::new(config.citation_style),
            timeout: Duration::from_secs(config.timeout_seconds),
            max_context_chars: config.max_context_chars,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_citation_style(mut self, style: CitationStyle) -> Self {
        self.linker = CitationLinker::new(style);
        self
    }

    pub fn with_max_context_chars(mut self, max_chars: usize) -> Self {
        self.max_context_chars = max_chars;
        self
    }

    /// Register a backend
    pub fn register<B: FactCheckBackend + 'static>(&mut self, backend: B) {
        self.registry.register(backend);
    }

    /// Register an already shared backend
    pub fn register_shared(&mut self, backend: Arc<dyn FactCheckBackend>) {
        self.registry.register_shared(backend);
    }

    /// Get the backend registry
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Run a full fact-check: dispatch, parse, reconcile, link citations.
    ///
    /// Fails with [`CheckError::NoCredentialsConfigured`] before any network
    /// call when no backend is usable, and with
    /// [`CheckError::AllBackendsFailed`] when every dispatched backend failed.
    pub async fn run_fact_check(
        &self,
        request: &CheckRequest,
        credentials: &Credentials,
    ) -> Result<FactCheckReport, CheckError> {
        let results = self.dispatch(request, credentials).await?;

        let mut successes = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result.outcome {
                Ok(report) => successes.push(AttributedReport::new(result.backend, report)),
                Err(error) => failures.push(BackendFailure {
                    backend: result.backend,
                    error,
                }),
            }
        }

        if successes.is_empty() {
            warn!(failed = failures.len(), "every fact-check backend failed");
            return Err(CheckError::AllBackendsFailed { failures });
        }

        let merged = self.reconciler.reconcile(&successes)?;
        info!(
            succeeded = successes.len(),
            failed = failures.len(),
            sources = merged.sources.len(),
            truth = %merged.truth_percentage,
            "fact-check merged"
        );

        Ok(FactCheckReport {
            fact_check: self.linker.linkify(&merged.fact_check, &merged.sources),
            context: self.linker.linkify(&merged.context, &merged.sources),
            ..merged
        })
    }

    /// Query every configured backend concurrently and parse what comes back.
    ///
    /// Each backend settles independently: an error or timeout in one is
    /// recorded in its [`BackendResult`] and never cancels the others.
    pub async fn dispatch(
        &self,
        request: &CheckRequest,
        credentials: &Credentials,
    ) -> Result<Vec<BackendResult>, CheckError> {
        let backends = self.registry.configured(credentials);
        if backends.is_empty() {
            warn!(
                registered = self.registry.len(),
                "no fact-check backend has credentials configured"
            );
            return Err(CheckError::NoCredentialsConfigured);
        }

        let request = CheckRequest {
            page_context: truncate_chars(&request.page_context, self.max_context_chars).to_string(),
            ..request.clone()
        };

        info!(backends = backends.len(), "dispatching fact-check");
        let calls = backends
            .iter()
            .map(|backend| self.query_backend(backend.as_ref(), &request, credentials));

        Ok(join_all(calls).await)
    }

    /// Query one backend under the timeout and parse its answer
    async fn query_backend(
        &self,
        backend: &dyn FactCheckBackend,
        request: &CheckRequest,
        credentials: &Credentials,
    ) -> BackendResult {
        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, backend.query(request, credentials)).await
        {
            Ok(Ok(raw)) => {
                debug!(
                    backend = backend.name(),
                    chars = raw.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "backend answered"
                );
                Ok(report::parse(&raw))
            }
            Ok(Err(error)) => Err(error),
            Err(_) => Err(BackendError::Timeout(self.timeout)),
        };

        if let Err(error) = &outcome {
            warn!(backend = backend.name(), %error, "backend failed");
        }

        BackendResult {
            backend: backend.name().to_string(),
            outcome,
        }
    }

    /// Names of registered backends, with whether each is usable
    pub fn backend_status(&self, credentials: &Credentials) -> Vec<(String, bool)> {
        self.registry
            .backends()
            .iter()
            .map(|b| (b.name().to_string(), b.is_configured(credentials)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedBackend {
        name: &'static str,
        reply: Result<&'static str, BackendError>,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedBackend {
        fn ok(name: &'static str, reply: &'static str) -> Self {
            Self {
                name,
                reply: Ok(reply),
                delay: Duration::ZERO,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(name: &'static str, error: BackendError) -> Self {
            Self {
                reply: Err(error),
                ..Self::ok(name, "")
            }
        }
    }

    #[async_trait]
    impl FactCheckBackend for ScriptedBackend {
        fn name(&self) -> &str {
            self.name
        }
        fn required_credentials(&self) -> Vec<&str> {
            vec!["key"]
        }
        async fn query(
            &self,
            request: &CheckRequest,
            _credentials: &Credentials,
        ) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.reply
                .clone()
                .map(|r| r.replace("{context}", &request.page_context))
        }
    }

    fn credentials() -> Credentials {
        Credentials::new().with("key", "secret")
    }

    #[tokio::test]
    async fn no_credentials_issues_no_calls() {
        let backend = ScriptedBackend::ok("a", "Truth: 50%");
        let calls = backend.calls.clone();
        let mut orchestrator = FactCheckOrchestrator::new();
        orchestrator.register(backend);

        let err = orchestrator
            .run_fact_check(&CheckRequest::new("claim"), &Credentials::new())
            .await
            .unwrap_err();

        assert_eq!(err, CheckError::NoCredentialsConfigured);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_registry_is_no_credentials() {
        let orchestrator = FactCheckOrchestrator::new();
        let err = orchestrator
            .run_fact_check(&CheckRequest::new("claim"), &credentials())
            .await
            .unwrap_err();
        assert_eq!(err, CheckError::NoCredentialsConfigured);
    }

    #[tokio::test]
    async fn single_backend_links_citations() {
        let mut orchestrator = FactCheckOrchestrator::new().with_citation_style(CitationStyle::Markdown);
        orchestrator.register(ScriptedBackend::ok(
            "a",
            "Sources:\n1. [A](https://a.example)\n\nTruth: 90%\n\nFact Check: Yes [1].\n\nContext: None [2].",
        ));

        let report = orchestrator
            .run_fact_check(&CheckRequest::new("claim"), &credentials())
            .await
            .unwrap();

        assert_eq!(report.truth_percentage, "90%");
        assert_eq!(report.fact_check, "Yes [[1](https://a.example)].");
        assert_eq!(report.context, "None [2].");
    }

    #[tokio::test]
    async fn slow_backend_times_out_without_blocking_others() {
        let mut slow = ScriptedBackend::ok("slow", "Truth: 10%");
        slow.delay = Duration::from_secs(5);

        let mut orchestrator = FactCheckOrchestrator::new().with_timeout(Duration::from_millis(50));
        orchestrator.register(slow);
        orchestrator.register(ScriptedBackend::ok("fast", "Truth: 80%"));

        let results = orchestrator
            .dispatch(&CheckRequest::new("claim"), &credentials())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].outcome,
            Err(BackendError::Timeout(Duration::from_millis(50)))
        );
        assert!(results[1].is_success());
    }

    #[tokio::test]
    async fn all_failures_are_reported() {
        let mut orchestrator = FactCheckOrchestrator::new();
        orchestrator.register(ScriptedBackend::failing("a", BackendError::Http("refused".into())));
        orchestrator.register(ScriptedBackend::failing(
            "b",
            BackendError::MissingField("choices".into()),
        ));

        let err = orchestrator
            .run_fact_check(&CheckRequest::new("claim"), &credentials())
            .await
            .unwrap_err();

        match err {
            CheckError::AllBackendsFailed { failures } => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].backend, "a");
                assert_eq!(failures[0].error, BackendError::Http("refused".into()));
                assert_eq!(failures[1].error, BackendError::MissingField("choices".into()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn context_is_truncated_before_dispatch() {
        let mut orchestrator = FactCheckOrchestrator::new().with_max_context_chars(4);
        orchestrator.register(ScriptedBackend::ok("a", "Fact Check: {context}"));

        let report = orchestrator
            .run_fact_check(
                &CheckRequest::new("claim").with_context("abcdefgh"),
                &credentials(),
            )
            .await
            .unwrap();

        assert_eq!(report.fact_check, "abcd");
    }

    #[test]
    fn backend_status_reports_configuration() {
        let mut orchestrator = FactCheckOrchestrator::new();
        orchestrator.register(ScriptedBackend::ok("a", ""));

        assert_eq!(orchestrator.backend_status(&credentials()), vec![("a".to_string(), true)]);
        assert_eq!(orchestrator.backend_status(&Credentials::new()), vec![("a".to_string(), false)]);
    }
}
