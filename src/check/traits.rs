//! Backend trait defining the fact-check client interface

use super::types::{BackendError, CheckRequest};
use crate::config::Credentials;
use async_trait::async_trait;
use std::sync::Arc;

/// A service that can fact-check a piece of text.
///
/// Implementations return raw report text in the four-section convention
/// (`Sources:`, `Truth:`, `Fact Check:`, `Context:`); parsing and merging
/// happen in the orchestrator.
///
/// # Example
///
/// ```ignore
/// struct EchoBackend;
///
/// #[async_trait]
/// impl FactCheckBackend for EchoBackend {
///     fn name(&self) -> &str { "echo" }
///     fn required_credentials(&self) -> Vec<&str> { vec![] }
///
///     async fn query(
///         &self,
///         request: &CheckRequest,
///         _credentials: &Credentials,
///     ) -> Result<String, BackendError> {
///         Ok(format!("Fact Check: {}", request.selection))
///     }
/// }
/// ```
#[async_trait]
pub trait FactCheckBackend: Send + Sync {
    /// Name used to label this backend's narrative in merged reports
    fn name(&self) -> &str;

    /// Credential names that must all be present before dispatch
    fn required_credentials(&self) -> Vec<&str>;

    /// Fetch a raw report for the request
    async fn query(
        &self,
        request: &CheckRequest,
        credentials: &Credentials,
    ) -> Result<String, BackendError>;

    /// Whether every required credential is available
    fn is_configured(&self, credentials: &Credentials) -> bool {
        self.required_credentials()
            .iter()
            .all(|name| credentials.get(name).is_some())
    }
}

/// Registry of available backends, in registration order
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn FactCheckBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend
    pub fn register<B: FactCheckBackend + 'static>(&mut self, backend: B) {
        self.backends.push(Arc::new(backend));
    }

    /// Register an already shared backend
    pub fn register_shared(&mut self, backend: Arc<dyn FactCheckBackend>) {
        self.backends.push(backend);
    }

    /// All registered backends
    pub fn backends(&self) -> &[Arc<dyn FactCheckBackend>] {
        &self.backends
    }

    /// Backends whose credentials are all present
    pub fn configured(&self, credentials: &Credentials) -> Vec<Arc<dyn FactCheckBackend>> {
        self.backends
            .iter()
            .filter(|b| b.is_configured(credentials))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
