//! Mock fact-check backend
//!
//! Answers with a preconfigured report or error and counts how often it was
//! called.

use async_trait::async_trait;
use crosscheck::check::{BackendError, CheckRequest, FactCheckBackend};
use crosscheck::config::Credentials;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the mock answers with
#[derive(Clone)]
pub enum MockReply {
    Report(String),
    Failure(BackendError),
}

pub struct MockBackend {
    name: String,
    credential: String,
    reply: MockReply,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// A backend answering with `raw` report text
    pub fn answering(name: &str, credential: &str, raw: &str) -> Self {
        Self {
            name: name.to_string(),
            credential: credential.to_string(),
            reply: MockReply::Report(raw.to_string()),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A backend that always fails with `error`
    pub fn failing(name: &str, credential: &str, error: BackendError) -> Self {
        Self {
            reply: MockReply::Failure(error),
            ..Self::answering(name, credential, "")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared call counter, readable after the backend is registered
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl FactCheckBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_credentials(&self) -> Vec<&str> {
        vec![self.credential.as_str()]
    }

    async fn query(
        &self,
        _request: &CheckRequest,
        _credentials: &Credentials,
    ) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.reply {
            MockReply::Report(raw) => Ok(raw.clone()),
            MockReply::Failure(error) => Err(error.clone()),
        }
    }
}
