//! Common test utilities for crosscheck integration tests
//!
//! Provides scripted backends so the orchestrator can be exercised without
//! network access.

pub mod mock_backend;

pub use mock_backend::MockBackend;
