//! Built-in fact-check backends
//!
//! - **ChatBackend**: one chat-completions call (OpenAI, Perplexity, gateways)
//! - **SearchSynthesisBackend**: web search, then a chat call grounded in the hits

mod chat;
mod search;

pub use chat::{extract_content, ChatBackend, ChatBackendConfig, ChatCompletionClient, ChatModel};
pub use search::{
    SearchHit, SearchSynthesisBackend, SearchSynthesisConfig, SerperSearch, WebSearch,
};

use super::traits::BackendRegistry;
use super::types::BackendError;
use crate::config::BackendSpec;

/// Build a registry holding one backend per config entry, in order
pub fn registry_from_specs(specs: &[BackendSpec]) -> Result<BackendRegistry, BackendError> {
    let mut registry = BackendRegistry::new();
    for spec in specs {
        match spec {
            BackendSpec::Chat(config) => registry.register(ChatBackend::from_config(config)?),
            BackendSpec::SearchSynthesis(config) => {
                registry.register(SearchSynthesisBackend::from_config(config)?)
            }
        }
    }
    Ok(registry)
}
