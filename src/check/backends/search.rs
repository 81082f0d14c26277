//! Search-then-synthesize backend
//!
//! Runs a web search for the selection, then hands the hits to a chat model
//! as candidate sources. The two calls form one logical backend: when the
//! search fails the synthesis call is never made.

use super::chat::{error_for_status, http_client, ChatBackendConfig, ChatCompletionClient, ChatModel};
use crate::check::prompt;
use crate::check::traits::FactCheckBackend;
use crate::check::types::{BackendError, CheckRequest};
use crate::config::Credentials;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One web search result
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

/// A web search provider
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, api_key: &str) -> Result<Vec<SearchHit>, BackendError>;
}

/// Configuration for the search-then-synthesize backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSynthesisConfig {
    pub name: String,
    /// Serper-compatible search endpoint
    pub search_url: String,
    /// Name of the credential holding the search API key
    pub search_credential: String,
    /// Maximum number of hits passed on to synthesis
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Chat endpoint used for the synthesis step
    pub synthesis: ChatBackendConfig,
}

fn default_max_results() -> usize {
    5
}

impl Default for SearchSynthesisConfig {
    fn default() -> Self {
        Self {
            name: "Web Search".to_string(),
            search_url: "https://google.serper.dev/search".to_string(),
            search_credential: "serper_api_key".to_string(),
            max_results: default_max_results(),
            synthesis: ChatBackendConfig::openai(),
        }
    }
}

/// Serper web search client
pub struct SerperSearch {
    http: reqwest::Client,
    url: String,
    max_results: usize,
}

impl SerperSearch {
    pub fn new(url: impl Into<String>, max_results: usize) -> Result<Self, BackendError> {
        Ok(Self {
            http: http_client()?,
            url: url.into(),
            max_results,
        })
    }
}

#[async_trait]
impl WebSearch for SerperSearch {
    async fn search(&self, query: &str, api_key: &str) -> Result<Vec<SearchHit>, BackendError> {
        let response = self
            .http
            .post(&self.url)
            .header("X-API-KEY", api_key)
            .json(&serde_json::json!({ "q": query, "num": self.max_results }))
            .send()
            .await?;

        let parsed = error_for_status(response).await?.json::<SerperResponse>().await?;
        debug!(hits = parsed.organic.len(), "search results received");
        Ok(parsed.organic.into_iter().take(self.max_results).collect())
    }
}

/// Backend that grounds a chat model in fresh search results
pub struct SearchSynthesisBackend {
    name: String,
    search_credential: String,
    synthesis_credential: String,
    max_results: usize,
    searcher: Arc<dyn WebSearch>,
    model: Arc<dyn ChatModel>,
}

impl SearchSynthesisBackend {
    pub fn from_config(config: &SearchSynthesisConfig) -> Result<Self, BackendError> {
        let searcher = SerperSearch::new(&config.search_url, config.max_results)?;
        let model = ChatCompletionClient::new(&config.synthesis)?;
        Ok(Self::with_parts(
            config,
            Arc::new(searcher),
            Arc::new(model),
        ))
    }

    /// Backend over any search provider and chat model
    pub fn with_parts(
        config: &SearchSynthesisConfig,
        searcher: Arc<dyn WebSearch>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            name: config.name.clone(),
            search_credential: config.search_credential.clone(),
            synthesis_credential: config.synthesis.credential.clone(),
            max_results: config.max_results,
            searcher,
            model,
        }
    }

    fn credential<'a>(&self, credentials: &'a Credentials, name: &str) -> Result<&'a str, BackendError> {
        credentials
            .get(name)
            .ok_or_else(|| BackendError::MissingCredential(name.to_string()))
    }
}

#[async_trait]
impl FactCheckBackend for SearchSynthesisBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_credentials(&self) -> Vec<&str> {
        vec![
            self.search_credential.as_str(),
            self.synthesis_credential.as_str(),
        ]
    }

    async fn query(
        &self,
        request: &CheckRequest,
        credentials: &Credentials,
    ) -> Result<String, BackendError> {
        let search_key = self.credential(credentials, &self.search_credential)?;
        let synthesis_key = self.credential(credentials, &self.synthesis_credential)?;

        let mut hits = self
            .searcher
            .search(request.selection.trim(), search_key)
            .await
            .map_err(|e| BackendError::SearchFailed(e.to_string()))?;
        if hits.is_empty() {
            return Err(BackendError::SearchFailed("no search results".to_string()));
        }
        hits.truncate(self.max_results);

        self.model
            .complete(
                synthesis_key,
                prompt::SYSTEM_PROMPT,
                &prompt::synthesis_prompt(request, &hits),
            )
            .await
    }
}
