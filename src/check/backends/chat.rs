//! Chat-completion backend
//!
//! Speaks the OpenAI chat-completions protocol, which OpenAI and Perplexity
//! (and most self-hosted gateways) accept.

use crate::check::prompt;
use crate::check::traits::FactCheckBackend;
use crate::check::types::{BackendError, CheckRequest};
use crate::config::Credentials;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Longest error body kept in a [`BackendError::Status`]
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Configuration for one chat-completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBackendConfig {
    /// Label used in merged reports
    pub name: String,
    /// API root, without the `/chat/completions` suffix
    pub base_url: String,
    pub model: String,
    /// Name of the credential holding the API key
    pub credential: String,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl ChatBackendConfig {
    pub fn openai() -> Self {
        Self {
            name: "OpenAI".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            credential: "openai_api_key".to_string(),
            temperature: Some(0.2),
        }
    }

    pub fn perplexity() -> Self {
        Self {
            name: "Perplexity".to_string(),
            base_url: "https://api.perplexity.ai".to_string(),
            model: "sonar".to_string(),
            credential: "perplexity_api_key".to_string(),
            temperature: Some(0.2),
        }
    }
}

/// A model that turns a system and user prompt into text
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, api_key: &str, system: &str, user: &str)
        -> Result<String, BackendError>;
}

/// HTTP client for a chat-completions endpoint
pub struct ChatCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
}

impl ChatCompletionClient {
    pub fn new(config: &ChatBackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            http: http_client()?,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, system: &str, user: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });
        if let Some(temperature) = self.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        body
    }
}

#[async_trait]
impl ChatModel for ChatCompletionClient {
    async fn complete(
        &self,
        api_key: &str,
        system: &str,
        user: &str,
    ) -> Result<String, BackendError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.request_body(system, user))
            .send()
            .await?;

        let body = error_for_status(response).await?.json::<serde_json::Value>().await?;
        let content = extract_content(&body)?;
        debug!(endpoint = %self.endpoint, chars = content.len(), "chat completion received");
        Ok(content)
    }
}

/// Shared reqwest client construction
pub(crate) fn http_client() -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .user_agent(concat!("crosscheck/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| BackendError::Http(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-success response into [`BackendError::Status`]
pub(crate) async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Status {
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    })
}

/// Pull `choices[0].message.content` out of a chat-completions response
pub fn extract_content(body: &serde_json::Value) -> Result<String, BackendError> {
    let choices = body
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| BackendError::MissingField("choices".to_string()))?;
    let first = choices
        .first()
        .ok_or_else(|| BackendError::MissingField("choices[0]".to_string()))?;
    let content = first
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| BackendError::MissingField("choices[0].message.content".to_string()))?;

    if content.trim().is_empty() {
        return Err(BackendError::MissingField(
            "choices[0].message.content is empty".to_string(),
        ));
    }
    Ok(content.to_string())
}

/// Backend that asks one chat model for a fact-check report
pub struct ChatBackend {
    name: String,
    credential: String,
    model: Arc<dyn ChatModel>,
}

impl ChatBackend {
    /// Backend talking HTTP to the configured endpoint
    pub fn from_config(config: &ChatBackendConfig) -> Result<Self, BackendError> {
        let client = ChatCompletionClient::new(config)?;
        Ok(Self::with_model(&config.name, &config.credential, Arc::new(client)))
    }

    /// Backend over any [`ChatModel`]
    pub fn with_model(
        name: impl Into<String>,
        credential: impl Into<String>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            name: name.into(),
            credential: credential.into(),
            model,
        }
    }
}

#[async_trait]
impl FactCheckBackend for ChatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_credentials(&self) -> Vec<&str> {
        vec![self.credential.as_str()]
    }

    async fn query(
        &self,
        request: &CheckRequest,
        credentials: &Credentials,
    ) -> Result<String, BackendError> {
        let api_key = credentials
            .get(&self.credential)
            .ok_or_else(|| BackendError::MissingCredential(self.credential.clone()))?;

        self.model
            .complete(api_key, prompt::SYSTEM_PROMPT, &prompt::fact_check_prompt(request))
            .await
    }
}
