//! Chat-model collaborator.
//!
//! Defines the [`ChatModel`] trait the chat pipeline talks to, plus two
//! implementations:
//! - **[`DisabledModel`]**: fails every call; used when `llm.provider = "disabled"`.
//! - **[`AnthropicModel`]**: calls the Anthropic Messages API once per turn.
//!
//! There is no retry: a failed call surfaces to the user, who can simply ask
//! again.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::LlmConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Older clients send `model` for assistant turns.
    #[serde(alias = "model")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Everything sent to the model for one turn.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    /// Prior turns followed by the current user message.
    pub messages: Vec<ChatTurn>,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    /// Produce the assistant reply for `request`.
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// Build the configured model.
pub fn create_model(config: &LlmConfig) -> Result<Arc<dyn ChatModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledModel)),
        "anthropic" => Ok(Arc::new(AnthropicModel::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}

// ============ Disabled ============

pub struct DisabledModel;

#[async_trait]
impl ChatModel for DisabledModel {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _request: &ChatRequest) -> Result<String> {
        bail!("LLM provider is disabled")
    }
}

// ============ Anthropic ============

pub struct AnthropicModel {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: String,
}

impl AnthropicModel {
    /// Create the client. Fails when the API key variable is not set.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    fn request_body(&self, request: &ChatRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": request.system,
            "messages": request.messages,
        })
    }
}

#[async_trait]
impl ChatModel for AnthropicModel {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        debug!(model = %self.config.model, turns = request.messages.len(), "Calling Anthropic");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&self.request_body(request))
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Anthropic API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_anthropic_response(&json)
    }
}

/// Concatenate the text blocks of a Messages API response.
fn parse_anthropic_response(json: &serde_json::Value) -> Result<String> {
    let blocks = json
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Anthropic response: missing content"))?;

    let text: String = blocks
        .iter()
        .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        bail!("Invalid Anthropic response: no text content");
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_role_is_an_assistant_alias() {
        let turn: ChatTurn = serde_json::from_str(r#"{"role": "model", "content": "Merhaba"}"#).unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(
            serde_json::to_value(&turn).unwrap()["role"],
            serde_json::json!("assistant")
        );
    }

    #[test]
    fn parses_text_blocks() {
        let json = serde_json::json!({
            "content": [
                {"type": "text", "text": "Merhaba, "},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "size nasıl yardımcı olabilirim?"}
            ]
        });
        assert_eq!(
            parse_anthropic_response(&json).unwrap(),
            "Merhaba, size nasıl yardımcı olabilirim?"
        );
    }

    #[test]
    fn rejects_response_without_text() {
        let json = serde_json::json!({"content": []});
        assert!(parse_anthropic_response(&json).is_err());
        assert!(parse_anthropic_response(&serde_json::json!({})).is_err());
    }

    #[tokio::test]
    async fn disabled_model_always_fails() {
        let request = ChatRequest {
            system: String::new(),
            messages: vec![ChatTurn::user("selam")],
        };
        assert!(DisabledModel.complete(&request).await.is_err());
    }

    #[test]
    fn request_body_carries_settings() {
        let config = LlmConfig::default();
        let model = AnthropicModel {
            client: reqwest::Client::new(),
            config: config.clone(),
            api_key: "test".to_string(),
        };
        let body = model.request_body(&ChatRequest {
            system: "sistem".to_string(),
            messages: vec![ChatTurn::user("selam")],
        });
        assert_eq!(body["model"], "claude-3-haiku-20240307");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["system"], "sistem");
        assert_eq!(body["messages"][0]["role"], "user");
    }
}
