//! Completion clients for external LLM providers.
//!
//! OpenAI and Groq share the chat-completions format. Anthropic uses the
//! Messages API. Each call sends the whole prompt as one user message and
//! returns the reply text.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::LLMConfig;
use crate::types::{ChatMessage, LLMProvider, ResolvedProvider};
use mindful_core::{Error, Result};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A text-in, text-out language model.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// `provider/model`, for logs.
    fn describe(&self) -> String;
}

/// HTTP client bound to one provider and model.
pub struct ProviderClient {
    client: Client,
    resolved: ResolvedProvider,
    temperature: f64,
    max_tokens: usize,
}

impl ProviderClient {
    pub fn new(resolved: ResolvedProvider, temperature: f64, max_tokens: usize) -> Self {
        Self {
            client: Client::new(),
            resolved,
            temperature,
            max_tokens,
        }
    }

    pub fn from_config(config: &LLMConfig) -> Result<Self> {
        let resolved = config.require_provider()?;
        Ok(Self::new(resolved, config.temperature, config.max_tokens))
    }

    pub fn provider(&self) -> LLMProvider {
        self.resolved.provider
    }

    async fn post(&self, request: reqwest::RequestBuilder, body: Value) -> Result<Value> {
        let response = request
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("{} returned {}: {}", self.resolved.provider, status, text);
            return Err(Error::Llm(format!("API error {}: {}", status, text)));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::Llm(format!("Invalid response body: {}", e)))
    }

    async fn complete_openai_compat(&self, url: &str, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.resolved.model,
            "messages": [ChatMessage::user(prompt)],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        let request = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.resolved.api_key));
        let reply = self.post(request, body).await?;
        openai_reply_text(&reply)
    }

    async fn complete_anthropic(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.resolved.model,
            "messages": [ChatMessage::user(prompt)],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        let request = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.resolved.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);
        let reply = self.post(request, body).await?;
        anthropic_reply_text(&reply)
    }
}

#[async_trait]
impl CompletionModel for ProviderClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(
            "Completion via {} ({} prompt chars)",
            self.describe(),
            prompt.len()
        );
        match self.resolved.provider {
            LLMProvider::Groq => self.complete_openai_compat(GROQ_URL, prompt).await,
            LLMProvider::OpenAI => self.complete_openai_compat(OPENAI_URL, prompt).await,
            LLMProvider::Anthropic => self.complete_anthropic(prompt).await,
        }
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.resolved.provider, self.resolved.model)
    }
}

/// `choices[0].message.content` of a chat-completions reply.
fn openai_reply_text(reply: &Value) -> Result<String> {
    reply["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Llm("Completion reply has no message content".into()))
}

/// Concatenated `text` blocks of a Messages API reply.
fn anthropic_reply_text(reply: &Value) -> Result<String> {
    if reply["type"] == "error" {
        let msg = reply["error"]["message"].as_str().unwrap_or("Unknown error");
        return Err(Error::Llm(msg.to_string()));
    }
    let blocks = reply["content"]
        .as_array()
        .ok_or_else(|| Error::Llm("Completion reply has no content blocks".into()))?;
    Ok(blocks
        .iter()
        .filter(|b| b["type"] == "text")
        .filter_map(|b| b["text"].as_str())
        .collect::<Vec<_>>()
        .join(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_reply_text() {
        let reply = json!({"choices": [{"message": {"role": "assistant", "content": "Hello there"}}]});
        assert_eq!(openai_reply_text(&reply).unwrap(), "Hello there");
        assert!(matches!(openai_reply_text(&json!({"choices": []})), Err(Error::Llm(_))));
    }

    #[test]
    fn test_anthropic_reply_text() {
        let reply = json!({
            "type": "message",
            "content": [{"type": "text", "text": "Take "}, {"type": "text", "text": "a breath."}]
        });
        assert_eq!(anthropic_reply_text(&reply).unwrap(), "Take a breath.");

        let err = json!({"type": "error", "error": {"message": "overloaded"}});
        assert!(matches!(anthropic_reply_text(&err), Err(Error::Llm(m)) if m == "overloaded"));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = LLMConfig {
            preferred_provider: "groq".into(),
            ..Default::default()
        };
        assert!(matches!(ProviderClient::from_config(&config), Err(Error::Config(_))));

        let config = LLMConfig {
            groq_api_key: Some("gsk".into()),
            ..Default::default()
        };
        let client = ProviderClient::from_config(&config).unwrap();
        assert_eq!(client.provider(), LLMProvider::Groq);
        assert_eq!(client.describe(), "groq/llama-3.3-70b-versatile");
    }
}
