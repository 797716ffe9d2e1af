//! LLM configuration and provider selection.
//!
//! Read from `llm-config.json` in the data directory; API keys missing from
//! the file fall back to `GROQ_API_KEY`, `OPENAI_API_KEY` and
//! `ANTHROPIC_API_KEY`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{LLMProvider, ResolvedProvider};
use mindful_core::{Error, Result};

pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_TEMPERATURE: f64 = 0.5;
pub const DEFAULT_MAX_TOKENS: usize = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// `auto`, `groq`, `openai` or `anthropic`.
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}
fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}
fn default_max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: default_preferred(),
            groq_api_key: None,
            openai_api_key: None,
            anthropic_api_key: None,
            groq_model: default_groq_model(),
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

fn non_empty(key: Option<String>) -> Option<String> {
    key.filter(|k| !k.trim().is_empty())
}

impl LLMConfig {
    /// Load from `config_path` if it exists, then fill missing keys from env.
    /// A malformed file is reported and ignored.
    pub fn load(config_path: &Path) -> Self {
        let mut config = match std::fs::read_to_string(config_path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Ignoring invalid {}: {}", config_path.display(), e);
                LLMConfig::default()
            }),
            Err(_) => {
                debug!("No LLM config at {}, using environment", config_path.display());
                LLMConfig::default()
            }
        };

        config.groq_api_key =
            non_empty(config.groq_api_key).or_else(|| non_empty(std::env::var("GROQ_API_KEY").ok()));
        config.openai_api_key = non_empty(config.openai_api_key)
            .or_else(|| non_empty(std::env::var("OPENAI_API_KEY").ok()));
        config.anthropic_api_key = non_empty(config.anthropic_api_key)
            .or_else(|| non_empty(std::env::var("ANTHROPIC_API_KEY").ok()));

        config
    }

    /// Pick the provider to call: the explicit preference when it has a
    /// key, otherwise Groq, then OpenAI, then Anthropic.
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        let candidate = |provider: LLMProvider| -> Option<ResolvedProvider> {
            let (key, model) = match provider {
                LLMProvider::Groq => (&self.groq_api_key, &self.groq_model),
                LLMProvider::OpenAI => (&self.openai_api_key, &self.openai_model),
                LLMProvider::Anthropic => (&self.anthropic_api_key, &self.anthropic_model),
            };
            key.as_ref().map(|k| ResolvedProvider {
                provider,
                model: model.clone(),
                api_key: k.clone(),
            })
        };

        match self.preferred_provider.as_str() {
            "auto" => candidate(LLMProvider::Groq)
                .or_else(|| candidate(LLMProvider::OpenAI))
                .or_else(|| candidate(LLMProvider::Anthropic)),
            "groq" => candidate(LLMProvider::Groq),
            "openai" => candidate(LLMProvider::OpenAI),
            "anthropic" => candidate(LLMProvider::Anthropic),
            _ => None,
        }
    }

    /// Like [`resolve_provider`](Self::resolve_provider) but a missing
    /// provider is a configuration error.
    pub fn require_provider(&self) -> Result<ResolvedProvider> {
        self.resolve_provider().ok_or_else(|| {
            Error::Config(format!(
                "No LLM provider configured (preferred: {}). Set GROQ_API_KEY or add a key to llm-config.json",
                self.preferred_provider
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_prefers_groq() {
        let config = LLMConfig {
            groq_api_key: Some("gsk".into()),
            anthropic_api_key: Some("sk-ant".into()),
            ..Default::default()
        };
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::Groq);
        assert_eq!(resolved.model, DEFAULT_GROQ_MODEL);
    }

    #[test]
    fn test_explicit_preference_needs_key() {
        let config = LLMConfig {
            preferred_provider: "anthropic".into(),
            groq_api_key: Some("gsk".into()),
            ..Default::default()
        };
        assert!(config.resolve_provider().is_none());
        assert!(matches!(config.require_provider(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(
            &path,
            r#"{"preferred_provider": "openai", "openai_api_key": "sk-test", "temperature": 0.2}"#,
        )
        .unwrap();

        let config = LLMConfig::load(&path);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::OpenAI);
        assert_eq!(resolved.api_key, "sk-test");
    }

    #[test]
    fn test_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(&path, "{not json").unwrap();
        let config = LLMConfig::load(&path);
        assert_eq!(config.preferred_provider, "auto");
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
    }
}
