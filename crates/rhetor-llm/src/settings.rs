//! Provider selection and settings
//!
//! Settings are plain data handed in by the embedding application; the
//! credential is one of the fields, never looked up here.

use crate::ollama::{self, OllamaProvider};
use crate::openai::{self, OpenAiProvider};
use crate::LlmError;
use rhetor_domain::{CompletionPrompt, CompletionProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which completion backend to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions
    #[default]
    OpenAi,
    /// Local Ollama generate API
    Ollama,
}

/// Settings for building a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Backend kind
    #[serde(default)]
    pub kind: ProviderKind,

    /// Endpoint override; each kind has its own default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Reply token budget
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    openai::DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: None,
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl ProviderSettings {
    /// Endpoint actually used for this kind
    pub fn endpoint(&self) -> &str {
        match (&self.base_url, self.kind) {
            (Some(url), _) => url,
            (None, ProviderKind::OpenAi) => openai::DEFAULT_BASE_URL,
            (None, ProviderKind::Ollama) => ollama::DEFAULT_ENDPOINT,
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.kind == ProviderKind::OpenAi
            && self.base_url.is_none()
            && self.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err("api_key is required for the hosted OpenAI endpoint".to_string());
        }
        Ok(())
    }

    /// Build the configured provider
    pub fn build(&self) -> Result<ConfiguredProvider, LlmError> {
        let timeout = Duration::from_secs(self.timeout_secs);
        let provider = match self.kind {
            ProviderKind::OpenAi => ConfiguredProvider::OpenAi(
                OpenAiProvider::new(self.endpoint(), &self.model, self.api_key.clone(), timeout)?
                    .with_temperature(self.temperature)
                    .with_max_tokens(self.max_tokens),
            ),
            ProviderKind::Ollama => ConfiguredProvider::Ollama(OllamaProvider::with_timeout(
                self.endpoint(),
                &self.model,
                timeout,
            )?),
        };
        Ok(provider)
    }
}

/// A provider chosen at runtime from settings
pub enum ConfiguredProvider {
    /// OpenAI-compatible backend
    OpenAi(OpenAiProvider),
    /// Ollama backend
    Ollama(OllamaProvider),
}

impl CompletionProvider for ConfiguredProvider {
    type Error = LlmError;

    fn complete(&self, prompt: &CompletionPrompt) -> Result<String, Self::Error> {
        match self {
            ConfiguredProvider::OpenAi(p) => p.complete(prompt),
            ConfiguredProvider::Ollama(p) => p.complete(prompt),
        }
    }

    fn model_name(&self) -> &str {
        match self {
            ConfiguredProvider::OpenAi(p) => p.model_name(),
            ConfiguredProvider::Ollama(p) => p.model_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let mut settings = ProviderSettings::default();
        assert_eq!(settings.endpoint(), openai::DEFAULT_BASE_URL);

        settings.kind = ProviderKind::Ollama;
        assert_eq!(settings.endpoint(), ollama::DEFAULT_ENDPOINT);

        settings.base_url = Some("http://gpu-box:11434".to_string());
        assert_eq!(settings.endpoint(), "http://gpu-box:11434");
    }

    #[test]
    fn test_hosted_openai_requires_key() {
        let mut settings = ProviderSettings::default();
        assert!(settings.validate().is_err());

        settings.api_key = Some("sk-test".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_local_endpoints_do_not_require_key() {
        let settings = ProviderSettings {
            kind: ProviderKind::Ollama,
            model: "llama3".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_build_reports_model() {
        let settings = ProviderSettings {
            kind: ProviderKind::Ollama,
            model: "llama3".to_string(),
            ..Default::default()
        };
        let provider = settings.build().unwrap();
        assert_eq!(provider.model_name(), "llama3");
        assert!(matches!(provider, ConfiguredProvider::Ollama(_)));
    }
}
