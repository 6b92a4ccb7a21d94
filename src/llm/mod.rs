pub mod anthropic;
pub mod models;
pub mod ollama;
pub mod openai;

use anthropic::AnthropicProvider;
use ollama::OllamaProvider;
use openai::OpenAiProvider;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::LlmConfig;
use models::{ChatOptions, ChatResponse, Message};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("Invalid Response: {0}")]
    InvalidResponse(String),
    #[error("Rate Limited")]
    RateLimited,
    #[error("Timed out after {0}s")]
    Timeout(u64),
    #[error("No LLM provider configured (tried: {0})")]
    NotConfigured(String),
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError>;

    /// Single-turn completion: one system prompt, one user prompt, raw text back.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let options = ChatOptions {
            system_prompt: Some(system_prompt.to_string()),
            ..Default::default()
        };
        let response = self.chat(&[Message::user(user_prompt)], options).await?;
        Ok(response.content)
    }
}

/// Wraps the selected provider: fills in configured sampling defaults and
/// bounds every call with a timeout.
pub struct TimeoutProvider {
    inner: Arc<dyn LlmProvider>,
    timeout: Duration,
    defaults: ChatOptions,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, timeout: Duration, defaults: ChatOptions) -> Self {
        Self { inner, timeout, defaults }
    }
}

#[async_trait]
impl LlmProvider for TimeoutProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        let options = ChatOptions {
            model: options.model.or_else(|| self.defaults.model.clone()),
            temperature: options.temperature.or(self.defaults.temperature),
            max_tokens: options.max_tokens.or(self.defaults.max_tokens),
            system_prompt: options.system_prompt,
        };

        match tokio::time::timeout(self.timeout, self.inner.chat(messages, options)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} call exceeded {:?}", self.inner.name(), self.timeout);
                Err(LlmError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

/// Resolves the provider once at startup from the configured preference order.
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn from_config(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
        let provider = Self::select(config)?;
        info!("Using LLM provider '{}'", provider.name());

        let defaults = ChatOptions {
            model: None,
            temperature: Some(config.temperature),
            max_tokens: Some(config.max_tokens),
            system_prompt: None,
        };

        Ok(Arc::new(TimeoutProvider::new(
            provider,
            Duration::from_secs(config.timeout_secs),
            defaults,
        )))
    }

    fn select(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
        for name in &config.preference {
            match name.as_str() {
                "anthropic" => {
                    if let Some(cfg) = config.anthropic.as_ref().filter(|c| !c.api_key.is_empty()) {
                        return Ok(Arc::new(AnthropicProvider::new(
                            cfg.api_key.clone(),
                            cfg.api_base.clone(),
                            cfg.default_model.clone(),
                        )));
                    }
                }
                "openai" => {
                    if let Some(cfg) = config.openai.as_ref().filter(|c| !c.api_key.is_empty()) {
                        return Ok(Arc::new(OpenAiProvider::new(
                            cfg.api_key.clone(),
                            cfg.api_base.clone(),
                            cfg.default_model.clone(),
                        )));
                    }
                }
                "ollama" => {
                    if let Some(cfg) = config.ollama.as_ref().filter(|c| !c.base_url.is_empty()) {
                        return Ok(Arc::new(OllamaProvider::new(
                            cfg.base_url.clone(),
                            cfg.default_model.clone(),
                        )));
                    }
                }
                other => warn!("Unknown provider '{}' in llm.preference, skipping", other),
            }
        }

        Err(LlmError::NotConfigured(config.preference.join(", ")))
    }
}
