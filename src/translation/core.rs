/*!
 * Core translation service implementation.
 *
 * This module contains the TranslationService, which turns the application
 * configuration into a concrete provider, a prompt builder and a batch
 * transport, and the token usage statistics collected while translating.
 */

use anyhow::{Result, anyhow};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::{Config, TranslationProvider};
use crate::providers::Provider;
use crate::providers::anthropic::Anthropic;
use crate::providers::ollama::Ollama;
use crate::providers::openai::OpenAI;
use super::prompts::{PromptTemplate, TranslationPromptBuilder};
use super::retry::RetryPolicy;
use super::transport::BatchTransport;

/// Token usage statistics for tracking API consumption
#[derive(Debug, Clone)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenUsageStats {
    /// Create a new empty token usage stats instance
    pub fn new() -> Self {
        Self::with_provider_info(String::new(), String::new())
    }

    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            provider,
            model,
        }
    }

    /// Add token usage numbers reported by a provider
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>) {
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        // Use the API duration for rate calculation, with fallback to elapsed time
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Serializable snapshot of the counters
    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            total_tokens: self.total_tokens,
            api_duration_ms: self.api_duration.as_millis() as u64,
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        let elapsed_minutes = self.start_time.elapsed().as_secs_f64() / 60.0;
        let api_minutes = self.api_duration.as_secs_f64() / 60.0;

        format!(
            "Token Usage Summary:\n\
             Provider: {}\n\
             Model: {}\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             Elapsed time: {:.2} minutes\n\
             API request time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.provider,
            self.model,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            elapsed_minutes,
            api_minutes,
            self.tokens_per_minute()
        )
    }
}

/// Token counters as written into a run report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub api_duration_ms: u64,
}

/// Main translation service: provider plus prompts, built from configuration
#[derive(Debug, Clone)]
pub struct TranslationService {
    /// Provider client
    provider: Arc<dyn Provider>,

    /// Configuration the service was built from
    pub config: Config,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let provider = create_provider(&config)?;
        Ok(Self { provider, config })
    }

    /// Create a service around an already built provider
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Self {
        Self { provider, config }
    }

    /// The provider client
    pub fn provider(&self) -> Arc<dyn Provider> {
        self.provider.clone()
    }

    /// Prompt builder for the configured languages and system prompt
    pub fn prompt_builder(&self) -> TranslationPromptBuilder {
        let builder = TranslationPromptBuilder::new(&self.config.source_language, &self.config.target_language);
        let template = &self.config.translation.common.system_prompt;
        if template.trim().is_empty() {
            builder
        } else {
            builder.with_template(PromptTemplate::new(template))
        }
    }

    /// Batch transport over this service's provider
    pub fn transport(&self) -> BatchTransport {
        BatchTransport::new(self.provider.clone(), self.prompt_builder())
            .with_model(&self.config.translation.get_model())
    }

    /// Retry policy from the common settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config.translation.common)
    }

    /// Test the connection to the translation provider
    pub async fn test_connection(&self) -> Result<()> {
        info!(
            "Testing connection to {} with model {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );
        self.provider
            .test_connection()
            .await
            .map_err(|e| anyhow!("Connection test failed for {}: {}", self.provider.name(), e))
    }
}

/// Build the provider client selected in the configuration
pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    let translation = &config.translation;
    let endpoint = translation.get_endpoint();
    let model = translation.get_model();
    let timeout_secs = translation.get_timeout_secs();
    let temperature = translation.common.temperature;

    let provider: Arc<dyn Provider> = match translation.provider {
        TranslationProvider::OpenAI => Arc::new(OpenAI::new(
            translation.get_api_key(),
            endpoint,
            model,
            timeout_secs,
            temperature,
        )?),
        TranslationProvider::LMStudio => {
            // LM Studio often doesn't require an API key; use a default if empty
            let api_key = {
                let k = translation.get_api_key();
                if k.is_empty() { "lm-studio".to_string() } else { k }
            };
            Arc::new(OpenAI::new(api_key, endpoint, model, timeout_secs, temperature)?)
        }
        TranslationProvider::Anthropic => Arc::new(Anthropic::new(
            translation.get_api_key(),
            endpoint,
            model,
            timeout_secs,
            temperature,
        )),
        TranslationProvider::Ollama => Arc::new(Ollama::new(endpoint, model, timeout_secs, temperature)?),
    };

    Ok(provider)
}
