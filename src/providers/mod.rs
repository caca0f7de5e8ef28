/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for various LLM providers:
 * - OpenAI: OpenAI-compatible chat completions endpoints
 * - Anthropic: Anthropic messages API
 * - Ollama: Local LLM server
 * - Mock: Scriptable in-process provider for tests
 *
 * A provider performs exactly one external call per `complete` and never
 * retries on its own; retry policy lives in `translation::retry`. Every
 * failure leaves a provider as a classified `ProviderError`.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One external translation call: a system prompt and a user prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Instructions for the model
    pub system_prompt: String,

    /// The text to translate, wrapped in the user prompt
    pub user_prompt: String,
}

impl CompletionRequest {
    /// Create a new completion request
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
        }
    }
}

/// Text returned by a provider together with reported token usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Generated text
    pub text: String,

    /// Prompt tokens, when the provider reports them
    pub prompt_tokens: Option<u64>,

    /// Completion tokens, when the provider reports them
    pub completion_tokens: Option<u64>,
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the batch transport.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The prompts to send
    ///
    /// # Returns
    /// * `Result<CompletionResponse, ProviderError>` - The response from the provider or a classified error
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Short provider name used in logs
    fn name(&self) -> &str;
}

/// Pull a human readable message out of an error body.
///
/// OpenAI-compatible and Anthropic APIs both nest it under `error.message`;
/// Ollama uses a top-level `error` string. Falls back to the raw body.
pub(crate) fn error_message_from_body(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return message.to_string();
        }
        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            return message.to_string();
        }
    }
    body.trim().to_string()
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
