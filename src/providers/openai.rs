use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use super::{CompletionRequest, CompletionResponse, Provider, error_message_from_body};

const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Client for OpenAI-compatible chat completions endpoints
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key sent as a bearer token
    api_key: String,
    /// Full chat completions URL
    api_url: String,
    /// Model to request
    model: String,
    /// Sampling temperature
    temperature: f32,
}

/// Chat completions request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// One chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Chat completions response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Generated choices
    #[serde(default)]
    pub choices: Vec<OpenAIChoice>,

    /// Token usage, when reported
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,

    /// Error object some compatible servers return with a 200 status
    #[serde(default)]
    pub error: Option<OpenAIErrorBody>,
}

/// One generated choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    /// The generated message
    pub message: OpenAIMessage,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u64,
    /// Tokens in the completion
    pub completion_tokens: u64,
}

/// Error object embedded in a response body
#[derive(Debug, Deserialize)]
pub struct OpenAIErrorBody {
    /// Error message
    #[serde(default)]
    pub message: String,
}

impl OpenAIRequest {
    /// Create a new chat completions request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Make sure an endpoint points at `/chat/completions`
///
/// An empty endpoint means the public OpenAI API.
pub fn normalize_api_url(endpoint: &str) -> String {
    if endpoint.is_empty() {
        return DEFAULT_CHAT_COMPLETIONS_URL.to_string();
    }

    let trimmed = endpoint.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

impl OpenAI {
    /// Create a new client; `endpoint` may be a base URL or the full completions URL
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl AsRef<str>,
        model: impl Into<String>,
        timeout_secs: u64,
        temperature: f32,
    ) -> Result<Self, ProviderError> {
        let api_url = normalize_api_url(endpoint.as_ref());
        Url::parse(&api_url)
            .map_err(|e| ProviderError::InvalidRequest(format!("Invalid API URL '{}': {}", api_url, e)))?;

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            api_url,
            model: model.into(),
            temperature,
        })
    }

    /// Chat completions URL requests are sent to
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Send a chat completions request
    pub async fn send(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let response = self.client.post(&self.api_url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        debug!("Chat completions response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_message_from_body(&error_text)));
        }

        let body = response.text().await?;
        Self::parse_response(&body)
    }

    /// Parse a successful response body
    pub fn parse_response(body: &str) -> Result<OpenAIResponse, ProviderError> {
        let parsed: OpenAIResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse chat completions response: {}", e)))?;

        if let Some(api_error) = &parsed.error {
            return Err(ProviderError::RequestFailed(format!("API returned error: {}", api_error.message)));
        }
        if parsed.choices.is_empty() {
            return Err(ProviderError::ParseError("API returned no choices".to_string()));
        }
        Ok(parsed)
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = OpenAIRequest::new(&self.model)
            .add_message("system", request.system_prompt)
            .add_message("user", request.user_prompt)
            .temperature(self.temperature);

        let response = self.send(&body).await?;
        let text = response.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(CompletionResponse {
            text,
            prompt_tokens: response.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: response.usage.as_ref().map(|u| u.completion_tokens),
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = OpenAIRequest::new(&self.model)
            .add_message("user", "Hello")
            .max_tokens(5);

        self.send(&request).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
