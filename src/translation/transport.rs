/*!
 * Batch transport: one batch in, one external call, one translation per unit out.
 *
 * Member texts are joined with a fixed separator, sent in a single
 * completion request, and the reply is split back on the same separator.
 * Models are not guaranteed to keep the separators intact, so `split`
 * always returns exactly as many parts as were sent.
 */

use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, Provider};
use super::core::TokenUsageStats;
use super::document::{Batch, TextUnit, TranslatedUnit};
use super::prompts::TranslationPromptBuilder;

/// Separator placed between unit texts inside one request
pub const BATCH_SEPARATOR: &str = "\n---BLOCK_SEPARATOR---\n";

/// Join unit texts into one request payload.
pub fn join(units: &[TextUnit]) -> String {
    units
        .iter()
        .map(|unit| unit.text.as_str())
        .collect::<Vec<_>>()
        .join(BATCH_SEPARATOR)
}

/// Split a translated payload into exactly `expected_count` trimmed parts.
///
/// Missing parts are padded with empty strings. Surplus parts are folded,
/// separators included, into the last slot.
pub fn split(translated: &str, expected_count: usize) -> Vec<String> {
    if expected_count == 0 {
        return Vec::new();
    }

    let parts: Vec<&str> = translated.split(BATCH_SEPARATOR).collect();

    if parts.len() <= expected_count {
        let mut result: Vec<String> = parts.iter().map(|p| p.trim().to_string()).collect();
        result.resize(expected_count, String::new());
        return result;
    }

    let mut result: Vec<String> = parts[..expected_count - 1]
        .iter()
        .map(|p| p.trim().to_string())
        .collect();
    result.push(parts[expected_count - 1..].join(BATCH_SEPARATOR).trim().to_string());
    result
}

/// Sends whole batches through a provider.
#[derive(Debug, Clone)]
pub struct BatchTransport {
    provider: Arc<dyn Provider>,
    prompts: TranslationPromptBuilder,
    usage: Arc<Mutex<TokenUsageStats>>,
}

impl BatchTransport {
    /// Create a transport over a provider with the given prompt builder
    pub fn new(provider: Arc<dyn Provider>, prompts: TranslationPromptBuilder) -> Self {
        let usage = TokenUsageStats::with_provider_info(provider.name().to_string(), String::new());
        Self {
            provider,
            prompts,
            usage: Arc::new(Mutex::new(usage)),
        }
    }

    /// Attach the model name reported in the token usage summary
    pub fn with_model(self, model: &str) -> Self {
        self.usage.lock().model = model.to_string();
        self
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Snapshot of token usage accumulated so far
    pub fn token_usage(&self) -> TokenUsageStats {
        self.usage.lock().clone()
    }

    /// Translate one batch with exactly one provider call.
    ///
    /// The reply is mapped 1:1 onto the batch members in order.
    pub async fn translate(&self, batch: &Batch) -> Result<Vec<TranslatedUnit>, ProviderError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let payload = join(&batch.units);
        let (system_prompt, user_prompt) = self.prompts.build(&payload);

        debug!(
            "Sending batch {} ({} units, {} chars) to {}",
            batch.index,
            batch.len(),
            payload.len(),
            self.provider.name()
        );

        let started = Instant::now();
        let response = self
            .provider
            .complete(CompletionRequest::new(system_prompt, user_prompt))
            .await?;

        {
            let mut usage = self.usage.lock();
            usage.api_duration += started.elapsed();
            usage.add_token_usage(response.prompt_tokens, response.completion_tokens);
        }

        let parts = split(&response.text, batch.len());
        let received = response.text.split(BATCH_SEPARATOR).count();
        if batch.len() > 1 && received != batch.len() {
            warn!(
                "Batch {}: expected {} parts in reply, got {}",
                batch.index,
                batch.len(),
                received
            );
        }

        Ok(batch
            .units
            .iter()
            .cloned()
            .zip(parts)
            .map(|(unit, text)| TranslatedUnit::translated(unit, text))
            .collect())
    }
}
