/*!
 * Provider-specific scheduling defaults.
 *
 * Each provider gets a profile with the batch parallelism, context window
 * and request timeout used when the configuration leaves them unset or
 * sets them to a non-positive value.
 */

use crate::app_config::TranslationProvider;
use super::packer::DEFAULT_CONTEXT_WINDOW;

/// Default number of batches in flight
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Provider-specific profile with tuned defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Batches in flight at once
    pub concurrency: usize,
    /// Context window in characters
    pub context_window: i64,
    /// Timeout for a single request in seconds
    pub timeout_secs: u64,
}

impl ProviderProfile {
    /// Get the profile for a given provider
    pub fn for_provider(provider: &TranslationProvider) -> Self {
        match provider {
            TranslationProvider::OpenAI => Self {
                concurrency: DEFAULT_CONCURRENCY,
                context_window: DEFAULT_CONTEXT_WINDOW,
                timeout_secs: 180,
            },
            TranslationProvider::Anthropic => Self {
                // Lower rate limits but a larger context
                concurrency: DEFAULT_CONCURRENCY,
                context_window: 8000,
                timeout_secs: 180,
            },
            TranslationProvider::Ollama => Self {
                // Local models are slow and small
                concurrency: 2,
                context_window: 2000,
                timeout_secs: 300,
            },
            TranslationProvider::LMStudio => Self {
                concurrency: 2,
                context_window: 2000,
                timeout_secs: 300,
            },
        }
    }

    /// Get effective concurrency, respecting a positive user override
    pub fn effective_concurrency(&self, user_override: Option<usize>) -> usize {
        match user_override {
            Some(value) if value > 0 => value,
            _ => self.concurrency,
        }
    }

    /// Get effective context window, respecting a positive user override
    pub fn effective_context_window(&self, user_override: Option<i64>) -> i64 {
        match user_override {
            Some(value) if value > 0 => value,
            _ => self.context_window,
        }
    }
}
