/*!
 * Mock provider implementations for testing.
 *
 * This module provides a scriptable provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds, translating every block
 * - `MockProvider::failing_batches(status)` - Fails multi-block requests only
 * - `MockProvider::failing_on(needle, status)` - Fails requests containing a text
 * - `MockProvider::intermittent(n)` - Fails every nth request
 * - `MockProvider::failing(status)` - Always fails
 *
 * Every clone shares the same counters, so a test can hand one clone to the
 * scheduler and inspect the other afterwards.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, CompletionResponse, Provider};
use crate::translation::transport::BATCH_SEPARATOR;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Succeeds but joins blocks with newlines instead of separators
    DropSeparators,
    /// Fails with `status` whenever the request carries more than one block
    FailBatches { status: u16 },
    /// Fails with `status` whenever the payload contains `needle`
    FailOn { needle: &'static str, status: u16 },
    /// Fails with a 503 on every nth request
    Intermittent { fail_every: usize },
    /// Always fails with `status`
    Failing { status: u16 },
    /// Returns an empty reply
    Empty,
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Requests currently being answered
    in_flight: Arc<AtomicUsize>,
    /// Highest number of simultaneous requests seen
    peak_in_flight: Arc<AtomicUsize>,
    /// Payload of every request, in arrival order
    payloads: Arc<Mutex<Vec<String>>>,
    /// Custom per-block translation (optional)
    custom_response: Option<fn(&str) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            payloads: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a provider whose replies lose the block separators
    pub fn dropping_separators() -> Self {
        Self::new(MockBehavior::DropSeparators)
    }

    /// Create a provider that rejects multi-block requests with `status`
    pub fn failing_batches(status: u16) -> Self {
        Self::new(MockBehavior::FailBatches { status })
    }

    /// Create a provider that rejects any request containing `needle`
    pub fn failing_on(needle: &'static str, status: u16) -> Self {
        Self::new(MockBehavior::FailOn { needle, status })
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors with `status`
    pub fn failing(status: u16) -> Self {
        Self::new(MockBehavior::Failing { status })
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that answers after `delay_ms`
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom per-block translation
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of requests answered at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Payloads received so far
    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().clone()
    }

    /// Default translation of one block
    pub fn translate_block(block: &str) -> String {
        format!("[TRANSLATED] {}", block)
    }

    /// The joined batch text carried at the end of a user prompt
    pub fn payload(request: &CompletionRequest) -> &str {
        request
            .user_prompt
            .split_once("\n\n")
            .map(|(_, payload)| payload)
            .unwrap_or(&request.user_prompt)
    }

    fn translate_payload(&self, payload: &str, separator: &str) -> String {
        let translate = self.custom_response.unwrap_or(Self::translate_block);
        payload
            .split(BATCH_SEPARATOR)
            .map(translate)
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn success(&self, payload: &str, text: String) -> CompletionResponse {
        CompletionResponse {
            prompt_tokens: Some(payload.len() as u64),
            completion_tokens: Some((text.len() / 2) as u64),
            text,
        }
    }

    async fn respond(&self, count: usize, payload: &str) -> Result<CompletionResponse, ProviderError> {
        match self.behavior {
            MockBehavior::Working => {
                Ok(self.success(payload, self.translate_payload(payload, BATCH_SEPARATOR)))
            }

            MockBehavior::DropSeparators => {
                Ok(self.success(payload, self.translate_payload(payload, "\n")))
            }

            MockBehavior::FailBatches { status } => {
                if payload.contains(BATCH_SEPARATOR) {
                    Err(ProviderError::from_status(status, "Simulated batch failure"))
                } else {
                    Ok(self.success(payload, self.translate_payload(payload, BATCH_SEPARATOR)))
                }
            }

            MockBehavior::FailOn { needle, status } => {
                if payload.contains(needle) {
                    Err(ProviderError::from_status(status, format!("Simulated failure on '{}'", needle)))
                } else {
                    Ok(self.success(payload, self.translate_payload(payload, BATCH_SEPARATOR)))
                }
            }

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.success(payload, self.translate_payload(payload, BATCH_SEPARATOR)))
                }
            }

            MockBehavior::Failing { status } => {
                Err(ProviderError::from_status(status, "Simulated provider failure"))
            }

            MockBehavior::Empty => Ok(CompletionResponse {
                text: String::new(),
                prompt_tokens: Some(0),
                completion_tokens: Some(0),
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.success(payload, self.translate_payload(payload, BATCH_SEPARATOR)))
            }
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let payload = Self::payload(&request).to_string();
        self.payloads.lock().push(payload.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = self.respond(count, &payload).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing { status } => {
                Err(ProviderError::from_status(status, "Simulated provider failure"))
            }
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
