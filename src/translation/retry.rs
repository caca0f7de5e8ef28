/*!
 * Retry and degradation control for a single batch.
 *
 * A batch is attempted up to `max_retries` times with exponential backoff
 * between retryable failures. A batch that still fails is broken up and
 * each member is tried on its own with a fresh budget, so one bad unit
 * cannot sink its neighbours.
 *
 * Transitions per batch:
 *   Attempting(n) -> Succeeded                      on success
 *   Attempting(n) -> Attempting(n + 1)              retryable, n < max_retries
 *   Attempting(n) -> BatchFailed                    retryable at n == max_retries, or non-retryable
 *   BatchFailed   -> error                          single member
 *   BatchFailed   -> DegradingPerUnit               several members
 */

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::watch;

use crate::app_config::TranslationCommonConfig;
use crate::errors::{ErrorClass, ProviderError, TranslationError};
use super::document::{Batch, TranslatedUnit};
use super::progress::ProgressTracker;
use super::transport::BatchTransport;

/// Default number of attempts per batch
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between attempts
pub const BASE_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Upper bound for a single backoff
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Anything that can translate a whole batch in one external call
#[async_trait]
pub trait BatchTranslator: Send + Sync {
    /// Perform exactly one attempt for `batch`
    async fn translate_batch(&self, batch: &Batch) -> Result<Vec<TranslatedUnit>, ProviderError>;
}

#[async_trait]
impl BatchTranslator for BatchTransport {
    async fn translate_batch(&self, batch: &Batch) -> Result<Vec<TranslatedUnit>, ProviderError> {
        self.translate(batch).await
    }
}

/// Attempt budget and backoff schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per batch or unit, the first one included
    pub max_retries: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Cap applied to every delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; a zero attempt budget falls back to the default
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries: if max_retries == 0 { DEFAULT_MAX_RETRIES } else { max_retries },
            base_delay,
            max_delay,
        }
    }

    /// Build the policy from the common translation settings
    pub fn from_config(common: &TranslationCommonConfig) -> Self {
        Self::new(
            common.retry_count,
            Duration::from_millis(common.retry_backoff_ms),
            Duration::from_millis(common.max_backoff_ms),
        )
    }

    /// Backoff after failed attempt number `attempt` (1-based)
    ///
    /// `min(base * 2^(attempt - 1), cap)`
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, BASE_RETRY_DELAY, MAX_RETRY_DELAY)
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Sleep, then attempt again
    RetryAfter(Duration),
    /// Stop attempting at this granularity
    GiveUp,
}

/// Decide the next step after attempt number `attempt` failed with `class`
pub fn next_transition(attempt: u32, class: ErrorClass, policy: &RetryPolicy) -> Transition {
    match class {
        ErrorClass::NonRetryable => Transition::GiveUp,
        ErrorClass::Retryable if attempt < policy.max_retries => {
            Transition::RetryAfter(policy.delay(attempt))
        }
        ErrorClass::Retryable => Transition::GiveUp,
    }
}

/// Attempt counter for one batch, dropped once the batch resolves
#[derive(Debug, Default)]
pub struct RetryContext {
    /// Attempts made so far
    pub attempt: u32,
    /// Error of the most recent attempt
    pub last_error: Option<ProviderError>,
}

impl RetryContext {
    /// Attempts made and the error being retried, for logs
    pub fn summary(&self) -> String {
        match &self.last_error {
            Some(error) => format!("{} attempts, last error: {}", self.attempt, error),
            None => format!("{} attempts", self.attempt),
        }
    }
}

/// Cancels every controller subscribed to it
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Create a handle in the not-cancelled state
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Receiver observing the cancellation flag
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Why an attempt loop stopped without a result
enum Failure {
    Cancelled,
    Exhausted(ProviderError),
}

/// Drives one batch through retries and, if needed, per-unit degradation
pub struct RetryController {
    translator: Arc<dyn BatchTranslator>,
    policy: RetryPolicy,
    progress: ProgressTracker,
    cancel: watch::Receiver<bool>,
}

impl RetryController {
    /// Create a controller
    pub fn new(
        translator: Arc<dyn BatchTranslator>,
        policy: RetryPolicy,
        progress: ProgressTracker,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            translator,
            policy,
            progress,
            cancel,
        }
    }

    /// Active retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Translate `batch`, retrying and degrading as needed.
    ///
    /// Returns one `TranslatedUnit` per member in batch order. Members that
    /// failed during degradation carry an empty translation.
    pub async fn run(&self, batch: &Batch) -> Result<Vec<TranslatedUnit>, TranslationError> {
        match self.attempt_with_retry(batch).await {
            Ok(units) => {
                self.progress.advance(units.len());
                Ok(units)
            }
            Err(Failure::Cancelled) => Err(TranslationError::Cancelled),
            Err(Failure::Exhausted(error)) => match batch.units.as_slice() {
                [only] => Err(TranslationError::UnitFailed {
                    unit_id: only.id.clone(),
                    source: error,
                }),
                _ => {
                    warn!(
                        "Batch {} failed ({}), translating its {} units individually",
                        batch.index,
                        error,
                        batch.len()
                    );
                    self.degrade(batch, error).await
                }
            },
        }
    }

    async fn degrade(&self, batch: &Batch, batch_error: ProviderError) -> Result<Vec<TranslatedUnit>, TranslationError> {
        let mut results = Vec::with_capacity(batch.len());
        let mut failed_ids = Vec::new();

        for (unit, single) in batch.units.iter().zip(batch.singles()) {
            match self.attempt_with_retry(&single).await {
                Ok(units) => {
                    let translated = units
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| TranslatedUnit::missing(unit.clone()));
                    results.push(translated);
                }
                Err(Failure::Cancelled) => return Err(TranslationError::Cancelled),
                Err(Failure::Exhausted(error)) => {
                    warn!("Unit '{}' failed after retries: {}", unit.id, error);
                    failed_ids.push(unit.id.clone());
                    results.push(TranslatedUnit::missing(unit.clone()));
                }
            }
            self.progress.advance(1);
        }

        if failed_ids.len() == batch.len() {
            return Err(TranslationError::AllUnitsFailed {
                failed_ids,
                source: batch_error,
            });
        }

        if !failed_ids.is_empty() {
            warn!(
                "Batch {}: {} of {} units left untranslated",
                batch.index,
                failed_ids.len(),
                batch.len()
            );
        }
        Ok(results)
    }

    async fn attempt_with_retry(&self, batch: &Batch) -> Result<Vec<TranslatedUnit>, Failure> {
        let mut context = RetryContext::default();

        loop {
            if self.is_cancelled() {
                if context.attempt > 0 {
                    info!("Batch {} cancelled after {}", batch.index, context.summary());
                }
                return Err(Failure::Cancelled);
            }

            context.attempt += 1;
            debug!(
                "Batch {} attempt {}/{} ({} units)",
                batch.index,
                context.attempt,
                self.policy.max_retries,
                batch.len()
            );

            let error = match self.translator.translate_batch(batch).await {
                Ok(units) => return Ok(units),
                Err(error) => error,
            };

            match next_transition(context.attempt, error.class(), &self.policy) {
                Transition::RetryAfter(delay) => {
                    warn!(
                        "Batch {} attempt {} failed: {}. Retrying in {:?}",
                        batch.index, context.attempt, error, delay
                    );
                    context.last_error = Some(error);
                    if let Err(cancelled) = self.backoff(delay).await {
                        info!("Batch {} cancelled during backoff after {}", batch.index, context.summary());
                        return Err(cancelled);
                    }
                }
                Transition::GiveUp => {
                    debug!(
                        "Batch {} giving up after {} attempts ({:?})",
                        batch.index, context.attempt, error.class()
                    );
                    return Err(Failure::Exhausted(error));
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Sleep for `delay` unless cancellation arrives first
    async fn backoff(&self, delay: Duration) -> Result<(), Failure> {
        let mut cancel = self.cancel.clone();
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        let cancelled = tokio::select! {
            _ = &mut sleep => return Ok(()),
            changed = cancel.wait_for(|cancelled| *cancelled) => changed.is_ok(),
        };

        if cancelled {
            return Err(Failure::Cancelled);
        }
        // Sender gone: nobody can cancel any more
        sleep.await;
        Ok(())
    }
}
