/*!
 * Batch translation scheduler.
 *
 * A run goes through these steps in order:
 * 1. answer what it can from the cache
 * 2. pack the remaining units into batches
 * 3. dispatch the batches concurrently through the retry controller
 * 4. store fresh translations in the cache as each batch resolves
 * 5. merge cached and fresh results back into input order
 *
 * The cache is saved when the run ends, whether it succeeded, failed or
 * was cancelled, so finished work survives an interrupted run.
 */

use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app_config::TranslationConfig;
use crate::errors::TranslationError;
use super::batch::Dispatcher;
use super::cache::{CacheLookup, TranslationCache};
use super::concurrency::DEFAULT_CONCURRENCY;
use super::core::{TokenUsage, TokenUsageStats, TranslationService};
use super::document::{TextUnit, TranslatedUnit};
use super::packer::{DEFAULT_CONTEXT_WINDOW, effective_context_window, pack};
use super::progress::{ProgressObserver, ProgressTracker};
use super::retry::{CancelHandle, RetryController, RetryPolicy};
use super::transport::BatchTransport;

/// Knobs of a scheduling run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Character budget per batch; non-positive means the default window
    pub context_window: i64,
    /// Batches in flight at once
    pub concurrency: usize,
    /// Attempt budget and backoff
    pub retry_policy: RetryPolicy,
}

impl SchedulerOptions {
    /// Options for the active provider of `config`
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            context_window: config.get_max_chars_per_request(),
            concurrency: config.optimal_concurrent_requests(),
            retry_policy: RetryPolicy::from_config(&config.common),
        }
    }
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            concurrency: DEFAULT_CONCURRENCY,
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Summary of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleReport {
    /// Units handed to the run
    pub total_units: usize,
    /// Units answered from the cache
    pub cached_units: usize,
    /// Units translated by the provider during this run
    pub translated_units: usize,
    /// Units left with an empty translation
    pub failed_units: usize,
    /// Batches sent for uncached units
    pub batch_count: usize,
    /// Tokens reported by the provider so far
    pub token_usage: TokenUsage,
}

/// Batch translation scheduler
pub struct Scheduler {
    transport: BatchTransport,
    cache: TranslationCache,
    options: SchedulerOptions,
    cancel: CancelHandle,
    observer: Option<ProgressObserver>,
}

impl Scheduler {
    /// Create a scheduler over a transport and a cache
    pub fn new(transport: BatchTransport, cache: TranslationCache, options: SchedulerOptions) -> Self {
        Self {
            transport,
            cache,
            options,
            cancel: CancelHandle::new(),
            observer: None,
        }
    }

    /// Create a scheduler from a translation service and its configuration
    pub fn from_service(service: &TranslationService, cache: TranslationCache) -> Self {
        Self::new(
            service.transport(),
            cache,
            SchedulerOptions::from_config(&service.config.translation),
        )
    }

    /// Report `(completed, total)` unit counts to `observer`
    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Handle that cancels runs of this scheduler.
    ///
    /// Cancellation is permanent: once cancelled, this run and every later
    /// run of the scheduler return `Cancelled` without calling the provider.
    /// Build a new scheduler to translate again.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// The cache this scheduler reads and populates
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Active options
    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Tokens spent by this scheduler's transport so far
    pub fn token_usage(&self) -> TokenUsageStats {
        self.transport.token_usage()
    }

    /// Translate `units`, returning one result per unit in input order.
    ///
    /// Units that could not be translated come back with an empty
    /// translation. An error is returned only when the run cannot finish:
    /// a single-unit batch exhausted its retries, every unit of a degraded
    /// batch failed, or the run was cancelled.
    pub async fn run(&self, units: &[TextUnit]) -> Result<(Vec<TranslatedUnit>, ScheduleReport), TranslationError> {
        let total = units.len();
        if units.is_empty() {
            return Ok((Vec::new(), ScheduleReport::default()));
        }

        let lookup = self.cache.partition(units);
        let cached_units = lookup.cached_count();
        let CacheLookup { slots, pending } = lookup;

        let progress = ProgressTracker::new(cached_units, total, self.observer.clone());
        progress.report();

        let batches = pack(&pending, effective_context_window(Some(self.options.context_window)));
        info!(
            "Translating {} units: {} cached, {} in {} batches (concurrency {})",
            total,
            cached_units,
            pending.len(),
            batches.len(),
            self.options.concurrency
        );

        let controller = RetryController::new(
            Arc::new(self.transport.clone()),
            self.options.retry_policy,
            progress,
            self.cancel.subscribe(),
        );

        let outcome = {
            let controller = &controller;
            let cache = &self.cache;
            Dispatcher::new(self.options.concurrency)
                .dispatch(&batches, move |batch| async move {
                    let translated = controller.run(batch).await?;
                    for unit in translated.iter().filter(|u| !u.is_missing()) {
                        cache.set(unit.text(), &unit.translated_text);
                    }
                    Ok(translated)
                })
                .await
        };

        if let Err(e) = self.cache.save() {
            warn!("Failed to save translation cache: {}", e);
        }

        let translated = match outcome {
            Ok(translated) => translated,
            Err(TranslationError::Cancelled) => {
                warn!("Translation cancelled; finished batches were kept in the cache");
                return Err(TranslationError::Cancelled);
            }
            Err(e) => return Err(e),
        };

        let mut fresh = translated.into_iter();
        let results: Vec<TranslatedUnit> = units
            .iter()
            .zip(slots)
            .map(|(unit, slot)| match slot {
                Some(cached) => cached,
                None => fresh.next().unwrap_or_else(|| TranslatedUnit::missing(unit.clone())),
            })
            .collect();

        let failed_units = results.iter().filter(|u| u.is_missing()).count();
        let report = ScheduleReport {
            total_units: total,
            cached_units,
            translated_units: results.iter().filter(|u| !u.from_cache && !u.is_missing()).count(),
            failed_units,
            batch_count: batches.len(),
            token_usage: self.transport.token_usage().usage(),
        };

        if failed_units > 0 {
            warn!("{} of {} units could not be translated", failed_units, total);
        }
        info!(
            "Translation finished: {} translated, {} cached, {} failed",
            report.translated_units, report.cached_units, report.failed_units
        );

        Ok((results, report))
    }
}
