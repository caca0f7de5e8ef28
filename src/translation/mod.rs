/*!
 * Batch translation of document text units using AI providers.
 *
 * This module contains the scheduler and everything it is built from.
 * It is split into several submodules:
 *
 * - `document`: Text units, translated units and batches
 * - `packer`: Grouping of units into size-bounded batches
 * - `transport`: Joining and splitting batch payloads around one provider call
 * - `batch`: Concurrent dispatch of batches
 * - `retry`: Retries, backoff and per-unit degradation
 * - `cache`: Persistent hash-keyed translation cache
 * - `scheduler`: The run that ties all of the above together
 * - `core`: Service construction from configuration and token usage
 * - `prompts`: Prompt templates and builders for translation
 */

// Re-export main types for easier usage
pub use self::batch::Dispatcher;
pub use self::cache::{CacheLookup, CacheStats, TranslationCache};
pub use self::core::{TokenUsageStats, TranslationService};
pub use self::retry::{CancelHandle, RetryPolicy};
pub use self::scheduler::{ScheduleReport, Scheduler, SchedulerOptions};
pub use self::transport::BatchTransport;

// Re-export document model types
pub use self::document::{Batch, TextUnit, TranslatedUnit, UnitFile};

// Re-export prompt types
pub use self::prompts::{PromptTemplate, TranslationPromptBuilder};

// Submodules
pub mod batch;
pub mod cache;
pub mod concurrency;
pub mod core;
pub mod document;
pub mod packer;
pub mod progress;
pub mod prompts;
pub mod retry;
pub mod scheduler;
pub mod transport;
