/*!
 * Common test utilities for the docbatch test suite
 */

use std::path::{Path, PathBuf};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Result;
use tempfile::TempDir;

use docbatch::providers::mock::MockProvider;
use docbatch::translation::retry::RetryPolicy;
use docbatch::translation::{BatchTransport, Scheduler, SchedulerOptions, TextUnit, TranslationCache, TranslationPromptBuilder};

/// Route library logs to the test output; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Units with ids `u0`, `u1`, ... and the given texts
pub fn units(texts: &[&str]) -> Vec<TextUnit> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| TextUnit::new(format!("u{}", i), *text))
        .collect()
}

/// `count` distinct units of roughly `len` bytes each
pub fn sized_units(count: usize, len: usize) -> Vec<TextUnit> {
    (0..count)
        .map(|i| {
            let prefix = format!("unit {} ", i);
            let filler = "x".repeat(len.saturating_sub(prefix.len()));
            TextUnit::new(format!("u{}", i), format!("{}{}", prefix, filler))
        })
        .collect()
}

/// A retry policy with millisecond delays so tests stay fast
pub fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_millis(1), Duration::from_millis(4))
}

/// A transport over a mock provider
pub fn mock_transport(provider: &MockProvider) -> BatchTransport {
    BatchTransport::new(
        Arc::new(provider.clone()),
        TranslationPromptBuilder::new("English", "French"),
    )
}

/// A scheduler over a mock provider with fast retries
pub fn mock_scheduler(
    provider: &MockProvider,
    cache: TranslationCache,
    context_window: i64,
    concurrency: usize,
) -> Scheduler {
    let options = SchedulerOptions {
        context_window,
        concurrency,
        retry_policy: fast_policy(3),
    };
    Scheduler::new(mock_transport(provider), cache, options)
}
