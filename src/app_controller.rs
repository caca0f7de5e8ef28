use anyhow::{Result, Context};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use indicatif::{ProgressBar, ProgressStyle};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::translation::{ScheduleReport, Scheduler, TranslationCache, TranslationService};

// @module: Application controller for document translation

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

/// What `docbatch cache stats` reports
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSummary {
    /// Cache file, `None` when caching is disabled
    pub path: Option<PathBuf>,
    /// Entries stored in the cache file
    pub entries: usize,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open the cache of the configured language pair and load it from disk.
    ///
    /// A cache file that cannot be loaded is left untouched: the run goes on
    /// with an empty cache that is never saved.
    pub fn open_cache(&self) -> TranslationCache {
        let cache = self.cache_handle();
        if let Err(e) = cache.load() {
            warn!("Ignoring translation cache: {}. Translations of this run will not be cached", e);
            cache.set_path(None);
        }
        cache
    }

    fn cache_handle(&self) -> TranslationCache {
        TranslationCache::new(self.config.cache_path(), self.config.cache.enabled)
            .with_language_pair(&self.config.source_language, &self.config.target_language)
    }

    /// Translate the units of `input_file` and write them to `output_file`,
    /// or next to the input when no output is given
    pub async fn run(&self, input_file: PathBuf, output_file: Option<PathBuf>) -> Result<ScheduleReport> {
        let service = TranslationService::new(self.config.clone())
            .context("Failed to create translation service")?;
        self.run_with_service(service, input_file, output_file).await
    }

    /// Same as `run`, over an already built service
    pub async fn run_with_service(
        &self,
        service: TranslationService,
        input_file: PathBuf,
        output_file: Option<PathBuf>,
    ) -> Result<ScheduleReport> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow::anyhow!("Input file does not exist: {:?}", input_file));
        }
        let units = FileManager::read_units(&input_file)?;
        let output_path = output_file
            .unwrap_or_else(|| FileManager::generate_output_path(&input_file, &self.config.target_language));

        info!("🚀 docbatch: {} - {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model());
        info!("Translating {} units from {:?}", units.len(), input_file);

        let progress_bar = Self::progress_bar(units.len() as u64);
        let pb = progress_bar.clone();
        let scheduler = Scheduler::from_service(&service, self.open_cache())
            .with_observer(Arc::new(move |completed, total| {
                pb.set_length(total as u64);
                pb.set_position(completed as u64);
            }));

        // Ctrl-C stops scheduling new work; the scheduler still saves the cache
        let cancel = scheduler.cancel_handle();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling translation");
                cancel.cancel();
            }
        });

        let outcome = scheduler.run(&units).await;
        interrupt.abort();
        progress_bar.finish_and_clear();

        let (translated, report) = outcome.context("Translation failed")?;
        FileManager::write_output(&output_path, &translated, &report)?;

        if report.token_usage.total_tokens > 0 {
            info!("🔢 {}", scheduler.token_usage().summary());
        }
        let stats = scheduler.cache().stats();
        info!("Cache: {} hits, {} misses ({:.1}% hit rate)",
            stats.hits, stats.misses, stats.hit_rate * 100.0);
        if report.failed_units > 0 {
            warn!("{} units have no translation and were written with an empty text", report.failed_units);
        }
        info!("Success: {} ({})", output_path.display(), Self::format_duration(start_time.elapsed()));

        Ok(report)
    }

    /// Summarize the cache file of the configured language pair
    pub fn cache_summary(&self) -> Result<CacheSummary> {
        let cache = self.cache_handle();
        cache.load().context("Failed to load translation cache")?;
        Ok(CacheSummary { path: cache.path(), entries: cache.len() })
    }

    /// Empty the cache file of the configured language pair, returning how
    /// many entries were removed
    pub fn clear_cache(&self) -> Result<usize> {
        let cache = self.cache_handle();
        if let Err(e) = cache.load() {
            warn!("Cache file was unreadable, overwriting it: {}", e);
        }
        let removed = cache.len();
        cache.clear();
        cache.save().context("Failed to save translation cache")?;
        Ok(removed)
    }

    fn progress_bar(total: u64) -> ProgressBar {
        let progress_bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} units ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");
        progress_bar
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Resolve the config file: an explicit path, or `conf.json` in the working directory
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("conf.json"))
}
