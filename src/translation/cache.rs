/*!
 * Translation caching functionality.
 *
 * This module provides a persistent, content-addressed cache so text that
 * was translated once is never sent to a provider again:
 * - entries are keyed by the SHA-256 hex digest of the source text
 * - the cache file is JSON, written atomically through a temporary file
 * - handles are cheap clones over shared state, safe to use from many tasks
 * - a cache tagged with a language pair refuses files written for another pair
 */

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::CacheError;
use super::document::{TextUnit, TranslatedUnit};

/// Version tag written into the cache file
pub const CACHE_FILE_VERSION: &str = "1.0";

/// One cached translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// SHA-256 hex digest of `original`
    pub hash: String,

    /// Source text
    pub original: String,

    /// Translated text
    pub translation: String,

    /// When the entry was stored
    pub created_at: DateTime<Utc>,
}

/// On-disk cache document
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language_pair: Option<String>,
    entries: Vec<CacheEntry>,
}

/// Hit/miss counters since creation or the last clear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups that found nothing
    pub misses: usize,
    /// hits / (hits + misses), 0 when nothing was looked up
    pub hit_rate: f64,
}

/// Translation cache for storing and retrieving translations
#[derive(Debug, Clone)]
pub struct TranslationCache {
    /// Entries keyed by source text hash
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,

    /// Backing file, `None` for a memory-only cache
    path: Arc<RwLock<Option<PathBuf>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Whether caching is enabled
    enabled: bool,

    /// Language pair the entries translate between, e.g. `english->french`
    language_pair: Option<String>,
}

/// Cache lookup of a whole document
#[derive(Debug, Default)]
pub struct CacheLookup {
    /// One slot per input unit, filled where the cache answered
    pub slots: Vec<Option<TranslatedUnit>>,
    /// Units the cache could not answer, in input order
    pub pending: Vec<TextUnit>,
}

impl CacheLookup {
    /// Number of units answered from the cache
    pub fn cached_count(&self) -> usize {
        self.slots.len() - self.pending.len()
    }
}

impl TranslationCache {
    /// Create a new translation cache backed by `path`
    pub fn new(path: Option<PathBuf>, enabled: bool) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            path: Arc::new(RwLock::new(path)),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            enabled,
            language_pair: None,
        }
    }

    /// Tag the cache with the language pair its translations belong to
    pub fn with_language_pair(mut self, source_language: &str, target_language: &str) -> Self {
        self.language_pair = Some(format!(
            "{}->{}",
            source_language.trim().to_lowercase(),
            target_language.trim().to_lowercase()
        ));
        self
    }

    /// Language pair tag, if any
    pub fn language_pair(&self) -> Option<&str> {
        self.language_pair.as_deref()
    }

    /// Create an enabled cache that never touches the filesystem
    pub fn in_memory() -> Self {
        Self::new(None, true)
    }

    /// Compute the cache key of a source text
    pub fn compute_hash(text: &str) -> String {
        format!("{:x}", Sha256::digest(text.as_bytes()))
    }

    /// Get a translation from the cache
    pub fn get(&self, text: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let hash = Self::compute_hash(text);
        let found = self.entries.read().get(&hash).map(|entry| entry.translation.clone());
        self.record_lookup(found.is_some());

        if found.is_some() {
            debug!("Cache hit for '{}'", truncate_text(text, 30));
        }
        found
    }

    /// Store a translation in the cache, replacing any previous one
    pub fn set(&self, text: &str, translation: &str) {
        if !self.enabled {
            return;
        }

        let entry = CacheEntry {
            hash: Self::compute_hash(text),
            original: text.to_string(),
            translation: translation.to_string(),
            created_at: Utc::now(),
        };
        self.entries.write().insert(entry.hash.clone(), entry);
    }

    /// Look up every unit under one read lock, keeping input positions
    pub fn lookup_many(&self, units: &[TextUnit]) -> Vec<Option<String>> {
        if !self.enabled {
            return vec![None; units.len()];
        }

        let found: Vec<Option<String>> = {
            let entries = self.entries.read();
            units
                .iter()
                .map(|unit| {
                    entries
                        .get(&Self::compute_hash(&unit.text))
                        .map(|entry| entry.translation.clone())
                })
                .collect()
        };

        let hit_count = found.iter().filter(|f| f.is_some()).count();
        *self.hits.write() += hit_count;
        *self.misses.write() += found.len() - hit_count;
        found
    }

    /// Answer what the cache can, keeping a slot per input position
    pub fn partition(&self, units: &[TextUnit]) -> CacheLookup {
        let mut lookup = CacheLookup {
            slots: Vec::with_capacity(units.len()),
            pending: Vec::new(),
        };

        for (unit, found) in units.iter().zip(self.lookup_many(units)) {
            match found {
                Some(translation) => lookup.slots.push(Some(TranslatedUnit::cached(unit.clone(), translation))),
                None => {
                    lookup.slots.push(None);
                    lookup.pending.push(unit.clone());
                }
            }
        }
        lookup
    }

    /// Partition units into cached translations and units still to translate
    ///
    /// Both halves keep the input order.
    pub fn filter_cached(&self, units: &[TextUnit]) -> (Vec<TranslatedUnit>, Vec<TextUnit>) {
        let lookup = self.partition(units);
        (lookup.slots.into_iter().flatten().collect(), lookup.pending)
    }

    /// Replace the in-memory entries with the contents of the cache file
    ///
    /// A missing path or a missing file leaves the cache empty. A file with
    /// another format version, or tagged with another language pair, is an
    /// error and leaves the entries untouched.
    pub fn load(&self) -> Result<(), CacheError> {
        let Some(path) = self.path() else {
            return Ok(());
        };
        if !path.exists() {
            debug!("No cache file at {:?}, starting empty", path);
            return Ok(());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| CacheError::Read {
            path: path.clone(),
            source,
        })?;
        let file: CacheFile = serde_json::from_str(&content).map_err(|source| CacheError::Parse {
            path: path.clone(),
            source,
        })?;

        if file.version != CACHE_FILE_VERSION {
            return Err(CacheError::UnsupportedVersion {
                path,
                version: file.version,
            });
        }
        if let (Some(expected), Some(found)) = (&self.language_pair, &file.language_pair) {
            if expected != found {
                return Err(CacheError::LanguagePairMismatch {
                    path,
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
        }

        let loaded: HashMap<String, CacheEntry> = file
            .entries
            .into_iter()
            .map(|entry| (entry.hash.clone(), entry))
            .collect();
        let count = loaded.len();
        *self.entries.write() = loaded;

        info!("Loaded {} cached translations from {:?}", count, path);
        Ok(())
    }

    /// Write all entries to the cache file atomically
    pub fn save(&self) -> Result<(), CacheError> {
        let Some(path) = self.path() else {
            return Ok(());
        };

        let mut entries: Vec<CacheEntry> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.hash.cmp(&b.hash)));
        let count = entries.len();

        let file = CacheFile {
            version: CACHE_FILE_VERSION.to_string(),
            language_pair: self.language_pair.clone(),
            entries,
        };
        let json = serde_json::to_string_pretty(&file)?;
        write_atomically(&path, json.as_bytes())?;

        debug!("Saved {} cached translations to {:?}", count, path);
        Ok(())
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats { hits, misses, hit_rate }
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.entries.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;

        debug!("Translation cache cleared");
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Backing file location
    pub fn path(&self) -> Option<PathBuf> {
        self.path.read().clone()
    }

    /// Point the cache at another file; takes effect on the next load or save
    pub fn set_path(&self, path: Option<PathBuf>) {
        *self.path.write() = path;
    }

    /// Enable or disable the cache
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if the cache is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn record_lookup(&self, hit: bool) {
        if hit {
            *self.hits.write() += 1;
        } else {
            *self.misses.write() += 1;
        }
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Write `bytes` to a temporary file next to `path`, then rename it into place
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let write_error = |source: std::io::Error| CacheError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_error)?;

    let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.flush().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
