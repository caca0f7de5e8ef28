/*!
 * Tests for translation cache functionality
 */

use std::fs;

use docbatch::errors::CacheError;
use docbatch::translation::cache::{TranslationCache, CACHE_FILE_VERSION};

use crate::common;

#[test]
fn test_cache_set_thenGet_shouldReturnTranslation() {
    let cache = TranslationCache::in_memory();
    cache.set("hello", "bonjour");

    assert_eq!(cache.get("hello").as_deref(), Some("bonjour"));
    assert!(cache.get("goodbye").is_none());
}

#[test]
fn test_cache_withDisabled_shouldNeverStore() {
    let cache = TranslationCache::new(None, false);
    cache.set("hello", "bonjour");

    assert!(cache.get("hello").is_none());
    assert!(cache.is_empty());
}

#[test]
fn test_cache_save_thenFreshLoad_shouldRestoreEntries() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("nested").join("cache.json");

    let cache = TranslationCache::new(Some(path.clone()), true);
    cache.set("hello", "bonjour");
    cache.set("東京", "Tokyo");
    cache.save().unwrap();

    let reloaded = TranslationCache::new(Some(path.clone()), true);
    reloaded.load().unwrap();

    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.get("hello").as_deref(), Some("bonjour"));
    assert_eq!(reloaded.get("東京").as_deref(), Some("Tokyo"));
}

#[test]
fn test_cache_save_shouldWriteVersionedEntries() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("cache.json");

    let cache = TranslationCache::new(Some(path.clone()), true);
    cache.set("hello", "bonjour");
    cache.save().unwrap();

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["version"], CACHE_FILE_VERSION);
    let entry = &written["entries"][0];
    assert_eq!(entry["hash"], TranslationCache::compute_hash("hello"));
    assert_eq!(entry["original"], "hello");
    assert_eq!(entry["translation"], "bonjour");
    assert!(entry["created_at"].is_string());
}

#[test]
fn test_cache_load_withMissingFile_shouldStartEmpty() {
    let dir = common::create_temp_dir().unwrap();
    let cache = TranslationCache::new(Some(dir.path().join("absent.json")), true);

    assert!(cache.load().is_ok());
    assert!(cache.is_empty());
}

#[test]
fn test_cache_load_withCorruptFile_shouldReturnParseError() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "cache.json", "{not json").unwrap();

    let cache = TranslationCache::new(Some(path), true);
    assert!(matches!(cache.load(), Err(CacheError::Parse { .. })));
}

#[test]
fn test_cache_filterCached_shouldPartitionUnits() {
    let cache = TranslationCache::in_memory();
    cache.set("two", "deux");
    let units = common::units(&["one", "two", "three"]);

    let (cached, pending) = cache.filter_cached(&units);

    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id(), "u1");
    assert!(cached[0].from_cache);
    let pending_ids: Vec<&str> = pending.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(pending_ids, vec!["u0", "u2"]);
}

#[test]
fn test_cache_stats_shouldCountHitsAndMisses() {
    let cache = TranslationCache::in_memory();
    cache.set("hello", "bonjour");

    cache.get("hello");
    cache.get("nope");
    cache.get("hello");

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate - 2.0 / 3.0).abs() < f64::EPSILON);
}

#[test]
fn test_cache_computeHash_shouldBeSha256Hex() {
    assert_eq!(
        TranslationCache::compute_hash(""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}
