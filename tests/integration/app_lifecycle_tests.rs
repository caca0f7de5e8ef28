/*!
 * Full app lifecycle tests: unit file in, translated file out
 */

use std::fs;
use std::sync::Arc;

use docbatch::app_config::{Config, TranslationProvider};
use docbatch::app_controller::Controller;
use docbatch::providers::mock::MockProvider;
use docbatch::translation::{TranslationCache, TranslationService};

use crate::common;

fn test_config(cache_path: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Ollama;
    config.cache.path = cache_path.to_string_lossy().into_owned();
    config
}

const UNITS_JSON: &str = r#"{"units": [
    {"id": "p1", "text": "Abstract"},
    {"id": "p2", "text": "We study batch translation."},
    {"id": "p3", "text": "Results follow."}
]}"#;

#[tokio::test]
async fn test_controller_run_shouldWriteTranslatedUnitsAndReport() {
    common::init_logging();
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "paper.json", UNITS_JSON).unwrap();
    let output = dir.path().join("out").join("paper.fr.json");
    let config = test_config(&dir.path().join("cache.json"));

    let provider = MockProvider::working();
    let service = TranslationService::with_provider(config.clone(), Arc::new(provider.clone()));
    let controller = Controller::with_config(config).unwrap();

    let report = controller
        .run_with_service(service, input, Some(output.clone()))
        .await
        .unwrap();

    assert_eq!(report.total_units, 3);
    assert_eq!(report.translated_units, 3);
    assert_eq!(provider.request_count(), 1);

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let units = written["units"].as_array().unwrap();
    assert_eq!(units.len(), 3);
    assert_eq!(units[0]["id"], "p1");
    assert_eq!(units[2]["translated_text"], "[TRANSLATED] Results follow.");
    assert_eq!(written["report"]["total_units"], 3);
}

#[tokio::test]
async fn test_controller_run_withoutOutput_shouldWriteNextToInput() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "paper.json", UNITS_JSON).unwrap();
    let config = test_config(&dir.path().join("cache.json"));

    let service = TranslationService::with_provider(config.clone(), Arc::new(MockProvider::working()));
    let controller = Controller::with_config(config).unwrap();
    controller.run_with_service(service, input, None).await.unwrap();

    assert!(dir.path().join("paper.french.json").exists());
}

#[tokio::test]
async fn test_controller_run_withMissingInput_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let config = test_config(&dir.path().join("cache.json"));
    let service = TranslationService::with_provider(config.clone(), Arc::new(MockProvider::working()));
    let controller = Controller::with_config(config).unwrap();

    let result = controller.run_with_service(service, dir.path().join("absent.json"), None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_controller_cacheCommands_shouldReportAndClearEntries() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "paper.json", UNITS_JSON).unwrap();
    let config = test_config(&dir.path().join("cache.json"));

    let service = TranslationService::with_provider(config.clone(), Arc::new(MockProvider::working()));
    let controller = Controller::with_config(config).unwrap();
    controller.run_with_service(service, input.clone(), None).await.unwrap();

    assert_eq!(controller.cache_summary().unwrap().entries, 3);
    assert_eq!(controller.clear_cache().unwrap(), 3);
    assert_eq!(controller.cache_summary().unwrap().entries, 0);

    // Cleared cache means the provider is called again
    let provider = MockProvider::working();
    let service = TranslationService::with_provider(controller.config().clone(), Arc::new(provider.clone()));
    controller.run_with_service(service, input, None).await.unwrap();
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_controller_withCacheDisabled_shouldCallProviderEveryRun() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "paper.json", UNITS_JSON).unwrap();
    let mut config = test_config(&dir.path().join("cache.json"));
    config.cache.enabled = false;

    let provider = MockProvider::working();
    let controller = Controller::with_config(config.clone()).unwrap();
    for _ in 0..2 {
        let service = TranslationService::with_provider(config.clone(), Arc::new(provider.clone()));
        controller.run_with_service(service, input.clone(), None).await.unwrap();
    }

    assert_eq!(provider.request_count(), 2);
    assert!(!dir.path().join("cache.json").exists());
}

#[tokio::test]
async fn test_controller_withAnotherTargetLanguage_shouldNotReuseTranslations() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "paper.json", UNITS_JSON).unwrap();
    let french = test_config(&dir.path().join("cache.json"));
    let mut german = french.clone();
    german.target_language = "German".to_string();

    let run = |config: Config| {
        let input = input.clone();
        async move {
            let provider = MockProvider::working();
            let service = TranslationService::with_provider(config.clone(), Arc::new(provider.clone()));
            let report = Controller::with_config(config)
                .unwrap()
                .run_with_service(service, input, None)
                .await
                .unwrap();
            (provider.request_count(), report)
        }
    };

    let (calls, _) = run(french.clone()).await;
    assert_eq!(calls, 1);

    let (calls, report) = run(german.clone()).await;
    assert_eq!(calls, 1);
    assert_eq!(report.cached_units, 0);
    assert_eq!(report.translated_units, 3);

    // Each pair keeps its own cache file
    let (calls, report) = run(french.clone()).await;
    assert_eq!(calls, 0);
    assert_eq!(report.cached_units, 3);
    assert_ne!(french.cache_path(), german.cache_path());
    assert!(french.cache_path().unwrap().exists());
    assert!(german.cache_path().unwrap().exists());
}

#[tokio::test]
async fn test_controller_withMalformedCacheFile_shouldTranslateAndLeaveFileUntouched() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "paper.json", UNITS_JSON).unwrap();
    let config = test_config(&dir.path().join("cache.json"));
    let cache_file = config.cache_path().unwrap();
    let truncated = r#"{"version": "1.0", "entries": [{"hash": "abc", "original": "Keep me", "transl"#;
    fs::write(&cache_file, truncated).unwrap();

    let provider = MockProvider::working();
    let service = TranslationService::with_provider(config.clone(), Arc::new(provider.clone()));
    let report = Controller::with_config(config)
        .unwrap()
        .run_with_service(service, input, None)
        .await
        .unwrap();

    assert_eq!(report.translated_units, 3);
    assert_eq!(provider.request_count(), 1);
    assert_eq!(fs::read_to_string(&cache_file).unwrap(), truncated);
}

#[tokio::test]
async fn test_controller_withCacheOfAnotherPair_shouldLeaveItUntouched() {
    let dir = common::create_temp_dir().unwrap();
    let input = common::create_test_file(dir.path(), "paper.json", UNITS_JSON).unwrap();
    let config = test_config(&dir.path().join("cache.json"));
    let cache_file = config.cache_path().unwrap();

    // A file renamed from another pair's cache
    let foreign = TranslationCache::new(Some(cache_file.clone()), true).with_language_pair("English", "Japanese");
    foreign.set("Abstract", "概要");
    foreign.save().unwrap();
    let before = fs::read_to_string(&cache_file).unwrap();

    let provider = MockProvider::working();
    let service = TranslationService::with_provider(config.clone(), Arc::new(provider.clone()));
    let report = Controller::with_config(config)
        .unwrap()
        .run_with_service(service, input, None)
        .await
        .unwrap();

    assert_eq!(report.cached_units, 0);
    assert_eq!(provider.request_count(), 1);
    assert_eq!(fs::read_to_string(&cache_file).unwrap(), before);
}
