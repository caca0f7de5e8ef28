/*!
 * End-to-end tests for the batch translation scheduler
 */

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use docbatch::errors::TranslationError;
use docbatch::providers::mock::MockProvider;
use docbatch::translation::{Scheduler, SchedulerOptions, TranslationCache};

use crate::common;

#[tokio::test]
async fn test_run_withManyBatches_shouldPreserveInputOrder() {
    common::init_logging();
    let provider = MockProvider::slow(5);
    let units = common::sized_units(40, 120);

    let (results, report) = common::mock_scheduler(&provider, TranslationCache::in_memory(), 400, 4)
        .run(&units)
        .await
        .unwrap();

    assert_eq!(results.len(), units.len());
    for (unit, result) in units.iter().zip(&results) {
        assert_eq!(result.id(), unit.id);
        assert_eq!(result.translated_text, MockProvider::translate_block(&unit.text));
    }
    assert_eq!(report.translated_units, 40);
    assert_eq!(report.batch_count, provider.request_count());
}

#[tokio::test]
async fn test_run_shouldNeverExceedConcurrency() {
    let provider = MockProvider::slow(10);
    let units = common::sized_units(30, 100);

    common::mock_scheduler(&provider, TranslationCache::in_memory(), 100, 3)
        .run(&units)
        .await
        .unwrap();

    assert_eq!(provider.request_count(), 30);
    assert!(provider.peak_in_flight() <= 3);
    assert!(provider.peak_in_flight() >= 2);
}

#[tokio::test]
async fn test_run_secondRun_shouldBeServedFromCache() {
    let dir = common::create_temp_dir().unwrap();
    let cache_path = dir.path().join("cache.json");
    let units = common::units(&["The cell divides.", "Results are shown in Table 2.", "We conclude."]);

    let first = MockProvider::working();
    let cache = TranslationCache::new(Some(cache_path.clone()), true);
    let (first_results, _) = common::mock_scheduler(&first, cache, 4000, 2).run(&units).await.unwrap();
    assert_eq!(first.request_count(), 1);
    assert!(cache_path.exists());

    // A new process: fresh cache instance loaded from disk
    let second = MockProvider::working();
    let cache = TranslationCache::new(Some(cache_path), true);
    cache.load().unwrap();
    let (second_results, report) = common::mock_scheduler(&second, cache, 4000, 2).run(&units).await.unwrap();

    assert_eq!(second.request_count(), 0);
    assert_eq!(report.cached_units, 3);
    assert_eq!(report.batch_count, 0);
    let first_texts: Vec<&str> = first_results.iter().map(|u| u.translated_text.as_str()).collect();
    let second_texts: Vec<&str> = second_results.iter().map(|u| u.translated_text.as_str()).collect();
    assert_eq!(first_texts, second_texts);
    assert!(second_results.iter().all(|u| u.from_cache));
}

#[tokio::test]
async fn test_run_withFailingBatches_shouldDegradeAndStillTranslateEverything() {
    let provider = MockProvider::failing_batches(503);
    let units = common::units(&["a", "b", "c"]);

    let (results, report) = common::mock_scheduler(&provider, TranslationCache::in_memory(), 4000, 2)
        .run(&units)
        .await
        .unwrap();

    assert_eq!(report.failed_units, 0);
    assert_eq!(results.len(), 3);
    assert!(provider.request_count() > 3);
    assert_eq!(provider.request_count(), 6);
}

#[tokio::test]
async fn test_run_withOneBadUnit_shouldLeaveVisibleGap() {
    let provider = MockProvider::failing_on("bad", 400);
    let cache = TranslationCache::in_memory();
    let units = common::units(&["good", "bad", "fine"]);

    let (results, report) = common::mock_scheduler(&provider, cache.clone(), 4000, 2)
        .run(&units)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[1].is_missing());
    assert_eq!(report.failed_units, 1);
    assert_eq!(report.translated_units, 2);
    assert!(cache.get("bad").is_none());
    assert!(cache.get("good").is_some());
}

#[tokio::test]
async fn test_run_withProviderDown_shouldReturnTerminalError() {
    let provider = MockProvider::failing(500);
    let units = common::units(&["a", "b"]);

    let result = common::mock_scheduler(&provider, TranslationCache::in_memory(), 4000, 2)
        .run(&units)
        .await;

    assert!(matches!(result, Err(TranslationError::AllUnitsFailed { .. })));
}

#[tokio::test]
async fn test_run_withOversizedUnitFailing_shouldReturnUnitFailed() {
    let provider = MockProvider::failing(503);
    let units = common::units(&["this unit is longer than the window"]);

    let result = common::mock_scheduler(&provider, TranslationCache::in_memory(), 10, 2)
        .run(&units)
        .await;

    assert!(matches!(result, Err(TranslationError::UnitFailed { .. })));
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test]
async fn test_run_withObserver_shouldReportMonotonicProgress() {
    let provider = MockProvider::working();
    let cache = TranslationCache::in_memory();
    let units = common::sized_units(6, 18);
    cache.set(&units[0].text, "cached");
    let seen: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    common::mock_scheduler(&provider, cache, 40, 2)
        .with_observer(Arc::new(move |completed, total| sink.lock().push((completed, total))))
        .run(&units)
        .await
        .unwrap();

    let seen = seen.lock().clone();
    assert_eq!(seen.first(), Some(&(1, 6)));
    assert_eq!(seen.last(), Some(&(6, 6)));
    assert!(seen.windows(2).all(|pair| pair[0].0 <= pair[1].0));
}

#[tokio::test(start_paused = true)]
async fn test_run_whenCancelledDuringBackoff_shouldStopAndSaveCache() {
    let dir = common::create_temp_dir().unwrap();
    let cache_path = dir.path().join("cache.json");
    let provider = MockProvider::failing_on("stuck", 503);
    let options = SchedulerOptions { context_window: 10, concurrency: 1, ..Default::default() };
    let scheduler = Scheduler::new(
        common::mock_transport(&provider),
        TranslationCache::new(Some(cache_path.clone()), true),
        options,
    );
    let cancel = scheduler.cancel_handle();
    let units = common::units(&["done", "stuck", "never"]);

    let started = tokio::time::Instant::now();
    let (result, _) = tokio::join!(scheduler.run(&units), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
    });

    assert!(matches!(result, Err(TranslationError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(provider.request_count(), 2);
    assert!(scheduler.cache().get("done").is_some());
    assert!(cache_path.exists());
}
