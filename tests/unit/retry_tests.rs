/*!
 * Tests for retry and degradation control
 */

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use docbatch::errors::{ErrorClass, ProviderError, TranslationError};
use docbatch::translation::progress::ProgressTracker;
use docbatch::translation::retry::{
    next_transition, BatchTranslator, CancelHandle, RetryController, RetryPolicy, Transition,
};
use docbatch::translation::{Batch, TranslatedUnit};

use crate::common;

/// Fails multi-unit batches with `batch_status` and any unit whose text
/// contains `poison` with `unit_status`
struct ScriptedTranslator {
    batch_status: u16,
    poison: &'static str,
    unit_status: u16,
    seen: Mutex<Vec<usize>>,
}

impl ScriptedTranslator {
    fn new(batch_status: u16, poison: &'static str, unit_status: u16) -> Arc<Self> {
        Arc::new(Self {
            batch_status,
            poison,
            unit_status,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<usize> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl BatchTranslator for ScriptedTranslator {
    async fn translate_batch(&self, batch: &Batch) -> Result<Vec<TranslatedUnit>, ProviderError> {
        self.seen.lock().push(batch.len());
        if batch.len() > 1 {
            return Err(ProviderError::from_status(self.batch_status, "batch rejected"));
        }
        if batch.units.iter().any(|u| !self.poison.is_empty() && u.text.contains(self.poison)) {
            return Err(ProviderError::from_status(self.unit_status, "unit rejected"));
        }
        Ok(batch
            .units
            .iter()
            .map(|u| TranslatedUnit::translated(u.clone(), format!("<{}>", u.text)))
            .collect())
    }
}

fn controller(translator: Arc<ScriptedTranslator>, total: usize, cancel: &CancelHandle) -> RetryController {
    RetryController::new(translator, common::fast_policy(3), ProgressTracker::silent(total), cancel.subscribe())
}

#[test]
fn test_delay_shouldDoubleUntilCapped() {
    let policy = RetryPolicy::default();
    let delays: Vec<u64> = (1..=6).map(|n| policy.delay(n).as_secs()).collect();
    assert_eq!(delays, vec![2, 4, 8, 16, 30, 30]);
}

#[test]
fn test_nextTransition_shouldFollowAttemptBudget() {
    let policy = RetryPolicy::default();
    assert_eq!(
        next_transition(1, ErrorClass::Retryable, &policy),
        Transition::RetryAfter(Duration::from_secs(2))
    );
    assert_eq!(
        next_transition(2, ErrorClass::Retryable, &policy),
        Transition::RetryAfter(Duration::from_secs(4))
    );
    assert_eq!(next_transition(3, ErrorClass::Retryable, &policy), Transition::GiveUp);
    assert_eq!(next_transition(1, ErrorClass::NonRetryable, &policy), Transition::GiveUp);
}

#[tokio::test]
async fn test_run_withBatchAlwaysFailing_shouldDegradeToSingleUnits() {
    common::init_logging();
    let translator = ScriptedTranslator::new(503, "", 0);
    let cancel = CancelHandle::new();
    let batch = Batch::new(0, common::units(&["a", "b", "c"]));

    let result = controller(translator.clone(), 3, &cancel).run(&batch).await.unwrap();

    let texts: Vec<&str> = result.iter().map(|u| u.translated_text.as_str()).collect();
    assert_eq!(texts, vec!["<a>", "<b>", "<c>"]);
    let calls = translator.seen();
    assert!(calls.len() > 3);
    assert_eq!(calls, vec![3, 3, 3, 1, 1, 1]);
}

#[tokio::test]
async fn test_run_withNonRetryableBatchError_shouldAttemptBatchOnce() {
    let translator = ScriptedTranslator::new(400, "", 0);
    let cancel = CancelHandle::new();
    let batch = Batch::new(0, common::units(&["a", "b"]));

    let result = controller(translator.clone(), 2, &cancel).run(&batch).await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(translator.seen(), vec![2, 1, 1]);
}

#[tokio::test]
async fn test_run_withOnePoisonedUnit_shouldLeaveOnlyThatUnitEmpty() {
    let translator = ScriptedTranslator::new(503, "poison", 422);
    let cancel = CancelHandle::new();
    let batch = Batch::new(0, common::units(&["fine", "poison pill", "also fine"]));

    let result = controller(translator.clone(), 3, &cancel).run(&batch).await.unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result[0].translated_text, "<fine>");
    assert!(result[1].is_missing());
    assert_eq!(result[1].id(), "u1");
    assert_eq!(result[2].translated_text, "<also fine>");
    // 3 batch attempts, then one attempt per unit since 422 is not retried
    assert_eq!(translator.seen(), vec![3, 3, 3, 1, 1, 1]);
}

#[tokio::test]
async fn test_run_withEveryUnitFailing_shouldReturnAllUnitsFailed() {
    let translator = ScriptedTranslator::new(503, "x", 401);
    let cancel = CancelHandle::new();
    let batch = Batch::new(0, common::units(&["x1", "x2"]));

    let error = controller(translator, 2, &cancel).run(&batch).await.unwrap_err();

    match error {
        TranslationError::AllUnitsFailed { failed_ids, source } => {
            assert_eq!(failed_ids, vec!["u0".to_string(), "u1".to_string()]);
            assert!(source.is_retryable());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_run_withSingleUnitExhausted_shouldReturnUnitFailed() {
    let translator = ScriptedTranslator::new(503, "bad", 503);
    let cancel = CancelHandle::new();
    let batch = Batch::new(4, common::units(&["bad"]));

    let error = controller(translator.clone(), 1, &cancel).run(&batch).await.unwrap_err();

    assert!(matches!(error, TranslationError::UnitFailed { ref unit_id, .. } if unit_id == "u0"));
    assert_eq!(translator.seen().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_run_whenCancelledDuringBackoff_shouldStopPromptly() {
    let translator = ScriptedTranslator::new(503, "", 0);
    let cancel = CancelHandle::new();
    let controller = RetryController::new(
        translator.clone(),
        RetryPolicy::default(),
        ProgressTracker::silent(2),
        cancel.subscribe(),
    );
    let batch = Batch::new(0, common::units(&["a", "b"]));

    let started = tokio::time::Instant::now();
    let (result, _) = tokio::join!(controller.run(&batch), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
    });

    assert!(matches!(result, Err(TranslationError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(translator.seen(), vec![2]);
}

#[tokio::test]
async fn test_run_withProgress_shouldCountEveryUnitOnce() {
    let translator = ScriptedTranslator::new(503, "", 0);
    let cancel = CancelHandle::new();
    let progress = ProgressTracker::silent(3);
    let controller = RetryController::new(translator, common::fast_policy(2), progress.clone(), cancel.subscribe());

    controller.run(&Batch::new(0, common::units(&["a", "b", "c"]))).await.unwrap();

    assert_eq!(progress.completed(), 3);
}
