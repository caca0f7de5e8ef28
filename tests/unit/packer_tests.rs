/*!
 * Tests for batch packing
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use docbatch::translation::packer::{effective_context_window, pack, DEFAULT_CONTEXT_WINDOW};
use docbatch::translation::transport::BATCH_SEPARATOR;
use docbatch::translation::TextUnit;

use crate::common;

fn random_units(rng: &mut StdRng, count: usize, max_len: usize) -> Vec<TextUnit> {
    (0..count)
        .map(|i| {
            let len = rng.random_range(0..=max_len);
            TextUnit::new(format!("u{}", i), "a".repeat(len))
        })
        .collect()
}

#[test]
fn test_pack_withRandomInputs_shouldConserveUnitsInOrder() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let count = rng.random_range(0..40);
        let window = rng.random_range(-5..300);
        let units = random_units(&mut rng, count, 250);

        let batches = pack(&units, window);
        let flattened: Vec<TextUnit> = batches.iter().flat_map(|b| b.units.clone()).collect();

        assert_eq!(flattened, units, "window {}", window);
        assert!(batches.iter().all(|b| !b.is_empty()));
        for (position, batch) in batches.iter().enumerate() {
            assert_eq!(batch.index, position);
        }
    }
}

#[test]
fn test_pack_withRandomInputs_shouldRespectWindow() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let count = rng.random_range(1..40);
        let window = rng.random_range(1..400);
        let units = random_units(&mut rng, count, 300);

        for batch in pack(&units, window) {
            if batch.len() > 1 {
                assert!(
                    batch.total_chars(BATCH_SEPARATOR.len()) as i64 <= window,
                    "batch of {} units exceeds window {}",
                    batch.len(),
                    window
                );
            }
        }
    }
}

#[test]
fn test_pack_withOversizedUnit_shouldIsolateIt() {
    let units = common::units(&["short", &"x".repeat(50), "tail"]);
    let batches = pack(&units, 20);

    assert_eq!(batches.len(), 3);
    assert_eq!(batches[1].units[0].id, "u1");
    assert_eq!(batches[1].len(), 1);
}

#[test]
fn test_pack_withUnitEqualToWindow_shouldIsolateIt() {
    let units = common::units(&["abcde", "f"]);
    let batches = pack(&units, 5);
    assert_eq!(batches.len(), 2);
}

#[test]
fn test_pack_withSmallUnits_shouldFillBatchesGreedily() {
    let units = common::sized_units(10, 100);
    let window = (3 * 100 + 2 * BATCH_SEPARATOR.len()) as i64;

    let batches = pack(&units, window);
    let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![3, 3, 3, 1]);
}

#[test]
fn test_pack_withNonPositiveWindow_shouldSendUnitsAlone() {
    let units = common::units(&["a", "b", "c"]);
    assert_eq!(pack(&units, 0).len(), 3);
    assert_eq!(pack(&units, -1).len(), 3);
}

#[test]
fn test_effectiveContextWindow_shouldFallBackToDefault() {
    assert_eq!(effective_context_window(None), DEFAULT_CONTEXT_WINDOW);
    assert_eq!(effective_context_window(Some(0)), DEFAULT_CONTEXT_WINDOW);
    assert_eq!(effective_context_window(Some(1200)), 1200);
}
