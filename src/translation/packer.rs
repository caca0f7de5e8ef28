/*!
 * Packing of text units into size-bounded batches.
 *
 * This is the only place batch boundaries are decided. The packer is a
 * greedy single pass that never reorders, splits, drops, or duplicates a
 * unit:
 * - a multi-member batch never exceeds the context window, separators included
 * - a unit at least as long as the window always travels alone
 */

use log::debug;

use super::document::{Batch, TextUnit};
use super::transport::BATCH_SEPARATOR;

/// Default context window in characters when none is configured
pub const DEFAULT_CONTEXT_WINDOW: i64 = 4000;

/// Replace a missing or non-positive window with the default.
pub fn effective_context_window(configured: Option<i64>) -> i64 {
    match configured {
        Some(window) if window > 0 => window,
        _ => DEFAULT_CONTEXT_WINDOW,
    }
}

/// Group ordered units into batches bounded by `context_window`.
///
/// A window of zero or less behaves as if every unit were oversized, so each
/// unit gets its own batch.
pub fn pack(units: &[TextUnit], context_window: i64) -> Vec<Batch> {
    if units.is_empty() {
        return Vec::new();
    }

    let separator_len = BATCH_SEPARATOR.len();
    let mut batches: Vec<Batch> = Vec::new();
    let mut current: Vec<TextUnit> = Vec::new();
    let mut current_size: usize = 0;

    let flush = |current: &mut Vec<TextUnit>, batches: &mut Vec<Batch>| {
        if !current.is_empty() {
            let index = batches.len();
            batches.push(Batch::new(index, std::mem::take(current)));
        }
    };

    for unit in units {
        let unit_size = unit.len();

        // Oversized units travel alone
        if context_window <= 0 || unit_size as i64 >= context_window {
            flush(&mut current, &mut batches);
            current_size = 0;
            let index = batches.len();
            batches.push(Batch::new(index, vec![unit.clone()]));
            continue;
        }

        let additional = if current.is_empty() {
            unit_size
        } else {
            unit_size + separator_len
        };

        if (current_size + additional) as i64 > context_window {
            flush(&mut current, &mut batches);
            current.push(unit.clone());
            current_size = unit_size;
        } else {
            current.push(unit.clone());
            current_size += additional;
        }
    }

    flush(&mut current, &mut batches);

    debug!(
        "Packed {} units into {} batches (context window {})",
        units.len(),
        batches.len(),
        context_window
    );

    batches
}
