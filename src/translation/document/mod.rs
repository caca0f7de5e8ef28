/*!
 * Document modeling for batch translation.
 *
 * This module provides the unit types that flow through the scheduler:
 * - `TextUnit`: one span of source text with a stable id
 * - `TranslatedUnit`: a unit plus its translation
 * - `Batch`: a contiguous group of units sent in one call
 */

pub mod model;

// Re-export types used by other modules
pub use model::{Batch, TextUnit, TranslatedUnit, UnitFile};
