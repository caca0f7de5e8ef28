/*!
 * Prompt engineering for batch translation.
 *
 * This module provides:
 * - System prompt templates with language placeholders
 * - User prompt construction around joined batch text
 */

pub mod templates;

// Re-export main types
pub use templates::{PromptTemplate, TranslationPromptBuilder};
