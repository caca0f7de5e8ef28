/*!
 * Core document model types for batch translation.
 *
 * A document arrives from the upstream parser as an ordered list of
 * `TextUnit`s and leaves as an equally long, equally ordered list of
 * `TranslatedUnit`s. Batches are contiguous runs of that list.
 */

use serde::{Deserialize, Serialize};

/// One translatable span of source text with a stable identifier.
///
/// Identity is the `id`; ids must be unique within one scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Stable identifier assigned by the upstream parser
    pub id: String,

    /// Source text to translate
    pub text: String,
}

impl TextUnit {
    /// Create a new text unit.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Length of the text as counted against the context window (UTF-8 bytes).
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A text unit together with its translation.
///
/// An empty `translated_text` marks a unit that could not be translated;
/// the renderer is expected to flag it or fall back to the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedUnit {
    /// The source unit
    #[serde(flatten)]
    pub unit: TextUnit,

    /// Translated text, empty when translation failed
    pub translated_text: String,

    /// Whether the translation was served from the cache
    #[serde(default)]
    pub from_cache: bool,
}

impl TranslatedUnit {
    /// Wrap a freshly translated unit.
    pub fn translated(unit: TextUnit, translated_text: impl Into<String>) -> Self {
        Self {
            unit,
            translated_text: translated_text.into(),
            from_cache: false,
        }
    }

    /// Wrap a unit whose translation came from the cache.
    pub fn cached(unit: TextUnit, translated_text: impl Into<String>) -> Self {
        Self {
            unit,
            translated_text: translated_text.into(),
            from_cache: true,
        }
    }

    /// Record a unit whose translation failed for good.
    pub fn missing(unit: TextUnit) -> Self {
        Self {
            unit,
            translated_text: String::new(),
            from_cache: false,
        }
    }

    /// Identifier of the underlying unit.
    pub fn id(&self) -> &str {
        &self.unit.id
    }

    /// Source text of the underlying unit.
    pub fn text(&self) -> &str {
        &self.unit.text
    }

    /// Whether this unit carries no translation.
    pub fn is_missing(&self) -> bool {
        self.translated_text.is_empty()
    }
}

/// An ordered, non-empty, contiguous group of units sent in one external call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Position of this batch in the packing order
    pub index: usize,

    /// Member units in input order
    pub units: Vec<TextUnit>,
}

impl Batch {
    /// Create a batch from its members.
    pub fn new(index: usize, units: Vec<TextUnit>) -> Self {
        Self { index, units }
    }

    /// Number of member units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the batch has no members.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Packed size: member lengths plus one separator per member after the first.
    pub fn total_chars(&self, separator_len: usize) -> usize {
        let text_len: usize = self.units.iter().map(TextUnit::len).sum();
        text_len + separator_len * self.units.len().saturating_sub(1)
    }

    /// Split this batch into single-member batches, keeping the batch index.
    pub fn singles(&self) -> Vec<Batch> {
        self.units
            .iter()
            .map(|unit| Batch::new(self.index, vec![unit.clone()]))
            .collect()
    }
}

/// Unit file as produced by the upstream parser.
///
/// Both a bare JSON array of units and an object with a `units` field
/// are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitFile {
    /// `[{"id": ..., "text": ...}, ...]`
    Bare(Vec<TextUnit>),
    /// `{"units": [...]}`
    Wrapped {
        /// The ordered units
        units: Vec<TextUnit>,
    },
}

impl UnitFile {
    /// Take the ordered units out of the file.
    pub fn into_units(self) -> Vec<TextUnit> {
        match self {
            Self::Bare(units) | Self::Wrapped { units } => units,
        }
    }
}
