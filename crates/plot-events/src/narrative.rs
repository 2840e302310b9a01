//! Narrative Types
//!
//! The source text a story was extracted from, and the offset ranges events
//! point back into.

use serde::{Deserialize, Serialize};

/// A `[start_offset, end_offset)` range into the narrative text.
///
/// Offsets count `char`s, not bytes, so they stay meaningful for non-ASCII
/// text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeSection {
    pub id: String,
    pub text: String,
    #[serde(rename = "startOffset")]
    pub start_offset: usize,
    #[serde(rename = "endOffset")]
    pub end_offset: usize,
}

impl NarrativeSection {
    /// Length of the range in chars.
    pub fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    /// Returns true if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Full source text plus sections in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub sections: Vec<NarrativeSection>,
}

impl Narrative {
    /// Creates a narrative with no sections.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sections: Vec::new(),
        }
    }

    /// Looks up a section by id. Unknown ids resolve to nothing.
    pub fn section(&self, section_id: &str) -> Option<&NarrativeSection> {
        self.sections.iter().find(|s| s.id == section_id)
    }
}
