//! Section model
//!
//! A consent document is an ordered list of sections: opaque markdown runs
//! interleaved with interactive fields. Sections are immutable once parsed;
//! per-section response state lives in the owning document.

use serde::{Deserialize, Serialize};

/// Section id used for the synthetic signature section on the
/// plain-terms-of-service fallback path (custom elements disabled).
pub const DEFAULT_SIGNATURE_ID: &str = "signature";

/// One option of a select section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: String,
    pub title: String,
}

/// What a select section requires before the document counts as complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// Any selection is acceptable; `allow_empty` controls whether "no
    /// selection" also passes.
    Anything { allow_empty: bool },
    /// Exactly this option id is required.
    Exactly(String),
}

/// One content unit of a consent document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Section {
    /// Opaque markdown text. Never blocks completion.
    Markdown { text: String },
    Toggle {
        id: String,
        prompt: String,
        initial_value: bool,
        /// `None` means "don't care": any value completes the section.
        expected_value: Option<bool>,
    },
    Select {
        id: String,
        prompt: String,
        options: Vec<SelectOption>,
        /// Empty string means no initial selection.
        initial_selection: String,
        expected_selection: SelectionPolicy,
    },
    Signature { id: String },
}

impl Section {
    /// The section id; markdown sections have none.
    pub fn id(&self) -> Option<&str> {
        match self {
            Section::Markdown { .. } => None,
            Section::Toggle { id, .. }
            | Section::Select { id, .. }
            | Section::Signature { id } => Some(id),
        }
    }

    pub fn is_interactive(&self) -> bool {
        !matches!(self, Section::Markdown { .. })
    }
}
