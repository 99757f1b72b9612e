//! Signature capture
//!
//! Signature state for a signature section: the signer's name plus either
//! drawn ink strokes or typed text, selected per environment as a variant
//! rather than compiled-out code paths. Platforms with true handwritten
//! capture record strokes; everything else records typed text.

use serde::{Deserialize, Serialize};

/// Structured person name entered next to the signature field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub given_name: String,
    pub family_name: String,
}

impl PersonName {
    pub fn new(given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        PersonName {
            given_name: given_name.into(),
            family_name: family_name.into(),
        }
    }

    /// "Given Family" with empty components dropped.
    pub fn formatted(&self) -> String {
        [self.given_name.as_str(), self.family_name.as_str()]
            .iter()
            .filter(|part| !part.trim().is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One continuous pen stroke on the signature canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<(f32, f32)>,
}

/// Platform-dependent signature representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignatureInk {
    Drawn(Vec<Stroke>),
    Typed(String),
}

/// Signature state for one signature section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureStorage {
    pub name: PersonName,
    pub ink: SignatureInk,
    /// Size of the capture canvas in points, used when the ink is embedded
    /// into an export.
    pub canvas_size: (f32, f32),
}

impl SignatureStorage {
    /// Storage for typed-text signature capture.
    pub fn typed() -> Self {
        SignatureStorage {
            name: PersonName::default(),
            ink: SignatureInk::Typed(String::new()),
            canvas_size: (0.0, 0.0),
        }
    }

    /// Storage for handwritten signature capture.
    pub fn drawn(canvas_size: (f32, f32)) -> Self {
        SignatureStorage {
            name: PersonName::default(),
            ink: SignatureInk::Drawn(Vec::new()),
            canvas_size,
        }
    }

    /// At least one stroke, or non-empty typed text.
    pub fn is_signed(&self) -> bool {
        match &self.ink {
            SignatureInk::Drawn(strokes) => !strokes.is_empty(),
            SignatureInk::Typed(text) => !text.trim().is_empty(),
        }
    }

    /// Both name components entered.
    pub fn did_enter_names(&self) -> bool {
        !self.name.given_name.trim().is_empty() && !self.name.family_name.trim().is_empty()
    }

    pub fn add_stroke(&mut self, stroke: Stroke) {
        match &mut self.ink {
            SignatureInk::Drawn(strokes) => strokes.push(stroke),
            // A stroke on a typed-capture platform switches the storage over.
            ink @ SignatureInk::Typed(_) => *ink = SignatureInk::Drawn(vec![stroke]),
        }
    }

    pub fn set_typed_text(&mut self, text: impl Into<String>) {
        self.ink = SignatureInk::Typed(text.into());
    }

    /// Empty the stroke/text buffer, preserving entered names.
    pub fn clear_signature(&mut self) {
        match &mut self.ink {
            SignatureInk::Drawn(strokes) => strokes.clear(),
            SignatureInk::Typed(text) => text.clear(),
        }
    }
}

impl Default for SignatureStorage {
    fn default() -> Self {
        SignatureStorage::typed()
    }
}
