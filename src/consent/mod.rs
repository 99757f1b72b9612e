//! Consent documents
//!
//! The consent subsystem covers the document-consent flow: parse markdown
//! text with a narrow extension syntax for interactive fields, track
//! per-section response state, compute the completion verdict that gates
//! submission, and render the result into an export byte stream.
//!
//! The pipeline is staged like any other document format:
//!
//!     source text
//!         -> parser              (frontmatter split + markup decode
//!                                 into typed, validated sections)
//!         -> ConsentDocument     (response state, completion, signature)
//!         -> export              (deterministic render over a backend)

pub mod document;
pub mod export;
pub mod markup;
pub mod parser;
pub mod section;
pub mod signature;

pub use document::{CompletionState, ConsentDocument, LoadError, SectionValue};
pub use export::{
    ExportConfiguration, ExportError, FontConfiguration, FontSpec, PaperSize, PlainTextBackend,
    RenderBackend, TextStyle,
};
pub use parser::{ParseError, ParseOptions, ParsedDocument};
pub use section::{Section, SelectOption, SelectionPolicy, DEFAULT_SIGNATURE_ID};
pub use signature::{PersonName, SignatureInk, SignatureStorage, Stroke};
