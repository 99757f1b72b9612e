//! Consent document
//!
//! `ConsentDocument` owns the parsed sections and frontmatter (immutable
//! after construction), the mutable per-section response state, and the
//! signature capture. It computes the completion verdict that gates
//! submission and is the entry point for exporting.
//!
//! All mutation happens on one logical thread of control. The long-running
//! operations - loading a file, parsing a large document, rendering an
//! export - have async variants that run the work off-thread and hand the
//! result back before any shared state changes.
//!
//! Reading or writing the value of a section id that was never registered is
//! a contract violation between core and caller, not a recoverable error:
//! the typed accessors panic. Section ids can only come from the document's
//! own parse step, so this cannot happen when the document and its sections
//! travel together.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use super::export::{render_document, ExportConfiguration, ExportError, RenderBackend};
use super::parser::{parse_document, ParseError, ParseOptions, ParsedDocument};
use super::section::Section;
use super::signature::SignatureStorage;

/// Errors from the file-based constructors.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read document: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Verdict of whether all required interactive sections satisfy their
/// expected values.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompletionState {
    Complete,
    /// The first failing section in document order.
    Incomplete { section_id: String },
}

impl CompletionState {
    pub fn is_complete(&self) -> bool {
        matches!(self, CompletionState::Complete)
    }
}

/// Current value of one interactive section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionValue {
    Toggle(bool),
    /// Selected option id; empty string means no selection.
    Selection(String),
    Signature(SignatureStorage),
}

/// A parsed consent document with per-section response state.
#[derive(Debug)]
pub struct ConsentDocument {
    frontmatter: BTreeMap<String, String>,
    sections: Vec<Section>,
    responses: HashMap<String, SectionValue>,
    signature_date: Option<String>,
    is_signing: bool,
    is_exporting: bool,
}

impl ConsentDocument {
    /// Parse a document from UTF-8 text with default options.
    pub fn from_markdown(source: &str) -> Result<Self, ParseError> {
        Self::with_options(source, &ParseOptions::default())
    }

    /// Parse a document from UTF-8 text.
    pub fn with_options(source: &str, options: &ParseOptions) -> Result<Self, ParseError> {
        let parsed = parse_document(source, options)?;
        Self::from_parsed(parsed)
    }

    /// Parse a document from raw bytes. Fails with
    /// [`ParseError::InputNotUtf8`] if the bytes are not UTF-8.
    pub fn from_bytes(bytes: &[u8], options: &ParseOptions) -> Result<Self, ParseError> {
        let source = std::str::from_utf8(bytes).map_err(|_| ParseError::InputNotUtf8)?;
        Self::with_options(source, options)
    }

    /// Read and parse a document from a file.
    pub fn from_path<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(&bytes, options)?)
    }

    /// Read and parse a document without blocking the calling task. The file
    /// read and the parse both run off-thread; the constructed document is
    /// handed back to the caller.
    pub async fn load_from_path<P: AsRef<Path>>(
        path: P,
        options: &ParseOptions,
    ) -> Result<Self, LoadError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let options = options.clone();
        let document = await_blocking(tokio::task::spawn_blocking(move || {
            ConsentDocument::from_bytes(&bytes, &options)
        }))
        .await?;
        Ok(document)
    }

    /// Parse a document without blocking the calling task.
    pub async fn parse_off_thread(
        source: String,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let options = options.clone();
        await_blocking(tokio::task::spawn_blocking(move || {
            ConsentDocument::with_options(&source, &options)
        }))
        .await
    }

    // Seeds the response table; this is where duplicate section ids across
    // the whole document surface.
    fn from_parsed(parsed: ParsedDocument) -> Result<Self, ParseError> {
        let mut responses = HashMap::new();
        for section in &parsed.sections {
            let Some(id) = section.id() else { continue };
            let seed = match section {
                Section::Toggle { initial_value, .. } => SectionValue::Toggle(*initial_value),
                Section::Select {
                    initial_selection, ..
                } => SectionValue::Selection(initial_selection.clone()),
                Section::Signature { .. } => {
                    SectionValue::Signature(SignatureStorage::default())
                }
                Section::Markdown { .. } => unreachable!("markdown sections have no id"),
            };
            if responses.insert(id.to_string(), seed).is_some() {
                return Err(ParseError::DuplicateElementId(id.to_string()));
            }
        }
        debug!(
            sections = parsed.sections.len(),
            interactive = responses.len(),
            "consent document constructed"
        );
        Ok(ConsentDocument {
            frontmatter: parsed.frontmatter,
            sections: parsed.sections,
            responses,
            signature_date: None,
            is_signing: false,
            is_exporting: false,
        })
    }

    pub fn frontmatter(&self) -> &BTreeMap<String, String> {
        &self.frontmatter
    }

    /// Document title from frontmatter, if present.
    pub fn title(&self) -> Option<&str> {
        self.frontmatter.get("title").map(String::as_str)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Scan the sections in document order and report the first one whose
    /// response does not satisfy its expected policy. Markdown sections never
    /// block completion.
    pub fn completion_state(&self) -> CompletionState {
        use super::section::SelectionPolicy;

        for section in &self.sections {
            let satisfied = match section {
                Section::Markdown { .. } => true,
                Section::Toggle {
                    id, expected_value, ..
                } => match expected_value {
                    Some(expected) => self.toggle_value(id) == *expected,
                    None => true,
                },
                Section::Select {
                    id,
                    expected_selection,
                    ..
                } => {
                    let selection = self.selection(id);
                    match expected_selection {
                        SelectionPolicy::Anything { allow_empty: true } => true,
                        SelectionPolicy::Anything { allow_empty: false } => !selection.is_empty(),
                        SelectionPolicy::Exactly(expected) => selection == expected,
                    }
                }
                Section::Signature { id } => {
                    let signature = self.signature(id);
                    signature.did_enter_names() && signature.is_signed()
                }
            };
            if !satisfied {
                return CompletionState::Incomplete {
                    section_id: section
                        .id()
                        .expect("only interactive sections can fail completion")
                        .to_string(),
                };
            }
        }
        CompletionState::Complete
    }

    /// Current value of a toggle section.
    ///
    /// Panics if `id` is not a toggle section of this document.
    pub fn toggle_value(&self, id: &str) -> bool {
        match self.responses.get(id) {
            Some(SectionValue::Toggle(value)) => *value,
            _ => panic!("`{id}` is not a toggle section registered with this document"),
        }
    }

    /// Set the value of a toggle section.
    ///
    /// Panics if `id` is not a toggle section of this document.
    pub fn set_toggle_value(&mut self, id: &str, value: bool) {
        match self.responses.get_mut(id) {
            Some(SectionValue::Toggle(current)) => *current = value,
            _ => panic!("`{id}` is not a toggle section registered with this document"),
        }
    }

    /// Currently selected option id of a select section; empty when nothing
    /// is selected.
    ///
    /// Panics if `id` is not a select section of this document.
    pub fn selection(&self, id: &str) -> &str {
        match self.responses.get(id) {
            Some(SectionValue::Selection(selection)) => selection,
            _ => panic!("`{id}` is not a select section registered with this document"),
        }
    }

    /// Set the selection of a select section. An empty string clears the
    /// selection.
    ///
    /// Panics if `id` is not a select section of this document.
    pub fn set_selection(&mut self, id: &str, selection: impl Into<String>) {
        match self.responses.get_mut(id) {
            Some(SectionValue::Selection(current)) => *current = selection.into(),
            _ => panic!("`{id}` is not a select section registered with this document"),
        }
    }

    /// Signature state of a signature section.
    ///
    /// Panics if `id` is not a signature section of this document.
    pub fn signature(&self, id: &str) -> &SignatureStorage {
        match self.responses.get(id) {
            Some(SectionValue::Signature(signature)) => signature,
            _ => panic!("`{id}` is not a signature section registered with this document"),
        }
    }

    /// Mutable signature state of a signature section.
    ///
    /// Panics if `id` is not a signature section of this document.
    pub fn signature_mut(&mut self, id: &str) -> &mut SignatureStorage {
        match self.responses.get_mut(id) {
            Some(SectionValue::Signature(signature)) => signature,
            _ => panic!("`{id}` is not a signature section registered with this document"),
        }
    }

    /// Empty the signature's stroke/text buffer, preserving entered names.
    pub fn clear_signature(&mut self, id: &str) {
        self.signature_mut(id).clear_signature();
    }

    pub fn signature_date(&self) -> Option<&str> {
        self.signature_date.as_deref()
    }

    pub fn set_signature_date(&mut self, date: Option<String>) {
        self.signature_date = date;
    }

    pub fn is_signing(&self) -> bool {
        self.is_signing
    }

    pub fn set_signing(&mut self, signing: bool) {
        self.is_signing = signing;
    }

    /// Whether an export is currently in flight. Advisory: callers are
    /// expected to check this before requesting another export.
    pub fn is_exporting(&self) -> bool {
        self.is_exporting
    }

    /// Render the document with its current response state into a byte
    /// stream.
    ///
    /// The exporting flag is held for the duration and cleared on every exit
    /// path.
    pub fn export<B: RenderBackend>(
        &mut self,
        config: &ExportConfiguration,
        backend: B,
    ) -> Result<Vec<u8>, ExportError> {
        let _guard = ExportingGuard::acquire(&mut self.is_exporting);
        render_document(
            &self.sections,
            &self.responses,
            &self.frontmatter,
            self.signature_date.as_deref(),
            config,
            backend,
        )
    }

    /// Render without blocking the calling task. The render works on a
    /// snapshot; the exporting flag is set before the work starts and
    /// cleared once the result is back on the caller's task.
    pub async fn export_off_thread<B>(
        &mut self,
        config: &ExportConfiguration,
        backend: B,
    ) -> Result<Vec<u8>, ExportError>
    where
        B: RenderBackend + Send + 'static,
    {
        self.is_exporting = true;
        let sections = self.sections.clone();
        let responses = self.responses.clone();
        let frontmatter = self.frontmatter.clone();
        let signature_date = self.signature_date.clone();
        let config = config.clone();
        let result = await_blocking(tokio::task::spawn_blocking(move || {
            render_document(
                &sections,
                &responses,
                &frontmatter,
                signature_date.as_deref(),
                &config,
                backend,
            )
        }))
        .await;
        self.is_exporting = false;
        result
    }
}

// Scoped acquisition/release of the exporting flag.
struct ExportingGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> ExportingGuard<'a> {
    fn acquire(flag: &'a mut bool) -> Self {
        *flag = true;
        ExportingGuard { flag }
    }
}

impl Drop for ExportingGuard<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

// Joins a blocking task, re-raising a panic from the worker on the calling
// task instead of inventing an error value for it.
async fn await_blocking<T>(handle: tokio::task::JoinHandle<T>) -> T {
    match handle.await {
        Ok(value) => value,
        Err(error) => std::panic::resume_unwind(error.into_panic()),
    }
}
