//! Export rendering
//!
//! Deterministic transform from a document's sections plus current response
//! state into a paginated byte stream. The actual drawing lives behind the
//! [`RenderBackend`] capability: styled text runs, simple two-cell rows, a
//! horizontal rule, and a signature image. Hosts with a real PDF engine
//! implement the trait; [`PlainTextBackend`] is the built-in deterministic
//! backend used by tests and the CLI.
//!
//! Given identical sections, responses, and configuration, two renders
//! produce byte-identical output - except for the timestamp line when the
//! configuration enables it.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::document::SectionValue;
use super::section::Section;
use super::signature::{SignatureInk, Stroke};

/// Right-cell labels for toggle rows. Localization happens in the host; the
/// export itself is fixed-language.
const YES_LABEL: &str = "Yes";
const NO_LABEL: &str = "No";

/// Substituted for a markdown run that fails to format. Rendering never
/// aborts the whole export because one run is malformed.
const MARKDOWN_FAILURE_PLACEHOLDER: &str = "loading error";

/// Export failure. Treated as an invariant violation: a well-formed document
/// and backend should always produce bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("the rendering backend could not produce a document; please retry the export")]
    UnableToProducePdf,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    UsLetter,
    /// Width and height in points.
    Custom { width: f32, height: f32 },
}

// Eq on Custom is fine: configurations are compared, never computed with.
impl Eq for PaperSize {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub name: String,
    pub size: f32,
}

impl FontSpec {
    pub fn new(name: impl Into<String>, size: f32) -> Self {
        FontSpec {
            name: name.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontConfiguration {
    pub title: FontSpec,
    pub body: FontSpec,
    pub caption: FontSpec,
}

impl Default for FontConfiguration {
    fn default() -> Self {
        FontConfiguration {
            title: FontSpec::new("Helvetica-Bold", 18.0),
            body: FontSpec::new("Helvetica", 11.0),
            caption: FontSpec::new("Helvetica", 8.0),
        }
    }
}

/// Caller-supplied export settings. Immutable for the duration of a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfiguration {
    pub paper_size: PaperSize,
    pub fonts: FontConfiguration,
    /// Emit an export timestamp block before the content.
    pub include_timestamp: bool,
    /// Overrides the frontmatter title in the rendered header.
    pub title_override: Option<String>,
}

impl Default for ExportConfiguration {
    fn default() -> Self {
        ExportConfiguration {
            paper_size: PaperSize::A4,
            fonts: FontConfiguration::default(),
            include_timestamp: false,
            title_override: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Title,
    Body,
    Caption,
}

/// Drawing capability the renderer needs from the host.
pub trait RenderBackend {
    /// Called once before any content.
    fn begin(&mut self, config: &ExportConfiguration);
    /// A styled text run.
    fn text(&mut self, style: TextStyle, content: &str);
    /// A two-cell row: prompt left, value right.
    fn row(&mut self, left: &str, right: &str);
    /// A horizontal rule.
    fn rule(&mut self);
    /// The drawn signature ink, embedded behind the signature block.
    fn signature_image(&mut self, strokes: &[Stroke], canvas_size: (f32, f32));
    /// Produce the final byte stream; `None` means the backend could not.
    fn finish(self) -> Option<Vec<u8>>;
}

/// Render the document content in order: timestamp block, title header, then
/// one render unit per section.
pub(crate) fn render_document<B: RenderBackend>(
    sections: &[Section],
    responses: &HashMap<String, SectionValue>,
    frontmatter: &BTreeMap<String, String>,
    signature_date: Option<&str>,
    config: &ExportConfiguration,
    mut backend: B,
) -> Result<Vec<u8>, ExportError> {
    backend.begin(config);

    if config.include_timestamp {
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        backend.text(TextStyle::Caption, &format!("Exported on {now}"));
    }

    let title = config
        .title_override
        .as_deref()
        .or_else(|| frontmatter.get("title").map(String::as_str))
        .unwrap_or("");
    if !title.is_empty() {
        backend.text(TextStyle::Title, title);
    }

    for section in sections {
        render_section(section, responses, signature_date, &mut backend);
    }

    backend.finish().ok_or(ExportError::UnableToProducePdf)
}

fn render_section<B: RenderBackend>(
    section: &Section,
    responses: &HashMap<String, SectionValue>,
    signature_date: Option<&str>,
    backend: &mut B,
) {
    match section {
        Section::Markdown { text } => {
            let formatted = format_inline_markdown(text)
                .unwrap_or_else(|| MARKDOWN_FAILURE_PLACEHOLDER.to_string());
            backend.text(TextStyle::Body, &formatted);
        }
        Section::Toggle { id, prompt, .. } => {
            let value = match responses.get(id.as_str()) {
                Some(SectionValue::Toggle(value)) => *value,
                _ => unreachable!("a response is registered for every toggle section"),
            };
            backend.row(prompt, if value { YES_LABEL } else { NO_LABEL });
        }
        Section::Select {
            id,
            prompt,
            options,
            ..
        } => {
            let selection = match responses.get(id.as_str()) {
                Some(SectionValue::Selection(selection)) => selection.as_str(),
                _ => unreachable!("a response is registered for every select section"),
            };
            let value = options
                .iter()
                .find(|option| option.id == selection)
                .map(|option| option.title.as_str())
                .unwrap_or("");
            backend.row(prompt, value);
        }
        Section::Signature { id } => {
            let signature = match responses.get(id.as_str()) {
                Some(SectionValue::Signature(signature)) => signature,
                _ => unreachable!("a response is registered for every signature section"),
            };
            match &signature.ink {
                SignatureInk::Drawn(strokes) if !strokes.is_empty() => {
                    backend.signature_image(strokes, signature.canvas_size);
                }
                SignatureInk::Typed(text) if !text.trim().is_empty() => {
                    backend.text(TextStyle::Body, text.trim());
                }
                _ => {}
            }
            backend.text(TextStyle::Body, "X");
            backend.rule();
            backend.row(&signature.name.formatted(), signature_date.unwrap_or(""));
        }
    }
}

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_]([^*_]+)[*_]").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}[ \t]+").unwrap());

/// Reduce an inline markdown run to plain text: emphasis and code markers
/// dropped, heading markers stripped. `None` when the run cannot be
/// formatted (unbalanced inline code).
fn format_inline_markdown(text: &str) -> Option<String> {
    if text.matches('`').count() % 2 != 0 {
        return None;
    }
    let formatted = BOLD.replace_all(text, "$1");
    let formatted = EMPHASIS.replace_all(&formatted, "$1");
    let formatted = INLINE_CODE.replace_all(&formatted, "$1");
    let formatted = HEADING.replace_all(&formatted, "");
    Some(formatted.trim().to_string())
}

/// Deterministic text backend: one line per render unit, suitable for tests
/// and the CLI. Hosts with a real PDF engine implement [`RenderBackend`]
/// themselves.
#[derive(Debug, Default)]
pub struct PlainTextBackend {
    lines: Vec<String>,
}

impl PlainTextBackend {
    pub fn new() -> Self {
        PlainTextBackend::default()
    }
}

const RULE_WIDTH: usize = 42;

impl RenderBackend for PlainTextBackend {
    fn begin(&mut self, config: &ExportConfiguration) {
        let paper = match config.paper_size {
            PaperSize::A4 => "A4".to_string(),
            PaperSize::UsLetter => "US Letter".to_string(),
            PaperSize::Custom { width, height } => format!("{width}x{height}pt"),
        };
        self.lines.push(format!("% paper: {paper}"));
    }

    fn text(&mut self, style: TextStyle, content: &str) {
        match style {
            TextStyle::Title => {
                self.lines.push(content.to_string());
                self.lines.push("=".repeat(content.chars().count()));
            }
            TextStyle::Body => self.lines.push(content.to_string()),
            TextStyle::Caption => self.lines.push(format!("({content})")),
        }
    }

    fn row(&mut self, left: &str, right: &str) {
        self.lines.push(format!("{left:<32} {right}"));
    }

    fn rule(&mut self) {
        self.lines.push("-".repeat(RULE_WIDTH));
    }

    fn signature_image(&mut self, strokes: &[Stroke], canvas_size: (f32, f32)) {
        let (width, height) = canvas_size;
        self.lines.push(format!(
            "[signature ink: {} strokes on {width}x{height}]",
            strokes.len()
        ));
    }

    fn finish(self) -> Option<Vec<u8>> {
        let mut output = self.lines.join("\n");
        output.push('\n');
        Some(output.into_bytes())
    }
}
