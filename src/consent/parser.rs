//! Document parser
//!
//! Turns raw consent markdown into a frontmatter map plus an ordered section
//! list. Parsing is staged the usual way: split off the frontmatter block,
//! decode the body into markup nodes, then validate each recognized element
//! into a typed [`Section`]. Literal runs between elements are merged, so the
//! section list never contains two adjacent markdown sections.
//!
//! With custom elements disabled the whole body becomes one markdown section
//! plus one synthetic signature section - the plain terms-of-service fallback
//! for documents without structured fields.

use std::collections::BTreeMap;

use thiserror::Error;

use super::markup::{self, Element, MarkupError, Node};
use super::section::{Section, SelectOption, SelectionPolicy, DEFAULT_SIGNATURE_ID};

/// Typed parse failure. Input errors are recoverable: the caller shows an
/// error state and may retry with corrected input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("input is not valid UTF-8")]
    InputNotUtf8,
    #[error("frontmatter: {0}")]
    Frontmatter(String),
    #[error(transparent)]
    Markup(#[from] MarkupError),
    #[error("missing attribute `{0}`")]
    MissingAttribute(&'static str),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("unexpected element `{0}`")]
    UnexpectedElement(String),
    #[error("duplicate element id `{0}`")]
    DuplicateElementId(String),
    #[error("{0}")]
    Other(String),
}

/// Parser mode flags.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// When false, the custom-tag syntax is bypassed entirely and the body is
    /// treated as one opaque markdown run followed by a default signature
    /// section.
    pub custom_elements: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            custom_elements: true,
        }
    }
}

/// Parse output: metadata plus the ordered section list.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub frontmatter: BTreeMap<String, String>,
    pub sections: Vec<Section>,
}

/// Parse a consent document from UTF-8 text.
pub fn parse_document(source: &str, options: &ParseOptions) -> Result<ParsedDocument, ParseError> {
    let (frontmatter, body) = split_frontmatter(source)?;

    if !options.custom_elements {
        return Ok(ParsedDocument {
            frontmatter,
            sections: vec![
                Section::Markdown {
                    text: body.to_string(),
                },
                Section::Signature {
                    id: DEFAULT_SIGNATURE_ID.to_string(),
                },
            ],
        });
    }

    let nodes = markup::decode(body)?;
    let mut sections = Vec::new();
    for node in nodes {
        match node {
            Node::Text(text) => {
                if !text.trim().is_empty() {
                    sections.push(Section::Markdown { text });
                }
            }
            Node::Element(element) => sections.push(build_section(element)?),
        }
    }
    Ok(ParsedDocument {
        frontmatter,
        sections,
    })
}

// Frontmatter is a leading block of `key: value` lines delimited by `---`
// lines. Absent frontmatter leaves the whole source as body.
fn split_frontmatter(source: &str) -> Result<(BTreeMap<String, String>, &str), ParseError> {
    let Some(rest) = source.strip_prefix("---") else {
        return Ok((BTreeMap::new(), source));
    };
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return Ok((BTreeMap::new(), source));
    };
    let Some(end) = rest.find("\n---").map(|at| at + 1) else {
        return Err(ParseError::Frontmatter(
            "frontmatter block is never closed".to_string(),
        ));
    };
    let block = &rest[..end];
    let after = rest[end + "---".len()..].trim_start_matches('\r');
    let body = after.strip_prefix('\n').unwrap_or(after);

    let values: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(block)
        .map_err(|error| ParseError::Frontmatter(error.to_string()))?;
    let mut frontmatter = BTreeMap::new();
    for (key, value) in values {
        frontmatter.insert(key, scalar_to_string(value)?);
    }
    Ok((frontmatter, body))
}

fn scalar_to_string(value: serde_yaml::Value) -> Result<String, ParseError> {
    match value {
        serde_yaml::Value::String(text) => Ok(text),
        serde_yaml::Value::Number(number) => Ok(number.to_string()),
        serde_yaml::Value::Bool(flag) => Ok(flag.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        other => Err(ParseError::Frontmatter(format!(
            "frontmatter values must be scalars, found {other:?}"
        ))),
    }
}

fn build_section(element: Element) -> Result<Section, ParseError> {
    match element.name.as_str() {
        "toggle" => build_toggle(element),
        "select" => build_select(element),
        "signature" => build_signature(element),
        // `option` is only meaningful inside `select`.
        other => Err(ParseError::UnexpectedElement(other.to_string())),
    }
}

fn build_toggle(element: Element) -> Result<Section, ParseError> {
    let id = required_attribute(&element, "id")?;
    let prompt = element
        .text_children()
        .first()
        .map(|text| text.to_string())
        .ok_or(ParseError::MissingField("prompt"))?;
    let initial_value = match element.attribute("initial-value") {
        Some(value) => parse_bool("initial-value", value)?,
        None => false,
    };
    let expected_value = element
        .attribute("expected-value")
        .map(|value| parse_bool("expected-value", value))
        .transpose()?;
    Ok(Section::Toggle {
        id,
        prompt,
        initial_value,
        expected_value,
    })
}

fn build_select(element: Element) -> Result<Section, ParseError> {
    let id = required_attribute(&element, "id")?;
    let prompt = element.text_children().join(" ");

    let mut options = Vec::new();
    for child in &element.children {
        let Node::Element(inner) = child else {
            continue;
        };
        if inner.name != "option" {
            return Err(ParseError::UnexpectedElement(inner.name.clone()));
        }
        let option_id = inner
            .attribute("id")
            .filter(|value| !value.is_empty())
            .ok_or(ParseError::MissingAttribute("option.id"))?;
        let title = inner
            .text_children()
            .first()
            .map(|text| text.to_string())
            .ok_or(ParseError::MissingField("option.content"))?;
        options.push(SelectOption {
            id: option_id.to_string(),
            title,
        });
    }

    let initial_selection = element.attribute("initial-value").unwrap_or("").to_string();
    if !initial_selection.is_empty()
        && !options.iter().any(|option| option.id == initial_selection)
    {
        return Err(ParseError::Other(format!(
            "initial-value `{initial_selection}` does not reference an option of select `{id}`"
        )));
    }

    let expected_selection = match element.attribute("expected-value") {
        None => SelectionPolicy::Anything { allow_empty: true },
        Some("*") => SelectionPolicy::Anything { allow_empty: false },
        Some("") => return Err(ParseError::MissingAttribute("expected-value")),
        Some(expected) => {
            if !options.iter().any(|option| option.id == expected) {
                return Err(ParseError::Other(format!(
                    "expected-value `{expected}` does not reference an option of select `{id}`"
                )));
            }
            SelectionPolicy::Exactly(expected.to_string())
        }
    };

    Ok(Section::Select {
        id,
        prompt,
        options,
        initial_selection,
        expected_selection,
    })
}

fn build_signature(element: Element) -> Result<Section, ParseError> {
    let id = element
        .attribute("id")
        .filter(|value| !value.is_empty())
        .ok_or(ParseError::MissingField("id"))?;
    Ok(Section::Signature { id: id.to_string() })
}

fn required_attribute(element: &Element, name: &'static str) -> Result<String, ParseError> {
    element
        .attribute(name)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .ok_or(ParseError::MissingAttribute(name))
}

fn parse_bool(attribute: &str, value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ParseError::Other(format!(
            "attribute `{attribute}` expects a boolean, found `{other}`"
        ))),
    }
}
