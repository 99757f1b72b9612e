//! Markup decoder
//!
//!     Consent documents are markdown text extended with a narrow tag syntax
//!     for interactive elements. This module decodes a document body into a
//!     flat tree of nodes: literal text runs and named elements with
//!     attributes and children.
//!
//!     Only the four recognized tag names (`toggle`, `select`, `option`,
//!     `signature`) are treated as elements. Anything else that looks like a
//!     tag stays literal text, so ordinary markdown containing `<` or unknown
//!     HTML-ish tags passes through untouched.
//!
//! Lexing
//!
//!     Decoding runs two logos lexers joined with `morph`: a body lexer that
//!     splits text runs from tag openers, and an attribute lexer used inside
//!     a tag up to the closing `>` or `/>`. Attributes are `key=value` or
//!     `key="quoted value"` pairs.

use logos::Logos;
use thiserror::Error;

/// Tag names the decoder recognizes as elements.
pub const KNOWN_ELEMENTS: [&str; 4] = ["toggle", "select", "option", "signature"];

/// Structural errors in the custom-tag syntax.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("element `{0}` is never closed")]
    UnclosedElement(String),
    #[error("closing tag `</{found}>` does not match open element `{expected}`")]
    MismatchedClosing { expected: String, found: String },
    #[error("closing tag `</{0}>` has no matching open element")]
    UnexpectedClosing(String),
    #[error("tag `{0}` is not terminated")]
    UnterminatedTag(String),
    #[error("attribute `{0}` has no value")]
    AttributeWithoutValue(String),
    #[error("unexpected `{0}` inside tag")]
    UnexpectedTagToken(String),
}

/// One decoded content node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A literal text run (markdown, left opaque).
    Text(String),
    Element(Element),
}

/// A recognized tag with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// First value for an attribute name, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All text children, in order, with surrounding whitespace trimmed and
    /// whitespace-only runs dropped.
    pub fn text_children(&self) -> Vec<&str> {
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Text(text) => {
                    let trimmed = text.trim();
                    (!trimmed.is_empty()).then_some(trimmed)
                }
                Node::Element(_) => None,
            })
            .collect()
    }
}

#[derive(Logos, Debug, PartialEq)]
enum BodyToken {
    // An opener for a possible tag: `<name` or `</name`. Whether it really is
    // an element depends on the name; unknown names fall back to literal text.
    #[regex(r"</?[A-Za-z][A-Za-z0-9_-]*")]
    TagOpen,

    #[regex(r"[^<]+")]
    Text,

    // A `<` that does not start a name.
    #[token("<")]
    Lt,
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum TagToken {
    #[regex(r#"[^ \t\r\n"=<>/]+"#, |lexer| lexer.slice().to_string())]
    Word(String),

    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#, |lexer| {
        let slice = lexer.slice();
        slice[1..slice.len() - 1].to_string()
    })]
    Quoted(String),

    #[token(">")]
    Close,

    #[token("/>")]
    SelfClose,
}

// An element whose closing tag has not been seen yet.
struct Frame {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

/// Decode a document body into nodes.
///
/// Adjacent literal runs are merged, so the result never holds two `Text`
/// nodes in a row.
pub fn decode(body: &str) -> Result<Vec<Node>, MarkupError> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut lexer = BodyToken::lexer(body);

    while let Some(token) = lexer.next() {
        match token {
            Ok(BodyToken::Text) | Ok(BodyToken::Lt) | Err(()) => {
                push_text(&mut root, &mut stack, lexer.slice());
            }
            Ok(BodyToken::TagOpen) => {
                let slice = lexer.slice();
                let closing = slice.starts_with("</");
                let name = slice.trim_start_matches('<').trim_start_matches('/');
                if !KNOWN_ELEMENTS.contains(&name) {
                    // Not our syntax; keep it as literal markdown.
                    push_text(&mut root, &mut stack, slice);
                    continue;
                }
                let name = name.to_string();
                let mut tag_lexer = lexer.morph::<TagToken>();
                if closing {
                    expect_close(&mut tag_lexer, &name)?;
                    let frame = stack
                        .pop()
                        .ok_or_else(|| MarkupError::UnexpectedClosing(name.clone()))?;
                    if frame.name != name {
                        return Err(MarkupError::MismatchedClosing {
                            expected: frame.name,
                            found: name,
                        });
                    }
                    attach(&mut root, &mut stack, frame);
                } else {
                    let (attributes, self_closed) = decode_attributes(&mut tag_lexer, &name)?;
                    let frame = Frame {
                        name,
                        attributes,
                        children: Vec::new(),
                    };
                    if self_closed {
                        attach(&mut root, &mut stack, frame);
                    } else {
                        stack.push(frame);
                    }
                }
                lexer = tag_lexer.morph();
            }
        }
    }

    if let Some(frame) = stack.pop() {
        return Err(MarkupError::UnclosedElement(frame.name));
    }
    Ok(root)
}

fn push_text(root: &mut Vec<Node>, stack: &mut [Frame], text: &str) {
    let target = match stack.last_mut() {
        Some(frame) => &mut frame.children,
        None => root,
    };
    // Merge adjacent literal runs.
    if let Some(Node::Text(existing)) = target.last_mut() {
        existing.push_str(text);
    } else {
        target.push(Node::Text(text.to_string()));
    }
}

fn attach(root: &mut Vec<Node>, stack: &mut [Frame], frame: Frame) {
    let element = Node::Element(Element {
        name: frame.name,
        attributes: frame.attributes,
        children: frame.children,
    });
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => root.push(element),
    }
}

fn expect_close(lexer: &mut logos::Lexer<'_, TagToken>, name: &str) -> Result<(), MarkupError> {
    match lexer.next() {
        Some(Ok(TagToken::Close)) => Ok(()),
        _ => Err(MarkupError::UnterminatedTag(name.to_string())),
    }
}

// Attributes run until `>` or `/>`. Returns whether the tag self-closed.
fn decode_attributes(
    lexer: &mut logos::Lexer<'_, TagToken>,
    name: &str,
) -> Result<(Vec<(String, String)>, bool), MarkupError> {
    let mut attributes = Vec::new();
    loop {
        match lexer.next() {
            Some(Ok(TagToken::Close)) => return Ok((attributes, false)),
            Some(Ok(TagToken::SelfClose)) => return Ok((attributes, true)),
            Some(Ok(TagToken::Word(key))) => {
                match lexer.next() {
                    Some(Ok(TagToken::Eq)) => {}
                    _ => return Err(MarkupError::AttributeWithoutValue(key)),
                }
                let value = match lexer.next() {
                    Some(Ok(TagToken::Word(value))) => value,
                    Some(Ok(TagToken::Quoted(value))) => value,
                    _ => return Err(MarkupError::AttributeWithoutValue(key)),
                };
                attributes.push((key, value));
            }
            Some(Ok(TagToken::Quoted(value))) => {
                return Err(MarkupError::UnexpectedTagToken(format!("\"{value}\"")))
            }
            Some(Ok(TagToken::Eq)) => return Err(MarkupError::UnexpectedTagToken("=".into())),
            Some(Err(())) | None => return Err(MarkupError::UnterminatedTag(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(element) => element,
            Node::Text(text) => panic!("expected element, found text {text:?}"),
        }
    }

    #[test]
    fn test_plain_text_is_one_merged_run() {
        let nodes = decode("Hello *world*,\nmore text.").unwrap();
        assert_eq!(nodes, vec![Node::Text("Hello *world*,\nmore text.".into())]);
    }

    #[test]
    fn test_toggle_with_bare_and_quoted_attributes() {
        let nodes = decode(r#"<toggle id=a expected-value="true">I agree</toggle>"#).unwrap();
        assert_eq!(nodes.len(), 1);
        let toggle = element(&nodes[0]);
        assert_eq!(toggle.name, "toggle");
        assert_eq!(toggle.attribute("id"), Some("a"));
        assert_eq!(toggle.attribute("expected-value"), Some("true"));
        assert_eq!(toggle.children, vec![Node::Text("I agree".into())]);
    }

    #[test]
    fn test_select_with_option_children() {
        let nodes =
            decode("<select id=s>Pick one <option id=o1>A</option><option id=o2>B</option></select>")
                .unwrap();
        let select = element(&nodes[0]);
        assert_eq!(select.name, "select");
        assert_eq!(select.text_children(), vec!["Pick one"]);
        let options: Vec<_> = select
            .children
            .iter()
            .filter_map(|child| match child {
                Node::Element(inner) => Some(inner),
                Node::Text(_) => None,
            })
            .collect();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].attribute("id"), Some("o1"));
        assert_eq!(options[1].text_children(), vec!["B"]);
    }

    #[test]
    fn test_self_closing_signature() {
        let nodes = decode("before <signature id=sig /> after").unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(element(&nodes[1]).name, "signature");
        assert_eq!(nodes[2], Node::Text(" after".into()));
    }

    #[test]
    fn test_unknown_tags_stay_literal() {
        let nodes = decode("a <b>bold</b> c").unwrap();
        assert_eq!(nodes, vec![Node::Text("a <b>bold</b> c".into())]);
    }

    #[test]
    fn test_stray_angle_bracket_stays_literal() {
        let nodes = decode("1 < 2 and 3 > 2").unwrap();
        assert_eq!(nodes, vec![Node::Text("1 < 2 and 3 > 2".into())]);
    }

    #[test]
    fn test_unclosed_element_is_an_error() {
        let result = decode("<toggle id=a>never closed");
        assert_eq!(result, Err(MarkupError::UnclosedElement("toggle".into())));
    }

    #[test]
    fn test_mismatched_closing_is_an_error() {
        let result = decode("<select id=s><option id=o>A</select>");
        assert_eq!(
            result,
            Err(MarkupError::MismatchedClosing {
                expected: "option".into(),
                found: "select".into(),
            })
        );
    }

    #[test]
    fn test_attribute_without_value_is_an_error() {
        let result = decode("<toggle id>x</toggle>");
        assert_eq!(result, Err(MarkupError::AttributeWithoutValue("id".into())));
    }

    #[test]
    fn test_unexpected_closing_is_an_error() {
        let result = decode("text </toggle>");
        assert_eq!(result, Err(MarkupError::UnexpectedClosing("toggle".into())));
    }
}
