//! Parsing consent documents: frontmatter, element validation, fallbacks.

use rstest::rstest;

use onboarding::consent::{
    ConsentDocument, ParseError, ParseOptions, Section, SelectionPolicy, DEFAULT_SIGNATURE_ID,
};

fn parse(source: &str) -> Result<ConsentDocument, ParseError> {
    ConsentDocument::from_markdown(source)
}

#[test]
fn frontmatter_reaches_the_document() {
    let document = parse("---\ntitle: Study Consent\nversion: 2\n---\nBody").unwrap();
    assert_eq!(document.title(), Some("Study Consent"));
    assert_eq!(document.frontmatter().get("version").unwrap(), "2");
}

#[test]
fn markdown_runs_between_elements_are_merged() {
    let source = "\
First paragraph.

Second paragraph.
<toggle id=agree>I agree</toggle>
Tail *text* after the toggle
spanning two lines.
<signature id=sig />";
    let document = parse(source).unwrap();

    let interactive: Vec<bool> = document
        .sections()
        .iter()
        .map(Section::is_interactive)
        .collect();
    assert_eq!(interactive, vec![false, true, false, true]);
}

#[test]
fn toggle_roundtrip_matches_the_authored_attributes() {
    let document = parse("<toggle id=a expected-value=true>Prompt</toggle>").unwrap();
    assert_eq!(
        document.sections(),
        &[Section::Toggle {
            id: "a".into(),
            prompt: "Prompt".into(),
            initial_value: false,
            expected_value: Some(true),
        }]
    );
    assert!(!document.toggle_value("a"));
}

#[rstest]
#[case("<toggle>Prompt</toggle>", ParseError::MissingAttribute("id"))]
#[case("<toggle id=\"\">Prompt</toggle>", ParseError::MissingAttribute("id"))]
#[case("<toggle id=a></toggle>", ParseError::MissingField("prompt"))]
#[case("<signature />", ParseError::MissingField("id"))]
#[case("<signature id=\"\" />", ParseError::MissingField("id"))]
#[case(
    "<select id=s><option>A</option></select>",
    ParseError::MissingAttribute("option.id")
)]
#[case(
    "<select id=s><option id=o1></option></select>",
    ParseError::MissingField("option.content")
)]
#[case(
    "<select id=s expected-value=\"\"><option id=o1>A</option></select>",
    ParseError::MissingAttribute("expected-value")
)]
fn malformed_elements_fail_with_typed_errors(
    #[case] source: &str,
    #[case] expected: ParseError,
) {
    assert_eq!(parse(source).unwrap_err(), expected);
}

#[test]
fn select_without_expectations_allows_anything() {
    let document =
        parse("<select id=s><option id=o1>A</option><option id=o2>B</option></select>").unwrap();
    match &document.sections()[0] {
        Section::Select {
            options,
            initial_selection,
            expected_selection,
            ..
        } => {
            assert_eq!(options.len(), 2);
            assert_eq!(initial_selection, "");
            assert_eq!(
                expected_selection,
                &SelectionPolicy::Anything { allow_empty: true }
            );
        }
        other => panic!("expected a select section, found {other:?}"),
    }
}

#[test]
fn select_rejects_non_option_children() {
    let result = parse("<select id=s><signature id=x /></select>");
    assert_eq!(
        result.unwrap_err(),
        ParseError::UnexpectedElement("signature".into())
    );
}

#[test]
fn select_prompt_joins_free_text_children() {
    let document = parse(
        "<select id=s>Choose <option id=o1>A</option> your plan <option id=o2>B</option></select>",
    )
    .unwrap();
    match &document.sections()[0] {
        Section::Select { prompt, .. } => assert_eq!(prompt, "Choose your plan"),
        other => panic!("expected a select section, found {other:?}"),
    }
}

#[test]
fn duplicate_ids_across_section_kinds_are_rejected() {
    let result = parse("<toggle id=x>Ok</toggle><select id=x><option id=o>A</option></select>");
    assert_eq!(result.unwrap_err(), ParseError::DuplicateElementId("x".into()));
}

#[test]
fn plain_terms_fallback_produces_markdown_plus_default_signature() {
    let options = ParseOptions {
        custom_elements: false,
    };
    let document = ConsentDocument::with_options("Hello", &options).unwrap();
    assert_eq!(
        document.sections(),
        &[
            Section::Markdown {
                text: "Hello".into()
            },
            Section::Signature {
                id: DEFAULT_SIGNATURE_ID.into()
            },
        ]
    );
}

#[test]
fn unknown_tags_and_angle_brackets_stay_literal_markdown() {
    let document = parse("Use <em>care</em>: 1 < 2.").unwrap();
    assert_eq!(
        document.sections(),
        &[Section::Markdown {
            text: "Use <em>care</em>: 1 < 2.".into()
        }]
    );
}

#[test]
fn invalid_utf8_is_a_typed_input_error() {
    let result = ConsentDocument::from_bytes(b"\xf0\x28\x8c\x28", &ParseOptions::default());
    assert_eq!(result.unwrap_err(), ParseError::InputNotUtf8);
}

#[tokio::test]
async fn documents_load_from_files_off_thread() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("consent.md");
    std::fs::write(
        &path,
        "---\ntitle: Loaded\n---\n<toggle id=ok>Fine by me</toggle>",
    )
    .unwrap();

    let document = ConsentDocument::load_from_path(&path, &ParseOptions::default())
        .await
        .unwrap();
    assert_eq!(document.title(), Some("Loaded"));
    assert_eq!(document.sections().len(), 1);
}

#[tokio::test]
async fn missing_files_surface_io_errors() {
    let result =
        ConsentDocument::load_from_path("does-not-exist.md", &ParseOptions::default()).await;
    assert!(matches!(
        result,
        Err(onboarding::consent::LoadError::Io(_))
    ));
}
