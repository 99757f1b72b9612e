//! Export rendering over the plain-text backend.

use onboarding::consent::{
    ConsentDocument, ExportConfiguration, ExportError, PersonName, PlainTextBackend,
    RenderBackend, Stroke, TextStyle,
};

fn export(document: &mut ConsentDocument, config: &ExportConfiguration) -> String {
    let bytes = document.export(config, PlainTextBackend::new()).unwrap();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn identical_state_renders_byte_identical_output() {
    let source = "---\ntitle: Consent\n---\nIntro.\n<toggle id=a>I agree</toggle>";
    let mut first = ConsentDocument::from_markdown(source).unwrap();
    let mut second = ConsentDocument::from_markdown(source).unwrap();
    let config = ExportConfiguration::default();

    assert_eq!(export(&mut first, &config), export(&mut second, &config));
}

#[test]
fn timestamp_block_only_appears_when_requested() {
    let mut document = ConsentDocument::from_markdown("Text").unwrap();

    let without = export(&mut document, &ExportConfiguration::default());
    assert!(!without.contains("Exported on"));

    let config = ExportConfiguration {
        include_timestamp: true,
        ..ExportConfiguration::default()
    };
    let with = export(&mut document, &config);
    assert!(with.contains("Exported on"));
}

#[test]
fn title_comes_from_frontmatter_unless_overridden() {
    let mut document = ConsentDocument::from_markdown("---\ntitle: Original\n---\nText").unwrap();
    let output = export(&mut document, &ExportConfiguration::default());
    assert!(output.contains("Original"));

    let config = ExportConfiguration {
        title_override: Some("Overridden".into()),
        ..ExportConfiguration::default()
    };
    let output = export(&mut document, &config);
    assert!(output.contains("Overridden"));
    assert!(!output.contains("Original"));
}

#[test]
fn toggle_rows_show_localizable_yes_no_labels() {
    let mut document =
        ConsentDocument::from_markdown("<toggle id=a>Share my data</toggle>").unwrap();
    let output = export(&mut document, &ExportConfiguration::default());
    assert!(output.contains("Share my data"));
    assert!(output.contains("No"));

    document.set_toggle_value("a", true);
    let output = export(&mut document, &ExportConfiguration::default());
    assert!(output.contains("Yes"));
}

#[test]
fn select_rows_show_the_selected_option_title_or_blank() {
    let source = "<select id=s>Plan <option id=o1>Weekly</option><option id=o2>Monthly</option></select>";
    let mut document = ConsentDocument::from_markdown(source).unwrap();

    // No selection: blank right cell, option titles absent.
    let output = export(&mut document, &ExportConfiguration::default());
    assert!(!output.contains("Weekly"));
    assert!(!output.contains("Monthly"));

    document.set_selection("s", "o2");
    let output = export(&mut document, &ExportConfiguration::default());
    assert!(output.contains("Monthly"));
    assert!(!output.contains("Weekly"));
}

#[test]
fn signature_block_renders_name_date_and_ink() {
    let mut document = ConsentDocument::from_markdown("<signature id=sig />").unwrap();
    {
        let signature = document.signature_mut("sig");
        signature.name = PersonName::new("Jane", "Doe");
        signature.add_stroke(Stroke {
            points: vec![(0.0, 0.0), (40.0, 10.0)],
        });
    }
    document.set_signature_date(Some("2026-08-23".into()));

    let output = export(&mut document, &ExportConfiguration::default());
    assert!(output.contains("signature ink: 1 strokes"));
    assert!(output.contains('X'));
    assert!(output.contains("Jane Doe"));
    assert!(output.contains("2026-08-23"));
}

#[test]
fn typed_signatures_render_as_literal_text() {
    let mut document = ConsentDocument::from_markdown("<signature id=sig />").unwrap();
    document.signature_mut("sig").set_typed_text("Jane Q. Doe");

    let output = export(&mut document, &ExportConfiguration::default());
    assert!(output.contains("Jane Q. Doe"));
    assert!(!output.contains("signature ink"));
}

#[test]
fn malformed_markdown_runs_render_a_placeholder_not_a_failure() {
    let mut document =
        ConsentDocument::from_markdown("An unbalanced `code span\n<signature id=sig />").unwrap();
    let output = export(&mut document, &ExportConfiguration::default());
    assert!(output.contains("loading error"));
}

#[test]
fn a_backend_that_produces_nothing_is_an_export_error() {
    struct BrokenBackend;

    impl RenderBackend for BrokenBackend {
        fn begin(&mut self, _config: &ExportConfiguration) {}
        fn text(&mut self, _style: TextStyle, _content: &str) {}
        fn row(&mut self, _left: &str, _right: &str) {}
        fn rule(&mut self) {}
        fn signature_image(&mut self, _strokes: &[Stroke], _canvas_size: (f32, f32)) {}
        fn finish(self) -> Option<Vec<u8>> {
            None
        }
    }

    let mut document = ConsentDocument::from_markdown("Text").unwrap();
    let result = document.export(&ExportConfiguration::default(), BrokenBackend);
    assert_eq!(result.unwrap_err(), ExportError::UnableToProducePdf);
    assert!(!document.is_exporting());
}

#[tokio::test]
async fn off_thread_export_matches_the_synchronous_render() {
    let source = "---\ntitle: Consent\n---\n<toggle id=a>I agree</toggle>";
    let mut document = ConsentDocument::from_markdown(source).unwrap();
    let config = ExportConfiguration::default();

    let synchronous = document
        .export(&config, PlainTextBackend::new())
        .unwrap();
    let off_thread = document
        .export_off_thread(&config, PlainTextBackend::new())
        .await
        .unwrap();

    assert_eq!(synchronous, off_thread);
    assert!(!document.is_exporting());
}
