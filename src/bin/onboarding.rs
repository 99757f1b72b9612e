//! Command-line interface for consent documents
//! This binary inspects, validates, and exports consent files authored in the
//! markdown-plus-custom-tags format.
//!
//! Usage:
//!   onboarding inspect `<path>` [--json] [--plain]     - Show frontmatter and sections
//!   onboarding validate `<path>` [--plain]             - Report the completion verdict
//!   onboarding export `<path>` -o `<out>` [--timestamp] - Render with the text backend

use clap::{Arg, ArgAction, Command};
use serde_json::json;

use onboarding::consent::{
    CompletionState, ConsentDocument, ExportConfiguration, ParseOptions, PlainTextBackend,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let matches = Command::new("onboarding")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for inspecting and exporting consent documents")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("inspect")
                .about("Show frontmatter and the section list")
                .arg(Arg::new("path").help("Path to the consent file").required(true))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Emit JSON instead of a summary")
                        .action(ArgAction::SetTrue),
                )
                .arg(plain_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Report the completion verdict of the freshly parsed document")
                .arg(Arg::new("path").help("Path to the consent file").required(true))
                .arg(plain_arg()),
        )
        .subcommand(
            Command::new("export")
                .about("Render the document with the plain-text backend")
                .arg(Arg::new("path").help("Path to the consent file").required(true))
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .help("Output file")
                        .required(true),
                )
                .arg(
                    Arg::new("timestamp")
                        .long("timestamp")
                        .help("Include an export timestamp block")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("title")
                        .long("title")
                        .help("Override the document title"),
                )
                .arg(plain_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("inspect", sub)) => handle_inspect(sub),
        Some(("validate", sub)) => handle_validate(sub),
        Some(("export", sub)) => handle_export(sub),
        _ => unreachable!("arg_required_else_help"),
    }
}

fn plain_arg() -> Arg {
    Arg::new("plain")
        .long("plain")
        .help("Treat the body as plain terms of service (no custom elements)")
        .action(ArgAction::SetTrue)
}

fn load(sub: &clap::ArgMatches) -> ConsentDocument {
    let path = sub.get_one::<String>("path").expect("path is required");
    let options = ParseOptions {
        custom_elements: !sub.get_flag("plain"),
    };
    ConsentDocument::from_path(path, &options).unwrap_or_else(|error| {
        eprintln!("Could not load {path}: {error}");
        std::process::exit(1);
    })
}

fn handle_inspect(sub: &clap::ArgMatches) {
    let document = load(sub);

    if sub.get_flag("json") {
        let value = json!({
            "frontmatter": document.frontmatter(),
            "sections": document.sections(),
            "completion": document.completion_state(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).expect("document state serializes")
        );
        return;
    }

    for (key, value) in document.frontmatter() {
        println!("{key}: {value}");
    }
    if !document.frontmatter().is_empty() {
        println!();
    }
    for section in document.sections() {
        match section.id() {
            Some(id) => println!("[{id}] {kind}", kind = section_kind(section)),
            None => println!("(markdown)"),
        }
    }
}

fn handle_validate(sub: &clap::ArgMatches) {
    let document = load(sub);
    match document.completion_state() {
        CompletionState::Complete => println!("complete"),
        CompletionState::Incomplete { section_id } => {
            println!("incomplete: first unsatisfied section is `{section_id}`");
            std::process::exit(1);
        }
    }
}

fn handle_export(sub: &clap::ArgMatches) {
    let mut document = load(sub);
    let config = ExportConfiguration {
        include_timestamp: sub.get_flag("timestamp"),
        title_override: sub.get_one::<String>("title").cloned(),
        ..ExportConfiguration::default()
    };

    let bytes = document
        .export(&config, PlainTextBackend::new())
        .unwrap_or_else(|error| {
            eprintln!("Export failed: {error}");
            std::process::exit(1);
        });

    let out = sub.get_one::<String>("out").expect("out is required");
    if let Err(error) = std::fs::write(out, bytes) {
        eprintln!("Could not write {out}: {error}");
        std::process::exit(1);
    }
}

fn section_kind(section: &onboarding::consent::Section) -> &'static str {
    use onboarding::consent::Section;
    match section {
        Section::Markdown { .. } => "markdown",
        Section::Toggle { .. } => "toggle",
        Section::Select { .. } => "select",
        Section::Signature { .. } => "signature",
    }
}
