//! # onboarding
//!
//! Building blocks for guided, multi-step onboarding flows in applications:
//! a step-identity and navigation-path state machine ([`flow`]), and a
//! consent-document model with parsing, per-field response tracking,
//! completion verdicts, and deterministic export rendering ([`consent`]).
//!
//! The two subsystems are independent: a host presents whichever view the
//! [`flow::NavigationPath`] resolves, and a consent step inside that flow
//! owns a [`consent::ConsentDocument`] whose completion state gates
//! submission.

pub mod consent;
pub mod flow;

pub use consent::{CompletionState, ConsentDocument, ExportConfiguration, ParseOptions};
pub use flow::{FlowRegistry, NavigationPath, StepIdentifier};
