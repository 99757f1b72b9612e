//! Flow navigation
//!
//! The flow subsystem drives guided, multi-step onboarding runs: a flow is an
//! ordered sequence of declared steps, each keyed by a [`StepIdentifier`],
//! with a [`NavigationPath`] cursor walking the order and a side table of
//! custom steps appended at runtime.
//!
//! Navigation state is owned by the presentation layer and mutated on one
//! logical thread; nothing here is persisted across process restarts.

pub mod identifier;
pub mod path;
pub mod registry;

pub use identifier::StepIdentifier;
pub use path::NavigationPath;
pub use registry::{FlowError, FlowRegistry, PresentableStep};
