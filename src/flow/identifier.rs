//! Step identity
//!
//! Every step in a flow is keyed by a `StepIdentifier`. Identity comes from one
//! of two sources:
//!
//!     1. A declared identity value supplied by the caller. Any hashable value
//!        works; the identifier stores its hash.
//!     2. The step's type together with the source location of the call that
//!        created the identifier. Two steps of the same type declared at
//!        different call sites are distinct. Two invocations at the exact same
//!        call site with the same type collide - a loop that declares the
//!        "same" step type at one call site must disambiguate with a declared
//!        identity.
//!
//! The `is_custom` flag marks steps appended at runtime outside the declared
//! flow order. It is carried alongside the identity but excluded from equality
//! and hashing, so a custom append of a declared identity still resolves to
//! the same identifier.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The two identity sources, compared under tagged-union equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum IdentityKind {
    /// Hash of a caller-declared identity value.
    Declared(u64),
    /// Fully-qualified type name plus the source coordinates of the call site.
    TypeAndLocation {
        type_name: &'static str,
        file: &'static str,
        line: u32,
        column: u32,
    },
}

/// Stable, hashable identity for a step in a flow.
///
/// Created once when a step is registered or appended, immutable thereafter.
/// Equality and hashing are consistent: `a == b` implies `hash(a) == hash(b)`.
#[derive(Debug, Clone)]
pub struct StepIdentifier {
    kind: IdentityKind,
    is_custom: bool,
}

impl StepIdentifier {
    /// Identifier derived from a declared identity value.
    pub fn declared<I: Hash + ?Sized>(identity: &I) -> Self {
        let mut hasher = DefaultHasher::new();
        identity.hash(&mut hasher);
        StepIdentifier {
            kind: IdentityKind::Declared(hasher.finish()),
            is_custom: false,
        }
    }

    /// Identifier derived from a step type and the calling source location.
    #[track_caller]
    pub fn of_type<T: ?Sized>() -> Self {
        let location = core::panic::Location::caller();
        StepIdentifier {
            kind: IdentityKind::TypeAndLocation {
                type_name: std::any::type_name::<T>(),
                file: location.file(),
                line: location.line(),
                column: location.column(),
            },
            is_custom: false,
        }
    }

    /// Whether this step was appended at runtime outside the declared flow.
    pub fn is_custom(&self) -> bool {
        self.is_custom
    }

    /// The same identity, marked custom.
    pub fn into_custom(mut self) -> Self {
        self.is_custom = true;
        self
    }
}

// Equality and hashing go through the identity kind only; the custom flag is
// presentation state, not identity.
impl PartialEq for StepIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for StepIdentifier {}

impl Hash for StepIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

impl fmt::Display for StepIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IdentityKind::Declared(hash) => write!(f, "step#{hash:016x}"),
            IdentityKind::TypeAndLocation {
                type_name,
                file,
                line,
                column,
            } => write!(f, "{type_name}@{file}:{line}:{column}"),
        }
    }
}
