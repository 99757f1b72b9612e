//! Flow registry
//!
//! The registry holds the ordered, named collection of steps declared for a
//! flow, plus a side table of custom steps appended at runtime. Declared steps
//! live in an arena (insertion order = declaration order) with a side index
//! from identifier to position; custom steps live in an unordered map and are
//! never consulted when walking the declared order.
//!
//! Payloads are any value implementing the minimal [`PresentableStep`]
//! capability. Resolution goes through identifiers, never through runtime type
//! reflection.

use std::collections::HashMap;

use thiserror::Error;

use super::identifier::StepIdentifier;

/// Errors surfaced by flow registration and navigation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Two declared steps hashed to the same identifier. This is a
    /// configuration error: the flow being built is unusable as declared.
    #[error("duplicate step identifier: {0}")]
    DuplicateStep(StepIdentifier),
    /// Steps can only be replaced while the cursor still sits at the very
    /// first declared step.
    #[error("steps can only be replaced while the flow is at its first step")]
    MidFlowUpdate,
}

/// Minimal capability a step payload must offer to be presentable.
pub trait PresentableStep {
    /// Human-readable title for the step's view.
    fn title(&self) -> &str;
}

/// Ordered declared steps plus unordered custom steps.
#[derive(Default)]
pub struct FlowRegistry {
    ordered: Vec<(StepIdentifier, Box<dyn PresentableStep>)>,
    index: HashMap<StepIdentifier, usize>,
    custom: HashMap<StepIdentifier, Box<dyn PresentableStep>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the declared steps wholesale.
    ///
    /// Fails with [`FlowError::DuplicateStep`] if any two declared steps share
    /// an identifier; the registry is left unmodified in that case. Custom
    /// steps are unaffected.
    pub fn register(
        &mut self,
        steps: Vec<(StepIdentifier, Box<dyn PresentableStep>)>,
    ) -> Result<(), FlowError> {
        let mut index = HashMap::with_capacity(steps.len());
        for (position, (identifier, _)) in steps.iter().enumerate() {
            if index.insert(identifier.clone(), position).is_some() {
                return Err(FlowError::DuplicateStep(identifier.clone()));
            }
        }
        self.ordered = steps;
        self.index = index;
        Ok(())
    }

    /// Insert a custom step. Appending the same identifier twice overwrites
    /// the previous payload (last write wins).
    pub fn append_custom(&mut self, identifier: StepIdentifier, payload: Box<dyn PresentableStep>) {
        self.custom.insert(identifier.into_custom(), payload);
    }

    /// Resolve a payload, checking declared steps first, then custom steps.
    pub fn lookup(&self, identifier: &StepIdentifier) -> Option<&dyn PresentableStep> {
        if let Some(&position) = self.index.get(identifier) {
            return Some(self.ordered[position].1.as_ref());
        }
        self.custom.get(identifier).map(|payload| payload.as_ref())
    }

    /// Position of a declared step, if it was declared.
    pub fn position(&self, identifier: &StepIdentifier) -> Option<usize> {
        self.index.get(identifier).copied()
    }

    /// Identifier of the declared step at `position`.
    pub fn identifier_at(&self, position: usize) -> Option<&StepIdentifier> {
        self.ordered.get(position).map(|(identifier, _)| identifier)
    }

    /// Whether `identifier` is resolvable at all (declared or custom).
    pub fn contains(&self, identifier: &StepIdentifier) -> bool {
        self.index.contains_key(identifier) || self.custom.contains_key(identifier)
    }

    /// Number of declared steps.
    pub fn declared_len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl std::fmt::Debug for FlowRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowRegistry")
            .field(
                "ordered",
                &self
                    .ordered
                    .iter()
                    .map(|(identifier, _)| identifier)
                    .collect::<Vec<_>>(),
            )
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Titled(&'static str);

    impl PresentableStep for Titled {
        fn title(&self) -> &str {
            self.0
        }
    }

    fn step(name: &'static str) -> (StepIdentifier, Box<dyn PresentableStep>) {
        (StepIdentifier::declared(name), Box::new(Titled(name)))
    }

    #[test]
    fn test_register_preserves_declaration_order() {
        let mut registry = FlowRegistry::new();
        registry
            .register(vec![step("a"), step("b"), step("c")])
            .unwrap();

        assert_eq!(registry.declared_len(), 3);
        assert_eq!(
            registry.position(&StepIdentifier::declared("b")),
            Some(1)
        );
        assert_eq!(
            registry.identifier_at(2),
            Some(&StepIdentifier::declared("c"))
        );
    }

    #[test]
    fn test_register_rejects_duplicates_and_keeps_previous_state() {
        let mut registry = FlowRegistry::new();
        registry.register(vec![step("a"), step("b")]).unwrap();

        let result = registry.register(vec![step("a"), step("a")]);
        assert_eq!(
            result,
            Err(FlowError::DuplicateStep(StepIdentifier::declared("a")))
        );
        // Previous registration survives.
        assert_eq!(registry.declared_len(), 2);
        assert!(registry.contains(&StepIdentifier::declared("b")));
    }

    #[test]
    fn test_lookup_prefers_declared_over_custom() {
        let mut registry = FlowRegistry::new();
        registry.register(vec![step("a")]).unwrap();
        registry.append_custom(StepIdentifier::declared("a"), Box::new(Titled("shadow")));

        assert_eq!(
            registry.lookup(&StepIdentifier::declared("a")).unwrap().title(),
            "a"
        );
    }

    #[test]
    fn test_append_custom_last_write_wins() {
        let mut registry = FlowRegistry::new();
        let identifier = StepIdentifier::declared("extra");
        registry.append_custom(identifier.clone(), Box::new(Titled("first")));
        registry.append_custom(identifier.clone(), Box::new(Titled("second")));

        assert_eq!(registry.lookup(&identifier).unwrap().title(), "second");
    }
}
