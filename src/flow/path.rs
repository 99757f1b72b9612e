//! Navigation path
//!
//! `NavigationPath` is the mutable cursor over a [`FlowRegistry`]. It owns a
//! history stack of step identifiers and drives forward/back/jump navigation
//! plus completion signaling.
//!
//! The cursor has four conceptual states: before the first step (empty
//! history), at a regular step, at a custom step, and complete. The "current
//! regular step" is always resolved by walking the history from the top and
//! skipping custom entries; custom steps sit on top of the stack without
//! moving the regular cursor, so advancing right after a custom append
//! resumes from the last regular step.

use tracing::warn;

use super::identifier::StepIdentifier;
use super::registry::{FlowError, FlowRegistry, PresentableStep};

type CompletionHandler = Box<dyn FnMut()>;

/// Mutable cursor over a flow's declared steps.
pub struct NavigationPath {
    registry: FlowRegistry,
    history: Vec<StepIdentifier>,
    on_complete: Option<CompletionHandler>,
    complete: bool,
}

impl NavigationPath {
    pub fn new(registry: FlowRegistry) -> Self {
        NavigationPath {
            registry,
            history: Vec::new(),
            on_complete: None,
            complete: false,
        }
    }

    /// Install the completion handler. It fires at most once, on the first
    /// transition into the complete state.
    pub fn on_complete(&mut self, handler: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(handler));
    }

    /// The identifier of the step currently presented.
    ///
    /// Walks the history from the top, skipping custom entries, and defaults
    /// to the first declared step when no regular entry exists.
    pub fn current_step(&self) -> Option<&StepIdentifier> {
        self.history
            .iter()
            .rev()
            .find(|identifier| !identifier.is_custom())
            .or_else(|| self.registry.identifier_at(0))
    }

    /// Payload of the current step.
    pub fn current_payload(&self) -> Option<&dyn PresentableStep> {
        self.current_step()
            .cloned()
            .and_then(move |identifier| self.registry.lookup(&identifier))
    }

    /// Advance to the step following the current regular step, or signal
    /// completion when the current regular step is the last declared one.
    ///
    /// Custom steps on top of the history are ignored when resolving the
    /// current position, so advancing after a custom append resumes from the
    /// last regular step.
    pub fn next_step(&mut self) {
        if self.registry.is_empty() {
            self.mark_complete();
            return;
        }
        let current = self
            .current_step()
            .and_then(|identifier| self.registry.position(identifier))
            .unwrap_or(0);
        match self.registry.identifier_at(current + 1) {
            Some(next) => self.history.push(next.clone()),
            None => self.mark_complete(),
        }
    }

    /// Jump to a declared step.
    ///
    /// Referencing a step that was never declared is non-fatal: the request is
    /// dropped with a diagnostic warning and the flow continues unaffected.
    /// Jumping moves the regular cursor, so a subsequent [`next_step`] call
    /// continues from the jump target.
    ///
    /// [`next_step`]: NavigationPath::next_step
    pub fn append(&mut self, identifier: &StepIdentifier) {
        if self.registry.position(identifier).is_none() {
            warn!(step = %identifier, "append requested for undeclared step; ignoring");
            return;
        }
        self.history.push(identifier.clone());
    }

    /// Show a step that is not part of the declared flow.
    ///
    /// Registers the payload in the custom-step table (overwriting any earlier
    /// payload for the same identifier) and pushes the step. The regular
    /// cursor is unaffected.
    pub fn append_custom(
        &mut self,
        identifier: StepIdentifier,
        payload: Box<dyn PresentableStep>,
    ) {
        let identifier = identifier.into_custom();
        self.registry.append_custom(identifier.clone(), payload);
        self.history.push(identifier);
    }

    /// Go back one step. With an emptied history the cursor returns to
    /// "before first step" and the first declared step is shown again.
    pub fn remove_last(&mut self) -> Option<StepIdentifier> {
        self.history.pop()
    }

    /// Replace the declared steps.
    ///
    /// Accepted only while the current position is still the very first
    /// declared step; re-registering mid-flight would corrupt in-flight
    /// navigation state. If the rebuilt flow is empty, completion fires
    /// immediately.
    pub fn update_steps(
        &mut self,
        steps: Vec<(StepIdentifier, Box<dyn PresentableStep>)>,
    ) -> Result<(), FlowError> {
        if !self.at_first_step() {
            return Err(FlowError::MidFlowUpdate);
        }
        self.registry.register(steps)?;
        // Drop history entries the rebuilt flow can no longer resolve.
        let registry = &self.registry;
        self.history
            .retain(|identifier| registry.contains(identifier));
        if self.registry.is_empty() {
            self.mark_complete();
        }
        Ok(())
    }

    /// Whether the completion signal has fired.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The path stack, bottom to top.
    pub fn history(&self) -> &[StepIdentifier] {
        &self.history
    }

    pub fn registry(&self) -> &FlowRegistry {
        &self.registry
    }

    fn at_first_step(&self) -> bool {
        match self.current_step() {
            Some(current) => self.registry.position(current) == Some(0),
            None => true,
        }
    }

    // Terminal transition. Idempotent: re-entering the complete state re-sets
    // the flag but never re-fires the handler.
    fn mark_complete(&mut self) {
        let first_completion = !self.complete;
        self.complete = true;
        if first_completion {
            if let Some(handler) = self.on_complete.as_mut() {
                handler();
            }
        }
    }
}

impl std::fmt::Debug for NavigationPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationPath")
            .field("registry", &self.registry)
            .field("history", &self.history)
            .field("complete", &self.complete)
            .finish()
    }
}
