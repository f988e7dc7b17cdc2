//! Per-declaration selector state.
//!
//! A selector has three states: pending (newly attached to a module),
//! failed (its resolution failed), or resolved (it took part in the
//! resolution of its target module). A selector caches its last successful
//! id resolution and only re-resolves when the merged reject filter has
//! since grown to reject that result.

use crate::metadata::{
    ComponentMetadataSource, DependencyMetadata, IdResolveResult, SelectorFailure,
};
use crate::reason::{SelectionCause, SelectionDescriptor};
use girder_core::{ModuleId, UnionVersionSelector, VersionComparator, VersionConstraint};

/// Resolution state for one dependency declaration targeting a module.
#[derive(Debug, Clone)]
pub struct SelectorState {
    dependency: DependencyMetadata,
    descriptor: SelectionDescriptor,
    resolved: bool,
    failure: Option<SelectorFailure>,
    cached: Option<IdResolveResult>,
}

impl SelectorState {
    /// Create a pending selector for a declaration.
    #[must_use]
    pub fn new(dependency: DependencyMetadata) -> Self {
        let descriptor = SelectionDescriptor::with_description(
            SelectionCause::Requested,
            format!("requested {} {}", dependency.target, dependency.constraint),
        );
        Self {
            dependency,
            descriptor,
            resolved: false,
            failure: None,
            cached: None,
        }
    }

    /// Create a pending selector carrying a constraint cause instead of a
    /// request cause.
    #[must_use]
    pub fn constraint(dependency: DependencyMetadata) -> Self {
        let descriptor = SelectionDescriptor::with_description(
            SelectionCause::Constraint,
            format!("constrained to {} {}", dependency.target, dependency.constraint),
        );
        Self {
            descriptor,
            ..Self::new(dependency)
        }
    }

    /// The underlying declaration.
    #[must_use]
    pub fn dependency(&self) -> &DependencyMetadata {
        &self.dependency
    }

    /// The declared version constraint.
    #[must_use]
    pub fn version_constraint(&self) -> &VersionConstraint {
        &self.dependency.constraint
    }

    /// The target module.
    #[must_use]
    pub fn target_module(&self) -> &ModuleId {
        &self.dependency.target
    }

    /// Whether the declaration carries a force flag.
    #[must_use]
    pub fn is_force(&self) -> bool {
        self.dependency.force
    }

    /// The cause this selector contributes to a selected component.
    #[must_use]
    pub fn contributed_cause(&self) -> SelectionDescriptor {
        self.descriptor.clone()
    }

    /// Any failure from the last resolve attempt.
    #[must_use]
    pub fn failure(&self) -> Option<&SelectorFailure> {
        self.failure.as_ref()
    }

    /// Whether the selector took part in a settled resolution.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Transition out of the pending pool once the target module settles.
    pub fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    /// Put the selector back into the pending pool, e.g. when its module
    /// must be re-selected after the graph changed.
    pub fn mark_pending(&mut self) {
        self.resolved = false;
    }

    /// Resolve the selector against the metadata source, reusing the cached
    /// result when the reject filter still accepts it.
    ///
    /// # Errors
    /// Returns a [`SelectorFailure`] when no acceptable component exists.
    pub fn resolve(
        &mut self,
        source: &dyn ComponentMetadataSource,
        rejects: &UnionVersionSelector,
        comparator: &VersionComparator,
    ) -> Result<IdResolveResult, SelectorFailure> {
        if let Some(previous) = &self.cached {
            // A previous non-rejected result stays valid unless the grown
            // reject union now rejects it.
            if !previous.rejected
                && !rejects.accepts_any(previous.module_version.version(), comparator)
            {
                self.resolved = true;
                return Ok(previous.clone());
            }
        }

        let outcome = source.resolve_id(&self.dependency.target, &self.dependency.constraint, rejects);
        match &outcome {
            Ok(result) => {
                self.cached = Some(result.clone());
                self.failure = None;
            }
            Err(failure) => {
                self.failure = Some(failure.clone());
            }
        }
        self.resolved = true;
        outcome
    }
}

/// The selectors currently targeting one module, in declaration order.
///
/// Each slot tracks how many outgoing edges use it; a slot with no users
/// no longer takes part in selection, but stays allocated so edge indices
/// remain stable across graph restarts.
#[derive(Debug, Default)]
pub struct ModuleSelectors {
    slots: Vec<Slot>,
}

#[derive(Debug)]
struct Slot {
    state: SelectorState,
    uses: usize,
}

impl ModuleSelectors {
    /// Build from a plain list of selectors, each with one user. This is
    /// the shape version-listing call sites use.
    #[must_use]
    pub fn from_states(states: impl IntoIterator<Item = SelectorState>) -> Self {
        Self {
            slots: states
                .into_iter()
                .map(|state| Slot { state, uses: 1 })
                .collect(),
        }
    }

    /// Add a selector with one user; returns its slot index.
    pub fn add(&mut self, state: SelectorState) -> usize {
        self.slots.push(Slot { state, uses: 1 });
        self.slots.len() - 1
    }

    /// Register another user of a slot.
    pub fn acquire(&mut self, slot: usize) {
        self.slots[slot].uses += 1;
    }

    /// Release one user of a slot; returns true when the slot became
    /// unused and the selector dropped out of selection.
    pub fn release(&mut self, slot: usize) -> bool {
        let entry = &mut self.slots[slot];
        entry.uses = entry.uses.saturating_sub(1);
        if entry.uses == 0 {
            entry.state.mark_pending();
            true
        } else {
            false
        }
    }

    /// Number of selectors still taking part in selection.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.uses > 0).count()
    }

    /// Iterate live selectors mutably, in declaration order.
    pub fn live_mut(&mut self) -> impl Iterator<Item = &mut SelectorState> {
        self.slots
            .iter_mut()
            .filter(|s| s.uses > 0)
            .map(|s| &mut s.state)
    }

    /// Iterate live selectors, in declaration order.
    pub fn live(&self) -> impl Iterator<Item = &SelectorState> {
        self.slots
            .iter()
            .filter(|s| s.uses > 0)
            .map(|s| &s.state)
    }
}
