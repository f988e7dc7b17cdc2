//! Conflict resolution among competing component candidates.

use crate::reason::{SelectionCause, SelectionDescriptor};
use crate::registry::{ComponentRecord, ComponentRegistry};
use girder_core::{ModuleId, ModuleVersionId, VersionComparator};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// One candidate presented to a strategy.
#[derive(Debug)]
pub struct ConflictCandidate<'a> {
    /// The candidate's module version.
    pub version: &'a ModuleVersionId,
    /// Whether the reject filter rejected it.
    pub rejected: bool,
    /// Whether it is a project of the current build.
    pub is_project: bool,
}

/// Structured failure of conflict resolution. Always fatal for the module;
/// carries the full candidate list for diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("conflict on module '{module}' between versions {}: {reason}", candidate_list(candidates))]
pub struct ConflictFailure {
    /// The contested module.
    pub module: ModuleId,
    /// Every candidate that was considered.
    pub candidates: Vec<ModuleVersionId>,
    /// Why no winner could be chosen.
    pub reason: String,
}

fn candidate_list(candidates: &[ModuleVersionId]) -> String {
    candidates
        .iter()
        .map(|c| c.version().raw())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A pluggable way of choosing one winner among candidates for a module.
pub trait ConflictStrategy: fmt::Debug {
    /// Choose the index of the winning candidate.
    ///
    /// # Errors
    /// Returns a [`ConflictFailure`] when no winner can be chosen.
    fn choose(
        &self,
        module: &ModuleId,
        candidates: &[ConflictCandidate<'_>],
        comparator: &VersionComparator,
    ) -> Result<usize, ConflictFailure>;
}

/// Default strategy: the highest non-rejected version wins. Projects of the
/// current build win over external modules of the same version.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighestVersionStrategy;

impl ConflictStrategy for HighestVersionStrategy {
    fn choose(
        &self,
        module: &ModuleId,
        candidates: &[ConflictCandidate<'_>],
        comparator: &VersionComparator,
    ) -> Result<usize, ConflictFailure> {
        let mut best: Option<usize> = None;
        for (index, candidate) in candidates.iter().enumerate() {
            if candidate.rejected {
                continue;
            }
            best = match best {
                None => Some(index),
                Some(current) => {
                    let ordering = comparator.compare(
                        candidate.version.version(),
                        candidates[current].version.version(),
                    );
                    let wins = match ordering {
                        Ordering::Greater => true,
                        Ordering::Equal => candidate.is_project && !candidates[current].is_project,
                        Ordering::Less => false,
                    };
                    Some(if wins { index } else { current })
                }
            };
        }
        best.ok_or_else(|| ConflictFailure {
            module: module.clone(),
            candidates: candidates.iter().map(|c| c.version.clone()).collect(),
            reason: "all candidate versions are rejected".to_string(),
        })
    }
}

/// Strict strategy: refuses to upgrade. Fails whenever the candidates do
/// not agree on a single version.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictVersionStrategy;

impl ConflictStrategy for StrictVersionStrategy {
    fn choose(
        &self,
        module: &ModuleId,
        candidates: &[ConflictCandidate<'_>],
        comparator: &VersionComparator,
    ) -> Result<usize, ConflictFailure> {
        let failure = |reason: &str| ConflictFailure {
            module: module.clone(),
            candidates: candidates.iter().map(|c| c.version.clone()).collect(),
            reason: reason.to_string(),
        };
        let first = candidates
            .first()
            .ok_or_else(|| failure("no candidates"))?;
        for candidate in &candidates[1..] {
            if comparator.compare(candidate.version.version(), first.version.version())
                != Ordering::Equal
            {
                return Err(failure(
                    "strict conflict resolution refuses to choose between incompatible versions",
                ));
            }
        }
        if first.rejected {
            return Err(failure("the only candidate version is rejected"));
        }
        Ok(0)
    }
}

/// Run a strategy over registered candidates and tag the winner with a
/// conflict-resolution cause listing every competitor.
pub(crate) fn resolve_conflict<R: ComponentRegistry>(
    strategy: &dyn ConflictStrategy,
    registry: &mut R,
    module: &ModuleId,
    candidates: &[R::Handle],
    comparator: &VersionComparator,
) -> Result<R::Handle, ConflictFailure> {
    let views: Vec<ConflictCandidate<'_>> = candidates
        .iter()
        .map(|&handle| {
            let record = registry.record(handle);
            ConflictCandidate {
                version: record.module_version(),
                rejected: record.is_rejected(),
                is_project: record.component_id().is_project(),
            }
        })
        .collect();

    let winner_index = strategy.choose(module, &views, comparator)?;
    let description = format!(
        "between versions {}",
        views
            .iter()
            .map(|c| c.version.version().raw())
            .collect::<Vec<_>>()
            .join(", ")
    );
    drop(views);

    let winner = candidates[winner_index];
    tracing::debug!(module = %module, winner = %registry.record(winner).module_version(), "conflict resolved");
    registry
        .record_mut(winner)
        .add_cause(SelectionDescriptor::with_description(
            SelectionCause::ConflictResolution,
            description,
        ));
    Ok(winner)
}
