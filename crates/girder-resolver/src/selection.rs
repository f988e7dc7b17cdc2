//! Merging the selectors that target one module into a single selection.
//!
//! [`select_best`] is the primary entry point of the selection layer. Given
//! every selector currently targeting a module it produces one settled
//! component, consulting the metadata source as little as it can and
//! falling back to conflict resolution only when the selectors genuinely
//! disagree.

use crate::conflict::{self, ConflictStrategy};
use crate::error::ResolveError;
use crate::metadata::{ComponentMetadataSource, SelectorFailure};
use crate::reason::{SelectionCause, SelectionDescriptor};
use crate::registry::{ComponentRecord, ComponentRegistry};
use crate::selectors::ModuleSelectors;
use ahash::{AHashMap, AHashSet};
use girder_core::{
    ModuleId, UnionVersionSelector, Version, VersionComparator, VersionSelector,
};
use tracing::{debug, trace};

/// The graph root, injected as a candidate when a module resolves to the
/// root's own coordinates.
#[derive(Debug)]
pub struct RootCandidate<H> {
    /// The root component's module id.
    pub module: ModuleId,
    /// The root component's record handle.
    pub handle: H,
}

/// Merge all selectors targeting `module_id` into one selected component.
///
/// The procedure:
/// 1. Union every reject selector into one filter shared by the pass.
/// 2. A forced selector short-circuits everything: its resolution is the
///    sole candidate, tagged with a forced cause.
/// 3. Selectors with no version expression are marked resolved without a
///    metadata round-trip; they ride along with whatever resolves.
/// 4. An exact selector whose version was already registered this pass
///    reuses that registration instead of resolving again.
/// 5. Remaining selectors resolve through the metadata source; results
///    deduplicate by resolved id, each contributing its cause. A failure is
///    kept pending and surfaced only if nothing succeeds.
/// 6. When the module is the root module, the root component joins the
///    candidates.
/// 7. A single candidate wins outright; several go to conflict resolution.
///
/// # Errors
/// Returns a [`ResolveError`] when no selector resolves, when the only
/// candidate is rejected, or when conflict resolution fails.
pub fn select_best<R: ComponentRegistry>(
    registry: &mut R,
    source: &dyn ComponentMetadataSource,
    strategy: &dyn ConflictStrategy,
    comparator: &VersionComparator,
    module_id: &ModuleId,
    selectors: &mut ModuleSelectors,
    root: Option<&RootCandidate<R::Handle>>,
) -> Result<R::Handle, ResolveError> {
    let rejects = collect_rejects(selectors);

    if let Some(handle) = resolve_forced(registry, source, comparator, module_id, selectors, &rejects)? {
        return Ok(handle);
    }

    let mut candidates: Vec<R::Handle> = Vec::new();
    let mut seen: AHashSet<R::Handle> = AHashSet::new();
    let mut registered_versions: AHashMap<Version, R::Handle> = AHashMap::new();
    let mut pending_failure: Option<SelectorFailure> = None;

    for selector in selectors.live_mut() {
        if selector.version_constraint().is_empty() {
            trace!(module = %module_id, "selector without version expression rides along");
            selector.mark_resolved();
            continue;
        }

        // Reuse a registration from this pass when an exact selector names
        // a version that already resolved. Cheap check, no metadata call;
        // only exact selectors qualify.
        if let Some(VersionSelector::Exact(version)) = selector.version_constraint().selector()
            && let Some(&handle) = registered_versions.get(version)
        {
            registry
                .record_mut(handle)
                .add_cause(selector.contributed_cause());
            selector.mark_resolved();
            if seen.insert(handle) {
                candidates.push(handle);
            }
            continue;
        }

        match selector.resolve(source, &rejects, comparator) {
            Ok(result) => {
                let handle = registry.component(&result);
                if seen.insert(handle) {
                    candidates.push(handle);
                }
                let record = registry.record_mut(handle);
                record.add_cause(selector.contributed_cause());
                if result.rejected {
                    record.mark_rejected();
                }
                record.record_candidates(&result.unmatched_versions, &result.rejected_versions);
                registered_versions.insert(result.module_version.version().clone(), handle);
            }
            Err(failure) => {
                // One selector failing must not block a resolution found
                // via a sibling selector for the same module.
                pending_failure.get_or_insert(failure);
            }
        }
    }

    if candidates.is_empty() {
        let failure = pending_failure.unwrap_or(SelectorFailure::NoVersionSpecified {
            module: module_id.clone(),
        });
        return Err(ResolveError::Selector {
            module: module_id.clone(),
            failure,
        });
    }

    if let Some(root) = root
        && root.module == *module_id
        && !seen.contains(&root.handle)
    {
        debug!(module = %module_id, "module resolves to root coordinates, adding root candidate");
        candidates.push(root.handle);
    }

    let winner = if candidates.len() == 1 {
        candidates[0]
    } else {
        conflict::resolve_conflict(strategy, registry, module_id, &candidates, comparator)
            .map_err(ResolveError::Conflict)?
    };

    // A rejected version is never returned as the resolved version, not
    // even when it is the only candidate.
    let record = registry.record(winner);
    if record.is_rejected() {
        return Err(ResolveError::Selector {
            module: module_id.clone(),
            failure: SelectorFailure::Rejected {
                module: module_id.clone(),
                version: record.module_version().version().clone(),
            },
        });
    }
    Ok(winner)
}

/// Union of the reject selectors across every live selector: rejecting a
/// version in any contributing request is a global constraint on the
/// module for this graph.
fn collect_rejects(selectors: &ModuleSelectors) -> UnionVersionSelector {
    UnionVersionSelector::new(
        selectors
            .live()
            .flat_map(|s| s.version_constraint().rejects().iter().cloned())
            .collect(),
    )
}

fn resolve_forced<R: ComponentRegistry>(
    registry: &mut R,
    source: &dyn ComponentMetadataSource,
    comparator: &VersionComparator,
    module_id: &ModuleId,
    selectors: &mut ModuleSelectors,
    rejects: &UnionVersionSelector,
) -> Result<Option<R::Handle>, ResolveError> {
    let forced = selectors.live_mut().find_map(|selector| {
        selector.is_force().then(|| {
            let outcome = selector.resolve(source, rejects, comparator);
            (outcome, selector.contributed_cause())
        })
    });
    let Some((outcome, cause)) = forced else {
        return Ok(None);
    };
    let result = outcome.map_err(|failure| ResolveError::Selector {
        module: module_id.clone(),
        failure,
    })?;
    for selector in selectors.live_mut() {
        selector.mark_resolved();
    }
    debug!(module = %module_id, version = %result.module_version.version(), "forced selector wins");
    let handle = registry.component(&result);
    let record = registry.record_mut(handle);
    record.add_cause(cause);
    record.add_cause(SelectionDescriptor::of(SelectionCause::Forced));
    record.record_candidates(&result.unmatched_versions, &result.rejected_versions);
    Ok(Some(handle))
}
