//! Component records and the registry abstraction.
//!
//! The selector-merging algorithm is generic over where component records
//! live. Graph resolution keeps them in the graph arena so they can carry
//! nodes and metadata; lightweight version-listing call sites use the
//! [`CandidatePool`] below. Both produce records through the same
//! [`ComponentRegistry`] capability, handing out copyable handles that
//! deduplicate by resolved component id.

use crate::metadata::IdResolveResult;
use crate::reason::{SelectionDescriptor, SelectionReason};
use ahash::AHashMap;
use girder_core::{ComponentId, ModuleVersionId, Version};
use std::fmt;
use std::hash::Hash;

/// The mutable per-component record the selector resolver writes to.
pub trait ComponentRecord {
    /// The component id.
    fn component_id(&self) -> &ComponentId;

    /// The module version id.
    fn module_version(&self) -> &ModuleVersionId;

    /// The causes recorded so far.
    fn selection_reason(&self) -> &SelectionReason;

    /// Append a cause.
    fn add_cause(&mut self, descriptor: SelectionDescriptor);

    /// Flag the component as rejected by the reject filter.
    fn mark_rejected(&mut self);

    /// Whether the component is rejected.
    fn is_rejected(&self) -> bool;

    /// Record candidate versions seen while resolving towards this
    /// component, for diagnostics.
    fn record_candidates(&mut self, unmatched: &[Version], rejected: &[Version]);
}

/// Hands out per-run component records, deduplicated by component id.
pub trait ComponentRegistry {
    /// Copyable handle to a record.
    type Handle: Copy + Eq + Hash + fmt::Debug;
    /// The record type.
    type Record: ComponentRecord;

    /// Get or create the record for a resolved id.
    fn component(&mut self, result: &IdResolveResult) -> Self::Handle;

    /// Read a record.
    fn record(&self, handle: Self::Handle) -> &Self::Record;

    /// Mutate a record.
    fn record_mut(&mut self, handle: Self::Handle) -> &mut Self::Record;
}

/// A plain candidate record, used outside graph resolution.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    id: ComponentId,
    module_version: ModuleVersionId,
    reason: SelectionReason,
    rejected: bool,
    unmatched: Vec<Version>,
    rejected_versions: Vec<Version>,
}

impl CandidateRecord {
    /// Versions that did not match contributing selectors.
    #[must_use]
    pub fn unmatched_versions(&self) -> &[Version] {
        &self.unmatched
    }

    /// Versions rejected by the merged reject filter.
    #[must_use]
    pub fn rejected_versions(&self) -> &[Version] {
        &self.rejected_versions
    }
}

impl ComponentRecord for CandidateRecord {
    fn component_id(&self) -> &ComponentId {
        &self.id
    }

    fn module_version(&self) -> &ModuleVersionId {
        &self.module_version
    }

    fn selection_reason(&self) -> &SelectionReason {
        &self.reason
    }

    fn add_cause(&mut self, descriptor: SelectionDescriptor) {
        self.reason.add(descriptor);
    }

    fn mark_rejected(&mut self) {
        self.rejected = true;
    }

    fn is_rejected(&self) -> bool {
        self.rejected
    }

    fn record_candidates(&mut self, unmatched: &[Version], rejected: &[Version]) {
        self.unmatched.extend_from_slice(unmatched);
        self.rejected_versions.extend_from_slice(rejected);
    }
}

/// Arena of candidate records for one resolution pass.
#[derive(Debug, Default)]
pub struct CandidatePool {
    records: Vec<CandidateRecord>,
    index: AHashMap<ComponentId, usize>,
}

/// Handle into a [`CandidatePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateHandle(usize);

impl CandidatePool {
    /// An empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a record.
    #[must_use]
    pub fn get(&self, handle: CandidateHandle) -> &CandidateRecord {
        &self.records[handle.0]
    }
}

impl ComponentRegistry for CandidatePool {
    type Handle = CandidateHandle;
    type Record = CandidateRecord;

    fn component(&mut self, result: &IdResolveResult) -> CandidateHandle {
        if let Some(&index) = self.index.get(&result.id) {
            return CandidateHandle(index);
        }
        let index = self.records.len();
        self.records.push(CandidateRecord {
            id: result.id.clone(),
            module_version: result.module_version.clone(),
            reason: SelectionReason::default(),
            rejected: false,
            unmatched: Vec::new(),
            rejected_versions: Vec::new(),
        });
        self.index.insert(result.id.clone(), index);
        CandidateHandle(index)
    }

    fn record(&self, handle: CandidateHandle) -> &CandidateRecord {
        &self.records[handle.0]
    }

    fn record_mut(&mut self, handle: CandidateHandle) -> &mut CandidateRecord {
        &mut self.records[handle.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str) -> IdResolveResult {
        let module_version = ModuleVersionId::parse(id).expect("valid id");
        IdResolveResult {
            id: ComponentId::Module(module_version.clone()),
            module_version,
            rejected: false,
            unmatched_versions: Vec::new(),
            rejected_versions: Vec::new(),
        }
    }

    #[test]
    fn same_id_merges_into_one_record() {
        let mut pool = CandidatePool::new();
        let a = pool.component(&result("com.acme:lib:1.0"));
        let b = pool.component(&result("com.acme:lib:1.0"));
        let c = pool.component(&result("com.acme:lib:2.0"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
