//! In-memory metadata source and artifact store.
//!
//! Used by tests, examples and embedders that already hold a full picture
//! of the available universe. The source counts its resolve calls so call
//! sites can assert how many metadata round-trips a resolution needed.

use crate::metadata::{
    ArtifactFailure, ArtifactFetchService, ComponentMetadata, ComponentMetadataSource,
    DependencyMetadata, IdResolveResult, MetadataFailure, SelectorFailure, Variant,
};
use ahash::AHashMap;
use girder_core::{
    ArtifactId, ComponentId, ModuleId, ModuleVersionId, UnionVersionSelector, Version,
    VersionComparator, VersionConstraint,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// An in-memory [`ComponentMetadataSource`].
#[derive(Debug, Default)]
pub struct MemoryMetadataSource {
    modules: AHashMap<ModuleId, Vec<ComponentMetadata>>,
    by_id: AHashMap<ComponentId, ComponentMetadata>,
    comparator: VersionComparator,
    id_resolves: AtomicU64,
    metadata_resolves: AtomicU64,
}

impl MemoryMetadataSource {
    /// An empty source with the default version comparator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty source using a custom version comparator for candidate
    /// ordering.
    #[must_use]
    pub fn with_comparator(comparator: VersionComparator) -> Self {
        Self {
            comparator,
            ..Self::default()
        }
    }

    /// Register full component metadata.
    pub fn add(&mut self, metadata: ComponentMetadata) {
        self.by_id.insert(metadata.id().clone(), metadata.clone());
        self.modules
            .entry(metadata.module_version().module().clone())
            .or_default()
            .push(metadata);
    }

    /// Register an external module version with a single default variant,
    /// one conventional artifact (`name-version.jar`) and the given
    /// dependencies.
    ///
    /// # Panics
    /// Panics when `id` is not a `group:name:version` string.
    pub fn add_module(&mut self, id: &str, dependencies: Vec<DependencyMetadata>) {
        let module_version = ModuleVersionId::parse(id).expect("valid module version id");
        let mut variant = Variant::new("default").with_artifact(format!(
            "{}-{}.jar",
            module_version.module().name(),
            module_version.version()
        ));
        variant.dependencies = dependencies;
        self.add(ComponentMetadata::new(
            ComponentId::Module(module_version.clone()),
            module_version,
            vec![variant],
        ));
    }

    /// How many id resolutions were issued.
    #[must_use]
    pub fn id_resolve_count(&self) -> u64 {
        self.id_resolves.load(Ordering::Relaxed)
    }

    /// How many metadata fetches were issued.
    #[must_use]
    pub fn metadata_resolve_count(&self) -> u64 {
        self.metadata_resolves.load(Ordering::Relaxed)
    }

    fn sorted_versions_desc(&self, module: &ModuleId) -> Option<Vec<&ComponentMetadata>> {
        let mut versions: Vec<&ComponentMetadata> =
            self.modules.get(module)?.iter().collect();
        versions.sort_by(|a, b| {
            self.comparator
                .compare(b.module_version().version(), a.module_version().version())
        });
        Some(versions)
    }
}

impl ComponentMetadataSource for MemoryMetadataSource {
    fn resolve_id(
        &self,
        target: &ModuleId,
        constraint: &VersionConstraint,
        rejects: &UnionVersionSelector,
    ) -> Result<IdResolveResult, SelectorFailure> {
        self.id_resolves.fetch_add(1, Ordering::Relaxed);

        let Some(selector) = constraint.selector() else {
            return Err(SelectorFailure::NoVersionSpecified {
                module: target.clone(),
            });
        };
        let Some(versions) = self.sorted_versions_desc(target) else {
            return Err(SelectorFailure::ModuleNotFound {
                module: target.clone(),
            });
        };

        let mut unmatched: Vec<Version> = Vec::new();
        let mut rejected: Vec<Version> = Vec::new();
        let mut best_rejected: Option<&ComponentMetadata> = None;
        for candidate in versions {
            let version = candidate.module_version().version();
            if !selector.accepts(version, &self.comparator) {
                unmatched.push(version.clone());
                continue;
            }
            let own_reject = constraint
                .rejects()
                .iter()
                .any(|r| r.accepts(version, &self.comparator));
            if own_reject || rejects.accepts_any(version, &self.comparator) {
                rejected.push(version.clone());
                best_rejected.get_or_insert(candidate);
                continue;
            }
            return Ok(IdResolveResult {
                id: candidate.id().clone(),
                module_version: candidate.module_version().clone(),
                rejected: false,
                unmatched_versions: unmatched,
                rejected_versions: rejected,
            });
        }

        // Every matching version is rejected: surface the best of them,
        // flagged, so selection can refuse it with full context.
        if let Some(candidate) = best_rejected {
            return Ok(IdResolveResult {
                id: candidate.id().clone(),
                module_version: candidate.module_version().clone(),
                rejected: true,
                unmatched_versions: unmatched,
                rejected_versions: rejected,
            });
        }
        Err(SelectorFailure::NoMatchingVersion {
            module: target.clone(),
            constraint: constraint.to_string(),
            unmatched,
            rejected,
        })
    }

    fn resolve_metadata(&self, id: &ComponentId) -> Result<ComponentMetadata, MetadataFailure> {
        self.metadata_resolves.fetch_add(1, Ordering::Relaxed);
        self.by_id.get(id).cloned().ok_or_else(|| MetadataFailure {
            id: id.clone(),
            message: "component not present in source".to_string(),
        })
    }
}

/// An in-memory [`ArtifactFetchService`] mapping artifacts to local files.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    files: AHashMap<ArtifactId, PathBuf>,
}

impl MemoryArtifactStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the local file backing an artifact.
    pub fn put(&mut self, artifact: ArtifactId, file: PathBuf) {
        self.files.insert(artifact, file);
    }
}

impl ArtifactFetchService for MemoryArtifactStore {
    fn fetch(&self, artifact: &ArtifactId) -> Result<PathBuf, ArtifactFailure> {
        self.files
            .get(artifact)
            .cloned()
            .ok_or_else(|| ArtifactFailure {
                artifact: artifact.clone(),
                message: "artifact not present in store".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(target: &str, constraint: VersionConstraint) -> DependencyMetadata {
        DependencyMetadata::new(ModuleId::parse(target).expect("valid id"), constraint)
    }

    fn source_with_lib() -> MemoryMetadataSource {
        let mut source = MemoryMetadataSource::new();
        source.add_module("com.acme:lib:1.0", vec![]);
        source.add_module("com.acme:lib:1.5", vec![]);
        source.add_module("com.acme:lib:2.0", vec![]);
        source
    }

    #[test]
    fn latest_picks_highest() {
        let source = source_with_lib();
        let result = source
            .resolve_id(
                &ModuleId::parse("com.acme:lib").expect("valid id"),
                &VersionConstraint::latest(),
                &UnionVersionSelector::default(),
            )
            .expect("resolves");
        assert_eq!(result.module_version.version().raw(), "2.0");
        assert_eq!(source.id_resolve_count(), 1);
    }

    #[test]
    fn range_skips_unmatched() {
        let source = source_with_lib();
        let result = source
            .resolve_id(
                &ModuleId::parse("com.acme:lib").expect("valid id"),
                &VersionConstraint::within("[1.0,2.0)").expect("valid range"),
                &UnionVersionSelector::default(),
            )
            .expect("resolves");
        assert_eq!(result.module_version.version().raw(), "1.5");
        assert_eq!(result.unmatched_versions.len(), 1);
    }

    #[test]
    fn rejected_versions_are_skipped_for_dynamic_selectors() {
        use girder_core::VersionSelector;
        let source = source_with_lib();
        let rejects =
            UnionVersionSelector::new(vec![VersionSelector::Exact(Version::parse("2.0"))]);
        let result = source
            .resolve_id(
                &ModuleId::parse("com.acme:lib").expect("valid id"),
                &VersionConstraint::latest(),
                &rejects,
            )
            .expect("resolves");
        assert_eq!(result.module_version.version().raw(), "1.5");
        assert_eq!(result.rejected_versions, vec![Version::parse("2.0")]);
    }

    #[test]
    fn fully_rejected_exact_selector_resolves_flagged() {
        use girder_core::VersionSelector;
        let source = source_with_lib();
        let rejects =
            UnionVersionSelector::new(vec![VersionSelector::Exact(Version::parse("1.5"))]);
        let result = source
            .resolve_id(
                &ModuleId::parse("com.acme:lib").expect("valid id"),
                &VersionConstraint::exactly("1.5"),
                &rejects,
            )
            .expect("resolves flagged");
        assert!(result.rejected);
        assert_eq!(result.module_version.version().raw(), "1.5");
    }

    #[test]
    fn unknown_module_and_unmatched_constraint_fail() {
        let source = source_with_lib();
        assert!(matches!(
            source.resolve_id(
                &ModuleId::parse("org.other:lib").expect("valid id"),
                &VersionConstraint::latest(),
                &UnionVersionSelector::default(),
            ),
            Err(SelectorFailure::ModuleNotFound { .. })
        ));
        assert!(matches!(
            source.resolve_id(
                &ModuleId::parse("com.acme:lib").expect("valid id"),
                &VersionConstraint::exactly("9.9"),
                &UnionVersionSelector::default(),
            ),
            Err(SelectorFailure::NoMatchingVersion { .. })
        ));
    }

    #[test]
    fn metadata_lookup_by_component_id() {
        let mut source = MemoryMetadataSource::new();
        source.add_module(
            "com.acme:lib:1.0",
            vec![dep("com.acme:dep", VersionConstraint::exactly("1.0"))],
        );
        let id = ComponentId::Module(
            ModuleVersionId::parse("com.acme:lib:1.0").expect("valid id"),
        );
        let metadata = source.resolve_metadata(&id).expect("present");
        assert_eq!(metadata.variants()[0].dependencies.len(), 1);
        assert!(
            source
                .resolve_metadata(&ComponentId::Module(
                    ModuleVersionId::parse("com.acme:lib:9.9").expect("valid id"),
                ))
                .is_err()
        );
    }
}
