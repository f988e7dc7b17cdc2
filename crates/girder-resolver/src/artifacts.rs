//! Turning a resolved graph into a verified set of local artifact files.

use crate::error::ResolveError;
use crate::graph::ResolvedGraph;
use crate::metadata::{ArtifactFailure, ArtifactFetchService};
use ahash::AHashSet;
use girder_core::ArtifactId;
use girder_verify::{DependencyVerifier, VerificationReport};
use std::path::PathBuf;
use tracing::{debug, info};

/// The artifact files backing a resolved graph, plus the verification
/// outcome for each of them.
#[derive(Debug)]
pub struct ArtifactSet {
    files: Vec<PathBuf>,
    report: VerificationReport,
}

impl ArtifactSet {
    /// The fetched files, in graph breadth-first order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// The collected verification failures.
    #[must_use]
    pub fn verification(&self) -> &VerificationReport {
        &self.report
    }

    /// Consume into the file list.
    #[must_use]
    pub fn into_files(self) -> Vec<PathBuf> {
        self.files
    }
}

/// Fetches and verifies every artifact of a resolved graph.
pub struct ArtifactSetResolver<'a> {
    fetch: &'a dyn ArtifactFetchService,
    verifier: Option<&'a DependencyVerifier>,
}

impl std::fmt::Debug for ArtifactSetResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactSetResolver")
            .field("verifying", &self.verifier.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> ArtifactSetResolver<'a> {
    /// Fetch without checksum verification.
    #[must_use]
    pub fn new(fetch: &'a dyn ArtifactFetchService) -> Self {
        Self {
            fetch,
            verifier: None,
        }
    }

    /// Fetch and verify against the given verifier.
    #[must_use]
    pub fn with_verifier(
        fetch: &'a dyn ArtifactFetchService,
        verifier: &'a DependencyVerifier,
    ) -> Self {
        Self {
            fetch,
            verifier: Some(verifier),
        }
    }

    /// Fetch every artifact the graph's nodes declare, deduplicated, and
    /// verify each downloaded file.
    ///
    /// Checksum mismatches are collected in the returned
    /// [`VerificationReport`], not raised, so one bad artifact cannot mask
    /// the rest of the set.
    ///
    /// # Errors
    /// Returns [`ResolveError::Artifacts`] when any artifact could not be
    /// fetched or read; all fetch failures are collected before returning.
    pub fn resolve(&self, graph: &ResolvedGraph) -> Result<ArtifactSet, ResolveError> {
        let mut files = Vec::new();
        let mut failures: Vec<ArtifactFailure> = Vec::new();
        let mut report = VerificationReport::new();
        let mut seen: AHashSet<ArtifactId> = AHashSet::new();

        for index in graph.bfs_order() {
            for artifact in graph.node(index).artifact_ids() {
                if !seen.insert(artifact.clone()) {
                    continue;
                }
                match self.fetch.fetch(&artifact) {
                    Ok(file) => {
                        debug!(artifact = %artifact, file = %file.display(), "artifact fetched");
                        if let Some(verifier) = self.verifier {
                            let outcome =
                                verifier.verify(&artifact, &file, &mut |failure| {
                                    report.record(failure);
                                });
                            if let Err(error) = outcome {
                                failures.push(ArtifactFailure {
                                    artifact: artifact.clone(),
                                    message: error.to_string(),
                                });
                                continue;
                            }
                        }
                        files.push(file);
                    }
                    Err(failure) => failures.push(failure),
                }
            }
        }

        info!(
            files = files.len(),
            fetch_failures = failures.len(),
            verification_failures = report.failures().len(),
            "artifact set resolved"
        );
        if failures.is_empty() {
            Ok(ArtifactSet { files, report })
        } else {
            Err(ResolveError::Artifacts { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::HighestVersionStrategy;
    use crate::graph::GraphResolver;
    use crate::memory::{MemoryArtifactStore, MemoryMetadataSource};
    use crate::metadata::{ComponentMetadata, DependencyMetadata, Variant};
    use girder_core::{ComponentId, ModuleId, ModuleVersionId, ProjectPath, VersionConstraint};
    use girder_verify::{ChecksumKind, VerifierBuilder};
    use std::io::Write;

    fn root_with(dependencies: Vec<DependencyMetadata>) -> ComponentMetadata {
        let module_version = ModuleVersionId::parse("test:app:1.0").expect("valid id");
        let mut variant = Variant::new("default");
        variant.dependencies = dependencies;
        ComponentMetadata::new(
            ComponentId::Project(ProjectPath::new(":app")),
            module_version,
            vec![variant],
        )
    }

    fn dep(target: &str, version: &str) -> DependencyMetadata {
        DependencyMetadata::new(
            ModuleId::parse(target).expect("valid id"),
            VersionConstraint::exactly(version),
        )
    }

    fn artifact(id: &str, file: &str) -> ArtifactId {
        ArtifactId::new(ModuleVersionId::parse(id).expect("valid id"), file)
    }

    // echo -n "hello world" | sha256sum
    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn fetches_and_verifies_the_whole_set() {
        let mut source = MemoryMetadataSource::new();
        source.add_module("test:lib:1.0", vec![dep("test:dep", "1.0")]);
        source.add_module("test:dep:1.0", vec![]);
        let strategy = HighestVersionStrategy;
        let graph = GraphResolver::new(&source, &strategy)
            .resolve(root_with(vec![dep("test:lib", "1.0")]))
            .expect("resolves");

        let dir = tempfile::tempdir().expect("temp dir");
        let mut store = MemoryArtifactStore::new();
        for name in ["lib-1.0.jar", "dep-1.0.jar"] {
            let path = dir.path().join(name);
            let mut file = std::fs::File::create(&path).expect("create");
            file.write_all(b"hello world").expect("write");
            let id = if name.starts_with("lib") {
                artifact("test:lib:1.0", name)
            } else {
                artifact("test:dep:1.0", name)
            };
            store.put(id, path);
        }

        // sha256 records are correct for lib, stale for dep: exactly one
        // verification failure, and the set still resolves.
        let builder = VerifierBuilder::default();
        builder.add_checksum(
            &artifact("test:lib:1.0", "lib-1.0.jar"),
            ChecksumKind::Sha256,
            HELLO_SHA256,
        );
        builder.add_checksum(
            &artifact("test:dep:1.0", "dep-1.0.jar"),
            ChecksumKind::Sha256,
            "00",
        );
        let verifier = builder.build();

        let set = ArtifactSetResolver::with_verifier(&store, &verifier)
            .resolve(&graph)
            .expect("resolves");
        assert_eq!(set.files().len(), 2);
        assert_eq!(set.verification().failures().len(), 1);
        assert_eq!(
            set.verification().failures()[0].artifact,
            artifact("test:dep:1.0", "dep-1.0.jar")
        );
    }

    #[test]
    fn missing_artifacts_are_collected_not_fail_fast() {
        let mut source = MemoryMetadataSource::new();
        source.add_module("test:a:1.0", vec![]);
        source.add_module("test:b:1.0", vec![]);
        let strategy = HighestVersionStrategy;
        let graph = GraphResolver::new(&source, &strategy)
            .resolve(root_with(vec![dep("test:a", "1.0"), dep("test:b", "1.0")]))
            .expect("resolves");

        let store = MemoryArtifactStore::new();
        let error = ArtifactSetResolver::new(&store)
            .resolve(&graph)
            .expect_err("must fail");
        let ResolveError::Artifacts { failures } = error else {
            panic!("expected artifact failures");
        };
        assert_eq!(failures.len(), 2);
    }
}
