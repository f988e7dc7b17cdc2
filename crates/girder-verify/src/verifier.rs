//! The dependency verifier and its builder.

use crate::checksum::{self, ChecksumKind};
use crate::trust::VerificationConfiguration;
use crate::Result;
use ahash::AHashMap;
use girder_core::{ArtifactId, ModuleVersionId};
use parking_lot::Mutex;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// One recorded checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    /// The checksum kind.
    pub kind: ChecksumKind,
    /// Hex-encoded expected digest.
    pub value: String,
}

/// The recorded checksums for one artifact, kept strongest-first.
#[derive(Debug, Clone, Default)]
pub struct ArtifactChecksums {
    checksums: Vec<Checksum>,
}

impl ArtifactChecksums {
    /// Record a checksum, replacing any existing value of the same kind and
    /// keeping the list ordered strongest-first.
    pub fn record(&mut self, kind: ChecksumKind, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self.checksums.iter_mut().find(|c| c.kind == kind) {
            existing.value = value;
            return;
        }
        self.checksums.push(Checksum { kind, value });
        self.checksums.sort_by(|a, b| b.kind.cmp(&a.kind));
    }

    /// The checksums, strongest first.
    #[must_use]
    pub fn strongest_first(&self) -> &[Checksum] {
        &self.checksums
    }
}

/// A checksum mismatch found by [`DependencyVerifier::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    /// The artifact that failed.
    pub artifact: ArtifactId,
    /// The checksum kind that mismatched.
    pub kind: ChecksumKind,
    /// The expected digest from the verification metadata.
    pub expected: String,
    /// The digest actually computed from the file.
    pub actual: String,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "on artifact {}: expected a '{}' checksum of '{}' but was '{}'",
            self.artifact, self.kind, self.expected, self.actual
        )
    }
}

/// Immutable map from component to per-artifact checksum records.
///
/// Built once per session via [`VerifierBuilder`] or loaded from the
/// persisted metadata file; read-only afterwards, safe for unsynchronized
/// concurrent reads.
#[derive(Debug)]
pub struct DependencyVerifier {
    config: VerificationConfiguration,
    components: AHashMap<ModuleVersionId, AHashMap<String, ArtifactChecksums>>,
}

impl DependencyVerifier {
    /// The trust configuration in effect.
    #[must_use]
    pub fn configuration(&self) -> &VerificationConfiguration {
        &self.config
    }

    /// The recorded checksums for an artifact, if any.
    #[must_use]
    pub fn checksums_for(&self, artifact: &ArtifactId) -> Option<&ArtifactChecksums> {
        self.components
            .get(artifact.component())?
            .get(artifact.file_name())
    }

    /// Iterate all recorded components and their artifact checksums.
    pub fn entries(
        &self,
    ) -> impl Iterator<Item = (&ModuleVersionId, &AHashMap<String, ArtifactChecksums>)> {
        self.components.iter()
    }

    /// Verify a downloaded file against the recorded checksums.
    ///
    /// Trusted artifacts and artifacts without recorded metadata verify as
    /// a no-op. Every recorded kind is checked independently, strongest
    /// first; each mismatch is delivered through `on_failure`. Mismatches
    /// are never returned as errors so that a single bad artifact does not
    /// mask other problems in the same resolution.
    ///
    /// # Errors
    /// Returns an error only when the file cannot be read.
    pub fn verify(
        &self,
        artifact: &ArtifactId,
        file: &Path,
        on_failure: &mut dyn FnMut(VerificationFailure),
    ) -> Result<()> {
        if self.config.is_trusted(artifact) {
            debug!(artifact = %artifact, "trusted, skipping verification");
            return Ok(());
        }
        let Some(recorded) = self.checksums_for(artifact) else {
            return Ok(());
        };
        for checksum in recorded.strongest_first() {
            let actual = checksum::compute_checksum(checksum.kind, file)?;
            if !checksum::hex_digests_match(&checksum.value, &actual) {
                warn!(
                    artifact = %artifact,
                    kind = %checksum.kind,
                    "checksum mismatch"
                );
                on_failure(VerificationFailure {
                    artifact: artifact.clone(),
                    kind: checksum.kind,
                    expected: checksum.value.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Accumulates checksums while artifacts are being discovered.
///
/// `add_checksum` takes `&self` and locks internally: checksum discovery
/// runs concurrently with parallel artifact downloads, and this builder is
/// the one structure in the engine shared across producer threads.
#[derive(Debug, Default)]
pub struct VerifierBuilder {
    config: VerificationConfiguration,
    components: Mutex<AHashMap<ModuleVersionId, AHashMap<String, ArtifactChecksums>>>,
}

impl VerifierBuilder {
    /// Create a builder with the given trust configuration.
    #[must_use]
    pub fn new(config: VerificationConfiguration) -> Self {
        Self {
            config,
            components: Mutex::new(AHashMap::new()),
        }
    }

    /// Record a checksum for an artifact.
    pub fn add_checksum(&self, artifact: &ArtifactId, kind: ChecksumKind, value: &str) {
        let mut components = self.components.lock();
        components
            .entry(artifact.component().clone())
            .or_default()
            .entry(artifact.file_name().to_string())
            .or_default()
            .record(kind, value);
    }

    /// Freeze into an immutable verifier.
    #[must_use]
    pub fn build(self) -> DependencyVerifier {
        DependencyVerifier {
            config: self.config,
            components: self.components.into_inner(),
        }
    }
}
