//! Persisted verification metadata.
//!
//! The on-disk format is JSON: a list of components, each with its
//! artifacts and a map of checksum-kind name to hex digest. Loaded once at
//! session start; the verifier built from it is read-only for the rest of
//! the session.

use crate::checksum::ChecksumKind;
use crate::trust::VerificationConfiguration;
use crate::verifier::{DependencyVerifier, VerifierBuilder};
use crate::{Result, VerifyError};
use girder_core::{ArtifactId, ModuleId, ModuleVersionId, Version};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct StoredMetadata {
    #[serde(default)]
    components: Vec<StoredComponent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredComponent {
    group: String,
    name: String,
    version: String,
    artifacts: Vec<StoredArtifact>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredArtifact {
    name: String,
    checksums: BTreeMap<String, String>,
}

/// Load the verification metadata file and freeze it into a verifier.
///
/// # Errors
/// Returns an error when the file cannot be read, is not valid JSON, or
/// names an unknown checksum kind.
pub fn load(path: &Path, config: VerificationConfiguration) -> Result<DependencyVerifier> {
    let io = |source| VerifyError::Io {
        path: path.to_path_buf(),
        source,
    };
    let content = std::fs::read_to_string(path).map_err(io)?;
    let stored: StoredMetadata =
        serde_json::from_str(&content).map_err(|e| VerifyError::InvalidMetadata {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let builder = VerifierBuilder::new(config);
    let mut artifacts = 0usize;
    for component in stored.components {
        let id = ModuleVersionId::new(
            ModuleId::new(component.group, component.name),
            Version::parse(&component.version),
        );
        for artifact in component.artifacts {
            artifacts += 1;
            let artifact_id = ArtifactId::new(id.clone(), artifact.name);
            for (kind, value) in artifact.checksums {
                builder.add_checksum(&artifact_id, ChecksumKind::parse(&kind)?, &value);
            }
        }
    }
    debug!(path = %path.display(), artifacts, "loaded verification metadata");
    Ok(builder.build())
}

/// Write a verifier's recorded checksums back to the metadata file.
///
/// Components and artifacts are written in sorted order so the file is
/// stable across sessions.
///
/// # Errors
/// Returns an error when the file cannot be written.
pub fn write(path: &Path, verifier: &DependencyVerifier) -> Result<()> {
    let mut components: Vec<StoredComponent> = verifier
        .entries()
        .map(|(id, artifacts)| {
            let mut stored: Vec<StoredArtifact> = artifacts
                .iter()
                .map(|(file_name, checksums)| StoredArtifact {
                    name: file_name.clone(),
                    checksums: checksums
                        .strongest_first()
                        .iter()
                        .map(|c| (c.kind.as_str().to_string(), c.value.clone()))
                        .collect(),
                })
                .collect();
            stored.sort_by(|a, b| a.name.cmp(&b.name));
            StoredComponent {
                group: id.module().group().to_string(),
                name: id.module().name().to_string(),
                version: id.version().raw().to_string(),
                artifacts: stored,
            }
        })
        .collect();
    components.sort_by(|a, b| {
        (&a.group, &a.name, &a.version).cmp(&(&b.group, &b.name, &b.version))
    });

    let json = serde_json::to_string_pretty(&StoredMetadata { components }).map_err(|e| {
        VerifyError::InvalidMetadata {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    std::fs::write(path, json).map_err(|source| VerifyError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(id: &str, file: &str) -> ArtifactId {
        ArtifactId::new(ModuleVersionId::parse(id).expect("valid id"), file)
    }

    #[test]
    fn round_trip() {
        let builder = VerifierBuilder::default();
        builder.add_checksum(
            &artifact("com.acme:lib:1.0", "lib-1.0.jar"),
            ChecksumKind::Sha256,
            "aa",
        );
        builder.add_checksum(
            &artifact("com.acme:lib:1.0", "lib-1.0.jar"),
            ChecksumKind::Md5,
            "bb",
        );
        builder.add_checksum(
            &artifact("org.other:tool:2.0", "tool-2.0.jar"),
            ChecksumKind::Sha512,
            "cc",
        );
        let verifier = builder.build();

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("verification-metadata.json");
        write(&path, &verifier).expect("writes");

        let loaded = load(&path, VerificationConfiguration::new()).expect("loads");
        let checksums = loaded
            .checksums_for(&artifact("com.acme:lib:1.0", "lib-1.0.jar"))
            .expect("recorded");
        assert_eq!(checksums.strongest_first().len(), 2);
        assert_eq!(checksums.strongest_first()[0].kind, ChecksumKind::Sha256);
        assert!(
            loaded
                .checksums_for(&artifact("org.other:tool:2.0", "tool-2.0.jar"))
                .is_some()
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("verification-metadata.json");
        std::fs::write(
            &path,
            r#"{"components":[{"group":"g","name":"n","version":"1","artifacts":[{"name":"n-1.jar","checksums":{"crc32":"aa"}}]}]}"#,
        )
        .expect("write");
        let result = load(&path, VerificationConfiguration::new());
        assert!(matches!(result, Err(VerifyError::UnknownChecksumKind(_))));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("verification-metadata.json");
        std::fs::write(&path, "not json").expect("write");
        let result = load(&path, VerificationConfiguration::new());
        assert!(matches!(result, Err(VerifyError::InvalidMetadata { .. })));
    }
}
