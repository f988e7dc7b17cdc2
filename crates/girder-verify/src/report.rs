//! Plain-text summary of collected verification failures.

use crate::verifier::VerificationFailure;
use girder_core::ArtifactId;
use std::fmt::Write;

/// Aggregates verification failures across one resolution and renders them
/// grouped by artifact.
#[derive(Debug, Default)]
pub struct VerificationReport {
    failures: Vec<VerificationFailure>,
}

impl VerificationReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure.
    pub fn record(&mut self, failure: VerificationFailure) {
        self.failures.push(failure);
    }

    /// Whether any failure was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// All recorded failures, in discovery order.
    #[must_use]
    pub fn failures(&self) -> &[VerificationFailure] {
        &self.failures
    }

    /// Render the report as text, one section per artifact.
    #[must_use]
    pub fn render(&self) -> String {
        if self.failures.is_empty() {
            return "Dependency verification passed.".to_string();
        }
        let mut out = format!(
            "Dependency verification failed: {} checksum mismatch{}\n",
            self.failures.len(),
            if self.failures.len() == 1 { "" } else { "es" }
        );
        let mut current: Option<&ArtifactId> = None;
        for failure in &self.failures {
            if current != Some(&failure.artifact) {
                let _ = writeln!(out, "  - {}", failure.artifact);
                current = Some(&failure.artifact);
            }
            let _ = writeln!(
                out,
                "      {}: expected '{}', actual '{}'",
                failure.kind, failure.expected, failure.actual
            );
        }
        out.push_str(
            "If the artifacts are legitimate, update the verification metadata file \
             with the new checksums.",
        );
        out
    }
}
