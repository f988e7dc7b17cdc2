//! Dependency verification for the Girder resolution engine.
//!
//! Validates downloaded artifact checksums against a trust configuration.
//! Verification is opt-in per component: a component without recorded
//! metadata verifies as a no-op. Failures are collected through a callback,
//! never raised mid-verification, so one bad artifact cannot mask problems
//! with the rest of a resolution.
//!
//! The verification lifecycle:
//!
//! 1. [`store::load`] reads the persisted metadata file at session start.
//! 2. During resolution, a [`VerifierBuilder`] may accumulate checksums as
//!    artifacts are discovered; `add_checksum` is internally locked because
//!    discovery runs concurrently with parallel downloads.
//! 3. `build()` freezes the builder into an immutable [`DependencyVerifier`]
//!    safe for unsynchronized concurrent reads.
//! 4. [`DependencyVerifier::verify`] checks a downloaded file, strongest
//!    checksum kind first, each configured kind independently.

pub mod checksum;
pub mod report;
pub mod store;
pub mod trust;
pub mod verifier;

pub use checksum::{ChecksumKind, compute_checksum, hex_digests_match};
pub use report::VerificationReport;
pub use trust::{TrustedArtifact, VerificationConfiguration};
pub use verifier::{
    ArtifactChecksums, Checksum, DependencyVerifier, VerificationFailure, VerifierBuilder,
};

use std::path::PathBuf;
use thiserror::Error;

/// Error type for verification operations.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// I/O error while reading an artifact or the metadata file.
    #[error("i/o error at {path}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed persisted verification metadata.
    #[error("invalid verification metadata in {path}: {message}")]
    InvalidMetadata {
        /// File path.
        path: PathBuf,
        /// Parse failure detail.
        message: String,
    },

    /// A checksum kind name that is not one of md5/sha1/sha256/sha512.
    #[error("unknown checksum kind '{0}'")]
    UnknownChecksumKind(String),

    /// A trust rule regex failed to compile.
    #[error("invalid trust pattern '{pattern}'")]
    InvalidTrustPattern {
        /// The offending pattern.
        pattern: String,
        /// Compile error.
        #[source]
        source: regex::Error,
    },
}

/// Result type for verification operations.
pub type Result<T> = std::result::Result<T, VerifyError>;
