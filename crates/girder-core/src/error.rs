//! Error types for Girder core parsing.

use thiserror::Error;

/// Error type for core identifier and constraint parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Module identifier did not have the `group:name` shape.
    #[error("invalid module id '{0}', expected 'group:name'")]
    InvalidModuleId(String),

    /// Module version identifier did not have the `group:name:version` shape.
    #[error("invalid module version id '{0}', expected 'group:name:version'")]
    InvalidModuleVersionId(String),

    /// Version range syntax was not recognised.
    #[error("invalid version range '{0}': {1}")]
    InvalidRange(String, String),
}

/// Result type for core parsing operations.
pub type Result<T> = std::result::Result<T, Error>;
