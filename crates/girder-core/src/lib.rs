//! Core types for the Girder dependency-resolution engine.
//!
//! This crate holds the value types shared by every other Girder crate:
//!
//! - [`module`]: module, component and artifact identifiers
//! - [`version`]: the version model and the configurable comparator
//! - [`selector`]: version selectors and constraint merging primitives
//! - [`error`]: parse errors for the above

pub mod error;
pub mod module;
pub mod selector;
pub mod version;

pub use error::{Error, Result};
pub use module::{ArtifactId, ComponentId, ModuleId, ModuleVersionId, ProjectPath};
pub use selector::{
    UnionVersionSelector, VersionConstraint, VersionRange, VersionSelector,
};
pub use version::{Version, VersionComparator};
