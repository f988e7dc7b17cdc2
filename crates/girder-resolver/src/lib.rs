//! The Girder dependency-resolution engine.
//!
//! Takes a set of requested module dependencies (version constraints,
//! exclusions, attributes) and produces a consistent, conflict-resolved
//! dependency graph plus a verified artifact set. Repositories are consumed
//! through two injected collaborators, a [`ComponentMetadataSource`] and an
//! [`ArtifactFetchService`]; the engine itself never performs transport.
//!
//! # Architecture
//!
//! - [`selection`]: merges every selector targeting one module into a
//!   single selected component ([`select_best`])
//! - [`conflict`]: pluggable strategies choosing among competing candidates
//! - [`graph`]: breadth-first graph construction with re-selection, the
//!   immutable [`ResolvedGraph`], visitor walks and shortest-path
//!   diagnostics
//! - [`lenient`]: error-deferring results for callers that must survive
//!   broken resolutions
//! - [`artifacts`]: fetching and checksum-verifying the artifact files
//!   behind a resolved graph
//!
//! # Example
//!
//! ```
//! use girder_core::{ComponentId, ModuleId, ModuleVersionId, VersionConstraint};
//! use girder_resolver::{
//!     ComponentMetadata, DependencyMetadata, GraphResolver, HighestVersionStrategy,
//!     MemoryMetadataSource, Variant,
//! };
//!
//! let mut source = MemoryMetadataSource::new();
//! source.add_module("com.acme:lib:1.0", vec![]);
//! source.add_module("com.acme:lib:2.0", vec![]);
//!
//! let root_id = ModuleVersionId::parse("com.acme:app:1.0").unwrap();
//! let root = ComponentMetadata::new(
//!     ComponentId::Module(root_id.clone()),
//!     root_id,
//!     vec![Variant::new("default").with_dependency(DependencyMetadata::new(
//!         ModuleId::parse("com.acme:lib").unwrap(),
//!         VersionConstraint::latest(),
//!     ))],
//! );
//!
//! let strategy = HighestVersionStrategy;
//! let graph = GraphResolver::new(&source, &strategy).resolve(root).unwrap();
//! assert_eq!(graph.module_versions().len(), 1);
//! ```

pub mod artifacts;
pub mod attributes;
pub mod conflict;
pub mod error;
pub mod exclude;
pub mod graph;
pub mod lenient;
pub mod memory;
pub mod metadata;
pub mod reason;
pub mod registry;
pub mod selection;
pub mod selectors;

pub use artifacts::{ArtifactSet, ArtifactSetResolver};
pub use attributes::AttributeSet;
pub use conflict::{
    ConflictCandidate, ConflictFailure, ConflictStrategy, HighestVersionStrategy,
    StrictVersionStrategy,
};
pub use error::{ResolveError, Result};
pub use exclude::{ExcludeRule, ExclusionSpec};
pub use graph::{
    GraphFailure, GraphFailurePoint, GraphResolver, GraphVisitor, ResolvedEdge, ResolvedGraph,
    ResolvedNode, ResolverConfig, calculate_paths,
};
pub use lenient::{LenientResolution, ResolutionError, ResolveContext};
pub use memory::{MemoryArtifactStore, MemoryMetadataSource};
pub use metadata::{
    ArtifactFailure, ArtifactFetchService, ComponentMetadata, ComponentMetadataSource,
    DependencyMetadata, IdResolveResult, MetadataFailure, SelectorFailure, Variant,
};
pub use reason::{SelectionCause, SelectionDescriptor, SelectionReason};
pub use registry::{CandidatePool, CandidateRecord, ComponentRecord, ComponentRegistry};
pub use selection::{RootCandidate, select_best};
pub use selectors::{ModuleSelectors, SelectorState};
