//! Component metadata and the injected collaborator seams.
//!
//! The engine never talks to repositories itself. It consumes a
//! [`ComponentMetadataSource`] (resolve a selector to a component id, fetch
//! a component's metadata) and an [`ArtifactFetchService`] (produce a local
//! file for a resolved artifact). Both may block; the graph builder joins
//! their results back into its single-threaded mutation loop.

use crate::attributes::AttributeSet;
use crate::exclude::ExclusionSpec;
use girder_core::{
    ArtifactId, ComponentId, ModuleId, ModuleVersionId, UnionVersionSelector, Version,
    VersionConstraint,
};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One dependency declaration inside component metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyMetadata {
    /// The module the dependency targets.
    pub target: ModuleId,
    /// The declared version constraint.
    pub constraint: VersionConstraint,
    /// Whether the declaration carries a force flag.
    pub force: bool,
    /// Whether the target's own dependencies are followed.
    pub transitive: bool,
    /// Exclusions applied to the target's transitive dependencies.
    pub exclusions: ExclusionSpec,
    /// Attributes specific to this declaration.
    pub attributes: AttributeSet,
}

impl DependencyMetadata {
    /// A plain transitive dependency.
    #[must_use]
    pub fn new(target: ModuleId, constraint: VersionConstraint) -> Self {
        Self {
            target,
            constraint,
            force: false,
            transitive: true,
            exclusions: ExclusionSpec::none(),
            attributes: AttributeSet::new(),
        }
    }

    /// Set the force flag.
    #[must_use]
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Do not follow the target's own dependencies.
    #[must_use]
    pub fn intransitive(mut self) -> Self {
        self.transitive = false;
        self
    }

    /// Attach exclusions.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: ExclusionSpec) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Attach attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeSet) -> Self {
        self.attributes = attributes;
        self
    }
}

impl fmt::Display for DependencyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.target, self.constraint)
    }
}

/// One variant of a component, e.g. api vs runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Variant name.
    pub name: String,
    /// Attributes advertised by the variant.
    pub attributes: AttributeSet,
    /// Dependencies of the variant.
    pub dependencies: Vec<DependencyMetadata>,
    /// Artifact file names the variant provides.
    pub artifacts: Vec<String>,
}

impl Variant {
    /// An empty variant.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: AttributeSet::new(),
            dependencies: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Attach attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeSet) -> Self {
        self.attributes = attributes;
        self
    }

    /// Add a dependency.
    #[must_use]
    pub fn with_dependency(mut self, dependency: DependencyMetadata) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Add an artifact file name.
    #[must_use]
    pub fn with_artifact(mut self, file_name: impl Into<String>) -> Self {
        self.artifacts.push(file_name.into());
        self
    }
}

/// Full metadata for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentMetadata {
    id: ComponentId,
    module_version: ModuleVersionId,
    variants: Vec<Variant>,
}

impl ComponentMetadata {
    /// Create metadata. A component always has at least one variant; an
    /// empty list is replaced by a single variant named `default`.
    #[must_use]
    pub fn new(id: ComponentId, module_version: ModuleVersionId, variants: Vec<Variant>) -> Self {
        let variants = if variants.is_empty() {
            vec![Variant::new("default")]
        } else {
            variants
        };
        Self {
            id,
            module_version,
            variants,
        }
    }

    /// The component id.
    #[must_use]
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    /// The module version id.
    #[must_use]
    pub fn module_version(&self) -> &ModuleVersionId {
        &self.module_version
    }

    /// The variants, never empty.
    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }
}

/// Successful resolution of a selector to a component id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdResolveResult {
    /// The resolved component.
    pub id: ComponentId,
    /// Its module version.
    pub module_version: ModuleVersionId,
    /// Whether the chosen version is rejected by the reject filter. A
    /// rejected result still enters conflict resolution as a candidate but
    /// can never win.
    pub rejected: bool,
    /// Versions the source listed that did not match the selector.
    pub unmatched_versions: Vec<Version>,
    /// Versions that matched the selector but were rejected.
    pub rejected_versions: Vec<Version>,
}

/// Failure to resolve one selector. Non-fatal at the module level as long
/// as a sibling selector for the same module succeeds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorFailure {
    /// The module is unknown to the metadata source.
    #[error("module '{module}' not found")]
    ModuleNotFound {
        /// The requested module.
        module: ModuleId,
    },

    /// Versions exist but none satisfies the selector.
    #[error("no version of '{module}' matches '{constraint}'{}", describe_versions(unmatched, rejected))]
    NoMatchingVersion {
        /// The requested module.
        module: ModuleId,
        /// The constraint that failed, rendered.
        constraint: String,
        /// Versions that did not match the selector.
        unmatched: Vec<Version>,
        /// Versions rejected by a reject selector.
        rejected: Vec<Version>,
    },

    /// The selector carries no version expression and nothing else resolved
    /// the module.
    #[error("no version specified for '{module}'")]
    NoVersionSpecified {
        /// The requested module.
        module: ModuleId,
    },

    /// The only resolvable version is rejected by a reject constraint.
    #[error("version '{version}' of '{module}' is rejected by a reject constraint")]
    Rejected {
        /// The requested module.
        module: ModuleId,
        /// The rejected version.
        version: Version,
    },

    /// The metadata source failed, e.g. a transport error.
    #[error("failed to resolve '{module}': {message}")]
    Source {
        /// The requested module.
        module: ModuleId,
        /// Failure detail.
        message: String,
    },
}

fn describe_versions(unmatched: &[Version], rejected: &[Version]) -> String {
    let list = |versions: &[Version]| {
        versions
            .iter()
            .map(Version::raw)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut out = String::new();
    if !unmatched.is_empty() {
        out.push_str(&format!("; didn't match versions {}", list(unmatched)));
    }
    if !rejected.is_empty() {
        out.push_str(&format!("; rejected versions {}", list(rejected)));
    }
    out
}

/// Failure to fetch a component's metadata once its id is known.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not fetch metadata for {id}: {message}")]
pub struct MetadataFailure {
    /// The component.
    pub id: ComponentId,
    /// Failure detail.
    pub message: String,
}

/// Failure to produce a local file for an artifact.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not fetch {artifact}: {message}")]
pub struct ArtifactFailure {
    /// The artifact.
    pub artifact: ArtifactId,
    /// Failure detail.
    pub message: String,
}

/// The injected metadata collaborator.
///
/// Calls may block; the graph builder invokes them from its traversal loop
/// and merges results under that single mutation point.
pub trait ComponentMetadataSource {
    /// Resolve a constraint on a module to a concrete component id,
    /// honoring the merged reject filter.
    ///
    /// # Errors
    /// Returns a [`SelectorFailure`] when no acceptable component exists.
    fn resolve_id(
        &self,
        target: &ModuleId,
        constraint: &VersionConstraint,
        rejects: &UnionVersionSelector,
    ) -> Result<IdResolveResult, SelectorFailure>;

    /// Fetch full metadata for a resolved component.
    ///
    /// # Errors
    /// Returns a [`MetadataFailure`] when the metadata cannot be produced.
    fn resolve_metadata(&self, id: &ComponentId) -> Result<ComponentMetadata, MetadataFailure>;
}

/// The injected artifact download collaborator.
pub trait ArtifactFetchService {
    /// Produce a local file for the artifact.
    ///
    /// # Errors
    /// Returns an [`ArtifactFailure`] when the artifact cannot be fetched.
    fn fetch(&self, artifact: &ArtifactId) -> Result<PathBuf, ArtifactFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_variant_list_gets_default() {
        let id = ModuleVersionId::parse("com.acme:lib:1.0").expect("valid id");
        let metadata =
            ComponentMetadata::new(ComponentId::Module(id.clone()), id, Vec::new());
        assert_eq!(metadata.variants().len(), 1);
        assert_eq!(metadata.variants()[0].name, "default");
    }

    #[test]
    fn selector_failure_lists_candidates() {
        let failure = SelectorFailure::NoMatchingVersion {
            module: ModuleId::parse("com.acme:lib").expect("valid id"),
            constraint: "[2.0,3.0)".to_string(),
            unmatched: vec![Version::parse("1.0"), Version::parse("1.5")],
            rejected: vec![Version::parse("2.1")],
        };
        let message = failure.to_string();
        assert!(message.contains("didn't match versions 1.0, 1.5"));
        assert!(message.contains("rejected versions 2.1"));
    }
}
