//! Module, component and artifact identifiers.

use crate::error::Error;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a logical module (group + name), independent of version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    group: String,
    name: String,
}

impl ModuleId {
    /// Create a new module id.
    #[must_use]
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Parse from a `group:name` string.
    ///
    /// # Errors
    /// Returns an error when the string is not of the form `group:name`.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let (group, name) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidModuleId(s.to_string()))?;
        if group.is_empty() || name.is_empty() || name.contains(':') {
            return Err(Error::InvalidModuleId(s.to_string()));
        }
        Ok(Self::new(group, name))
    }

    /// Get the group.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Get the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// Identifies one version of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleVersionId {
    module: ModuleId,
    version: Version,
}

impl ModuleVersionId {
    /// Create a new module version id.
    #[must_use]
    pub fn new(module: ModuleId, version: Version) -> Self {
        Self { module, version }
    }

    /// Parse from a `group:name:version` string.
    ///
    /// # Errors
    /// Returns an error when the string is not of the form `group:name:version`.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(name), Some(version))
                if !group.is_empty() && !name.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(ModuleId::new(group, name), Version::parse(version)))
            }
            _ => Err(Error::InvalidModuleVersionId(s.to_string())),
        }
    }

    /// Get the module id.
    #[must_use]
    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    /// Get the version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl fmt::Display for ModuleVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.version)
    }
}

/// Path of a project inside the current build, e.g. `:core:api`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectPath(String);

impl ProjectPath {
    /// Create a new project path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Get the path string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project {}", self.0)
    }
}

/// Identifies one resolved component: an external module version, or a
/// project built as part of the current build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentId {
    /// An external module version.
    Module(ModuleVersionId),
    /// A project inside the current build.
    Project(ProjectPath),
}

impl ComponentId {
    /// Whether this component is a project of the current build.
    #[must_use]
    pub fn is_project(&self) -> bool {
        matches!(self, Self::Project(_))
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(id) => id.fmt(f),
            Self::Project(path) => path.fmt(f),
        }
    }
}

/// Identifies one artifact of a component, by owning component version and
/// file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId {
    component: ModuleVersionId,
    file_name: String,
}

impl ArtifactId {
    /// Create a new artifact id.
    #[must_use]
    pub fn new(component: ModuleVersionId, file_name: impl Into<String>) -> Self {
        Self {
            component,
            file_name: file_name.into(),
        }
    }

    /// Get the owning component version.
    #[must_use]
    pub fn component(&self) -> &ModuleVersionId {
        &self.component
    }

    /// Get the artifact file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.file_name, self.component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_module_id() {
        let id = ModuleId::parse("com.acme:lib").expect("valid module id should parse");
        assert_eq!(id.group(), "com.acme");
        assert_eq!(id.name(), "lib");
        assert_eq!(id.to_string(), "com.acme:lib");
    }

    #[test]
    fn invalid_module_id() {
        assert!(ModuleId::parse("no-colon").is_err());
        assert!(ModuleId::parse(":lib").is_err());
        assert!(ModuleId::parse("com.acme:").is_err());
        assert!(ModuleId::parse("a:b:c").is_err());
    }

    #[test]
    fn parse_module_version_id() {
        let id = ModuleVersionId::parse("com.acme:lib:1.5").expect("valid id should parse");
        assert_eq!(id.module().name(), "lib");
        assert_eq!(id.version().raw(), "1.5");
        assert_eq!(id.to_string(), "com.acme:lib:1.5");
    }

    #[test]
    fn component_id_display() {
        let module = ComponentId::Module(
            ModuleVersionId::parse("com.acme:lib:1.0").expect("valid id"),
        );
        assert_eq!(module.to_string(), "com.acme:lib:1.0");
        assert!(!module.is_project());

        let project = ComponentId::Project(ProjectPath::new(":core"));
        assert_eq!(project.to_string(), "project :core");
        assert!(project.is_project());
    }
}
