//! Trust rules: which artifacts are exempt from checksum verification.

use crate::{Result, VerifyError};
use girder_core::ArtifactId;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One trust rule, matched against an artifact's group, name, version and
/// file name. Every configured field must match (AND semantics); an absent
/// field matches anything. Fields are literal strings unless the rule is
/// flagged as regex, in which case each configured field is a full-match
/// pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TrustedArtifactData", into = "TrustedArtifactData")]
pub struct TrustedArtifact {
    group: Option<String>,
    name: Option<String>,
    version: Option<String>,
    file_name: Option<String>,
    regex: bool,
    matchers: Matchers,
}

#[derive(Debug, Clone, Default)]
struct Matchers {
    group: Option<Regex>,
    name: Option<Regex>,
    version: Option<Regex>,
    file_name: Option<Regex>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrustedArtifactData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
    #[serde(default)]
    regex: bool,
}

impl TrustedArtifact {
    /// Create a literal rule. `None` fields match anything.
    #[must_use]
    pub fn literal(
        group: Option<&str>,
        name: Option<&str>,
        version: Option<&str>,
        file_name: Option<&str>,
    ) -> Self {
        Self {
            group: group.map(str::to_string),
            name: name.map(str::to_string),
            version: version.map(str::to_string),
            file_name: file_name.map(str::to_string),
            regex: false,
            matchers: Matchers::default(),
        }
    }

    /// Create a regex rule; each configured field is compiled as a
    /// full-match pattern.
    ///
    /// # Errors
    /// Returns an error when a pattern fails to compile.
    pub fn with_regex(
        group: Option<&str>,
        name: Option<&str>,
        version: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<Self> {
        let compile = |pattern: Option<&str>| -> Result<Option<Regex>> {
            pattern
                .map(|p| {
                    Regex::new(&format!("^(?:{p})$")).map_err(|source| {
                        VerifyError::InvalidTrustPattern {
                            pattern: p.to_string(),
                            source,
                        }
                    })
                })
                .transpose()
        };
        Ok(Self {
            matchers: Matchers {
                group: compile(group)?,
                name: compile(name)?,
                version: compile(version)?,
                file_name: compile(file_name)?,
            },
            group: group.map(str::to_string),
            name: name.map(str::to_string),
            version: version.map(str::to_string),
            file_name: file_name.map(str::to_string),
            regex: true,
        })
    }

    /// Whether this rule trusts the given artifact.
    #[must_use]
    pub fn matches(&self, artifact: &ArtifactId) -> bool {
        let component = artifact.component();
        self.field_matches(&self.group, &self.matchers.group, component.module().group())
            && self.field_matches(&self.name, &self.matchers.name, component.module().name())
            && self.field_matches(
                &self.version,
                &self.matchers.version,
                component.version().raw(),
            )
            && self.field_matches(
                &self.file_name,
                &self.matchers.file_name,
                artifact.file_name(),
            )
    }

    fn field_matches(&self, literal: &Option<String>, regex: &Option<Regex>, value: &str) -> bool {
        match literal {
            None => true,
            Some(_) if self.regex => regex.as_ref().is_some_and(|r| r.is_match(value)),
            Some(expected) => expected == value,
        }
    }
}

impl TryFrom<TrustedArtifactData> for TrustedArtifact {
    type Error = VerifyError;

    fn try_from(data: TrustedArtifactData) -> Result<Self> {
        if data.regex {
            Self::with_regex(
                data.group.as_deref(),
                data.name.as_deref(),
                data.version.as_deref(),
                data.file_name.as_deref(),
            )
        } else {
            Ok(Self::literal(
                data.group.as_deref(),
                data.name.as_deref(),
                data.version.as_deref(),
                data.file_name.as_deref(),
            ))
        }
    }
}

impl From<TrustedArtifact> for TrustedArtifactData {
    fn from(rule: TrustedArtifact) -> Self {
        Self {
            group: rule.group,
            name: rule.name,
            version: rule.version,
            file_name: rule.file_name,
            regex: rule.regex,
        }
    }
}

/// The trust configuration consulted before checksum verification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationConfiguration {
    #[serde(default)]
    trusted_artifacts: Vec<TrustedArtifact>,
}

impl VerificationConfiguration {
    /// Create an empty configuration: nothing trusted, everything with
    /// metadata verified.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trust rule.
    #[must_use]
    pub fn with_trusted(mut self, rule: TrustedArtifact) -> Self {
        self.trusted_artifacts.push(rule);
        self
    }

    /// Whether any rule trusts the artifact.
    #[must_use]
    pub fn is_trusted(&self, artifact: &ArtifactId) -> bool {
        self.trusted_artifacts.iter().any(|r| r.matches(artifact))
    }
}
