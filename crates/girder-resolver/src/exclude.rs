//! Module exclusion rules carried by dependency edges.
//!
//! An exclusion names a group, a module, or both. Exclusions accumulate by
//! union along a path: a dependency excluded anywhere on the path from root
//! is filtered from the edges a node exposes. When several paths reach the
//! same node, only exclusions shared by every incoming path still apply,
//! so the specs are intersected at the node.

use girder_core::ModuleId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One exclusion rule. An absent field matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExcludeRule {
    group: Option<String>,
    module: Option<String>,
}

impl ExcludeRule {
    /// Exclude every module of a group.
    #[must_use]
    pub fn group(group: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            module: None,
        }
    }

    /// Exclude a specific module.
    #[must_use]
    pub fn module(group: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            module: Some(module.into()),
        }
    }

    /// Exclude any module with the given name, in any group.
    #[must_use]
    pub fn any_group(module: impl Into<String>) -> Self {
        Self {
            group: None,
            module: Some(module.into()),
        }
    }

    /// Whether the rule matches a module id.
    #[must_use]
    pub fn matches(&self, id: &ModuleId) -> bool {
        self.group.as_deref().is_none_or(|g| g == id.group())
            && self.module.as_deref().is_none_or(|m| m == id.name())
    }
}

impl fmt::Display for ExcludeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.group.as_deref().unwrap_or("*"),
            self.module.as_deref().unwrap_or("*")
        )
    }
}

/// A set of exclusion rules.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExclusionSpec {
    rules: Vec<ExcludeRule>,
}

impl ExclusionSpec {
    /// No exclusions.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A spec with the given rules.
    #[must_use]
    pub fn of(rules: impl IntoIterator<Item = ExcludeRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Whether any rule excludes the module.
    #[must_use]
    pub fn excludes(&self, id: &ModuleId) -> bool {
        self.rules.iter().any(|r| r.matches(id))
    }

    /// Union of two specs: everything excluded by either.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut rules = self.rules.clone();
        for rule in &other.rules {
            if !rules.contains(rule) {
                rules.push(rule.clone());
            }
        }
        Self { rules }
    }

    /// Intersection of two specs: rules present in both.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            rules: self
                .rules
                .iter()
                .filter(|r| other.rules.contains(r))
                .cloned()
                .collect(),
        }
    }

    /// Whether the spec has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ModuleId {
        ModuleId::parse(s).expect("valid module id")
    }

    #[test]
    fn rule_matching() {
        assert!(ExcludeRule::group("com.acme").matches(&id("com.acme:lib")));
        assert!(!ExcludeRule::group("com.acme").matches(&id("org.other:lib")));
        assert!(ExcludeRule::module("com.acme", "lib").matches(&id("com.acme:lib")));
        assert!(!ExcludeRule::module("com.acme", "lib").matches(&id("com.acme:other")));
        assert!(ExcludeRule::any_group("lib").matches(&id("org.other:lib")));
    }

    #[test]
    fn union_excludes_either() {
        let a = ExclusionSpec::of([ExcludeRule::group("com.acme")]);
        let b = ExclusionSpec::of([ExcludeRule::any_group("tool")]);
        let union = a.union(&b);
        assert!(union.excludes(&id("com.acme:lib")));
        assert!(union.excludes(&id("org.other:tool")));
        assert!(!union.excludes(&id("org.other:lib")));
    }

    #[test]
    fn intersect_keeps_shared_rules_only() {
        let shared = ExcludeRule::group("com.acme");
        let a = ExclusionSpec::of([shared.clone(), ExcludeRule::any_group("tool")]);
        let b = ExclusionSpec::of([shared]);
        let intersection = a.intersect(&b);
        assert!(intersection.excludes(&id("com.acme:lib")));
        assert!(!intersection.excludes(&id("org.other:tool")));
    }
}
