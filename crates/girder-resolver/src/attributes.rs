//! Attribute sets carried by edges and variants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A small ordered set of named attributes, e.g. `usage=api`.
///
/// Two sets are compatible when no key they share maps to different values;
/// keys present on only one side do not conflict.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeSet {
    entries: BTreeMap<String, String>,
}

impl AttributeSet {
    /// An empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether the set has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the two sets agree on every shared key.
    #[must_use]
    pub fn compatible_with(&self, other: &Self) -> bool {
        self.entries
            .iter()
            .all(|(k, v)| other.entries.get(k).is_none_or(|o| o == v))
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_is_agreement_on_shared_keys() {
        let api = AttributeSet::new().with("usage", "api");
        let runtime = AttributeSet::new().with("usage", "runtime");
        let api_linux = AttributeSet::new().with("usage", "api").with("os", "linux");

        assert!(api.compatible_with(&api_linux));
        assert!(api_linux.compatible_with(&api));
        assert!(!api.compatible_with(&runtime));
        assert!(AttributeSet::new().compatible_with(&runtime));
    }

    #[test]
    fn display_is_key_ordered() {
        let set = AttributeSet::new().with("usage", "api").with("os", "linux");
        assert_eq!(set.to_string(), "os=linux, usage=api");
    }
}
