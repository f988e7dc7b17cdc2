//! Version model and the configurable version comparator.
//!
//! Versions are split into dot/dash separated parts; parts are numeric or
//! qualifier strings. Ordering is not hardcoded on the type: it is supplied
//! by a [`VersionComparator`], whose qualifier-rank table is a configuration
//! point. The default table orders pre-release qualifiers below the release
//! of the same numeric prefix:
//!
//! `dev < alpha < beta < milestone < rc < snapshot < release`
//!
//! Qualifiers missing from the table rank above every known qualifier and
//! order lexicographically among themselves.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One parsed part of a version string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Part {
    Numeric(u64),
    Qualifier(String),
}

/// A parsed version.
///
/// Parsing is infallible: any string yields a version, the way build tools
/// must tolerate whatever a repository publishes. Equality and hashing are
/// structural over the parsed parts, so `1.0` and `01.0` are the same
/// version while `1.0` and `1.0.0` are not.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    parts: Vec<Part>,
}

impl Version {
    /// Parse a version string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut parts = Vec::new();
        let mut chunk = String::new();
        let mut prev_digit = None;
        for c in s.chars() {
            let is_sep = matches!(c, '.' | '-' | '_' | '+');
            let is_digit = c.is_ascii_digit();
            let boundary = is_sep || prev_digit.is_some_and(|p| p != is_digit);
            if boundary && !chunk.is_empty() {
                parts.push(Self::chunk_to_part(&chunk));
                chunk.clear();
            }
            if !is_sep {
                chunk.push(c);
            }
            prev_digit = if is_sep { None } else { Some(is_digit) };
        }
        if !chunk.is_empty() {
            parts.push(Self::chunk_to_part(&chunk));
        }
        Self {
            raw: s.to_string(),
            parts,
        }
    }

    fn chunk_to_part(chunk: &str) -> Part {
        match chunk.parse::<u64>() {
            Ok(n) => Part::Numeric(n),
            Err(_) => Part::Qualifier(chunk.to_string()),
        }
    }

    /// The original version string.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether any part of the version is a non-numeric qualifier.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, Part::Qualifier(_)))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Compares two versions using a qualifier-rank table.
///
/// The table maps qualifier strings (lowercase) to ranks; lower ranks order
/// earlier. Qualifiers absent from the table rank above all known ones and
/// compare lexicographically (case-insensitive) among themselves.
#[derive(Debug, Clone)]
pub struct VersionComparator {
    ranks: HashMap<String, u32>,
}

impl Default for VersionComparator {
    fn default() -> Self {
        Self::with_table([
            ("dev", 0),
            ("alpha", 1),
            ("a", 1),
            ("beta", 2),
            ("b", 2),
            ("milestone", 3),
            ("m", 3),
            ("rc", 4),
            ("cr", 4),
            ("snapshot", 5),
            ("ga", 6),
            ("final", 6),
            ("release", 6),
            ("sp", 7),
        ])
    }
}

impl VersionComparator {
    /// Create a comparator with a custom qualifier-rank table.
    #[must_use]
    pub fn with_table<S: Into<String>>(entries: impl IntoIterator<Item = (S, u32)>) -> Self {
        Self {
            ranks: entries
                .into_iter()
                .map(|(q, r)| (q.into().to_lowercase(), r))
                .collect(),
        }
    }

    /// Compare two versions.
    #[must_use]
    pub fn compare(&self, a: &Version, b: &Version) -> Ordering {
        let len = a.parts.len().max(b.parts.len());
        for i in 0..len {
            let ordering = match (a.parts.get(i), b.parts.get(i)) {
                (Some(x), Some(y)) => self.compare_parts(x, y),
                // A trailing numeric part extends the version upward
                // (1.0.1 > 1.0); a trailing qualifier is a pre-release of
                // the shorter version (1.0-alpha < 1.0).
                (Some(Part::Numeric(_)), None) => Ordering::Greater,
                (Some(Part::Qualifier(_)), None) => Ordering::Less,
                (None, Some(Part::Numeric(_))) => Ordering::Less,
                (None, Some(Part::Qualifier(_))) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn compare_parts(&self, a: &Part, b: &Part) -> Ordering {
        match (a, b) {
            (Part::Numeric(x), Part::Numeric(y)) => x.cmp(y),
            (Part::Numeric(_), Part::Qualifier(_)) => Ordering::Greater,
            (Part::Qualifier(_), Part::Numeric(_)) => Ordering::Less,
            (Part::Qualifier(x), Part::Qualifier(y)) => {
                let x = x.to_lowercase();
                let y = y.to_lowercase();
                match (self.ranks.get(&x), self.ranks.get(&y)) {
                    (Some(rx), Some(ry)) => rx.cmp(ry),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => x.cmp(&y),
                }
            }
        }
    }

    /// Pick the highest of two versions, preferring `a` on ties.
    #[must_use]
    pub fn max<'a>(&self, a: &'a Version, b: &'a Version) -> &'a Version {
        if self.compare(a, b) == Ordering::Less { b } else { a }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1.0", "1.1"; "minor bump")]
    #[test_case("1.0", "1.0.1"; "extra numeric part extends upward")]
    #[test_case("1.9", "1.10"; "numeric not lexicographic")]
    #[test_case("1.0-alpha", "1.0"; "prerelease below release")]
    #[test_case("1.0-rc-1", "1.0"; "rc below release")]
    #[test_case("1.0-dev", "1.0-alpha"; "dev below alpha")]
    #[test_case("1.0-alpha", "1.0-beta"; "alpha below beta")]
    #[test_case("1.0-beta", "1.0-milestone"; "beta below milestone")]
    #[test_case("1.0-milestone", "1.0-rc"; "milestone below rc")]
    #[test_case("1.0-rc", "1.0-snapshot"; "rc below snapshot")]
    #[test_case("1.0-rc-1", "1.0-rc-2"; "numbered prereleases")]
    #[test_case("1.0-rc", "1.0-xyz"; "known qualifier below unknown")]
    #[test_case("1.0-abc", "1.0-xyz"; "unknown qualifiers lexicographic")]
    #[test_case("1.9", "2.0"; "major bump")]
    fn ordering(lower: &str, higher: &str) {
        let cmp = VersionComparator::default();
        let lo = Version::parse(lower);
        let hi = Version::parse(higher);
        assert_eq!(cmp.compare(&lo, &hi), Ordering::Less);
        assert_eq!(cmp.compare(&hi, &lo), Ordering::Greater);
    }

    #[test]
    fn equal_rank_qualifiers() {
        let cmp = VersionComparator::default();
        assert_eq!(
            cmp.compare(&Version::parse("1.0-final"), &Version::parse("1.0-release")),
            Ordering::Equal
        );
        assert_eq!(
            cmp.compare(&Version::parse("1.0-a"), &Version::parse("1.0-alpha")),
            Ordering::Equal
        );
    }

    #[test]
    fn structural_equality() {
        assert_eq!(Version::parse("1.0"), Version::parse("01.0"));
        assert_ne!(Version::parse("1.0"), Version::parse("1.0.0"));
        assert_eq!(Version::parse("1.0-RC1"), Version::parse("1.0-RC1"));
    }

    #[test]
    fn digit_letter_boundary_splits() {
        let cmp = VersionComparator::default();
        // "1.0rc1" splits into 1, 0, rc, 1
        assert_eq!(
            cmp.compare(&Version::parse("1.0rc1"), &Version::parse("1.0-rc-1")),
            Ordering::Equal
        );
    }

    #[test]
    fn custom_table_overrides_default() {
        let cmp = VersionComparator::with_table([("nightly", 0), ("stable", 1)]);
        assert_eq!(
            cmp.compare(&Version::parse("1.0-nightly"), &Version::parse("1.0-stable")),
            Ordering::Less
        );
    }

    #[test]
    fn qualified_detection() {
        assert!(Version::parse("1.0-alpha").is_qualified());
        assert!(!Version::parse("1.0.3").is_qualified());
    }
}
