//! Version selectors and constraints.
//!
//! A [`VersionSelector`] evaluates one version expression against candidate
//! versions. A [`VersionConstraint`] is what a dependency declaration
//! carries: an optional require selector, an optional prefer selector, a
//! list of reject selectors and a strict flag. Reject selectors from
//! competing declarations on the same module are unioned with
//! [`UnionVersionSelector`]: a candidate rejected by any contributor is
//! rejected globally for that module.

use crate::error::Error;
use crate::version::{Version, VersionComparator};
use std::cmp::Ordering;
use std::fmt;

/// One bound of a version range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bound {
    version: Version,
    inclusive: bool,
}

impl Bound {
    /// The bound version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Whether the bound itself is included.
    #[must_use]
    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }
}

/// A version range in bracket syntax: `[1.0,2.0)`, `(1.0,)`, `[1.0]`.
///
/// `[` / `]` on the matching side include the bound, `(` / `)` exclude it;
/// the reversed-bracket style `]1.0,2.0[` is accepted as exclusive. An
/// empty side is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    lower: Option<Bound>,
    upper: Option<Bound>,
}

impl VersionRange {
    /// Parse a bracket-syntax range.
    ///
    /// # Errors
    /// Returns an error when brackets are missing or both sides are empty.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let invalid = |msg: &str| Error::InvalidRange(s.to_string(), msg.to_string());
        if s.chars().count() < 2 {
            return Err(invalid("too short"));
        }
        let open = s.chars().next().ok_or_else(|| invalid("empty"))?;
        let close = s.chars().last().ok_or_else(|| invalid("empty"))?;
        let lower_inclusive = match open {
            '[' => true,
            '(' | ']' => false,
            _ => return Err(invalid("expected '[', '(' or ']'")),
        };
        let upper_inclusive = match close {
            ']' => true,
            ')' | '[' => false,
            _ => return Err(invalid("expected ']', ')' or '['")),
        };
        let inner = &s[open.len_utf8()..s.len() - close.len_utf8()];
        let (lo, hi) = match inner.split_once(',') {
            Some((lo, hi)) => (lo.trim(), hi.trim()),
            // "[1.0]" pins a single version
            None => (inner.trim(), inner.trim()),
        };
        let lower = (!lo.is_empty()).then(|| Bound {
            version: Version::parse(lo),
            inclusive: lower_inclusive,
        });
        let upper = (!hi.is_empty()).then(|| Bound {
            version: Version::parse(hi),
            inclusive: upper_inclusive,
        });
        if lower.is_none() && upper.is_none() {
            return Err(invalid("both bounds empty"));
        }
        Ok(Self { lower, upper })
    }

    /// Whether a candidate falls within the range.
    #[must_use]
    pub fn contains(&self, candidate: &Version, cmp: &VersionComparator) -> bool {
        if let Some(lower) = &self.lower {
            match cmp.compare(candidate, &lower.version) {
                Ordering::Less => return false,
                Ordering::Equal if !lower.inclusive => return false,
                _ => {}
            }
        }
        if let Some(upper) = &self.upper {
            match cmp.compare(candidate, &upper.version) {
                Ordering::Greater => return false,
                Ordering::Equal if !upper.inclusive => return false,
                _ => {}
            }
        }
        true
    }

    /// The lower bound, if any.
    #[must_use]
    pub fn lower(&self) -> Option<&Bound> {
        self.lower.as_ref()
    }

    /// The upper bound, if any.
    #[must_use]
    pub fn upper(&self) -> Option<&Bound> {
        self.upper.as_ref()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Some(b) if b.inclusive => write!(f, "[{}", b.version)?,
            Some(b) => write!(f, "({}", b.version)?,
            None => f.write_str("(")?,
        }
        f.write_str(",")?;
        match &self.upper {
            Some(b) if b.inclusive => write!(f, "{}]", b.version),
            Some(b) => write!(f, "{})", b.version),
            None => f.write_str(")"),
        }
    }
}

/// A single version expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionSelector {
    /// Accepts exactly one version.
    Exact(Version),
    /// Accepts versions within a range.
    Range(VersionRange),
    /// Dynamic selector: accepts any version, resolution picks the latest
    /// available candidate.
    Latest,
}

impl VersionSelector {
    /// Parse a version expression: bracket syntax yields a range, `latest`
    /// or `+` a dynamic selector, anything else an exact version.
    ///
    /// # Errors
    /// Returns an error for malformed bracket ranges.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let s = s.trim();
        if s == "latest" || s == "+" {
            return Ok(Self::Latest);
        }
        if s.starts_with(['[', '(', ']']) {
            return VersionRange::parse(s).map(Self::Range);
        }
        Ok(Self::Exact(Version::parse(s)))
    }

    /// Whether the selector accepts a candidate version.
    #[must_use]
    pub fn accepts(&self, candidate: &Version, cmp: &VersionComparator) -> bool {
        match self {
            Self::Exact(v) => cmp.compare(v, candidate) == Ordering::Equal,
            Self::Range(range) => range.contains(candidate, cmp),
            Self::Latest => true,
        }
    }

    /// Whether this selector needs the metadata source to enumerate
    /// candidates rather than naming them.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Latest)
    }

    /// Whether this selector names exactly one version.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => v.fmt(f),
            Self::Range(r) => r.fmt(f),
            Self::Latest => f.write_str("latest"),
        }
    }
}

/// Union of reject selectors from every declaration targeting one module.
#[derive(Debug, Clone, Default)]
pub struct UnionVersionSelector {
    members: Vec<VersionSelector>,
}

impl UnionVersionSelector {
    /// Build a union from the given members.
    #[must_use]
    pub fn new(members: Vec<VersionSelector>) -> Self {
        Self { members }
    }

    /// Whether the union has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether any member accepts the candidate. For a reject union this
    /// means the candidate is rejected.
    #[must_use]
    pub fn accepts_any(&self, candidate: &Version, cmp: &VersionComparator) -> bool {
        self.members.iter().any(|m| m.accepts(candidate, cmp))
    }
}

/// The version constraint carried by one dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionConstraint {
    require: Option<VersionSelector>,
    prefer: Option<VersionSelector>,
    rejects: Vec<VersionSelector>,
    strict: bool,
}

impl VersionConstraint {
    /// A constraint with no version expression at all. Such a constraint
    /// never resolves by itself; it exists to carry rejects, exclusions and
    /// attributes alongside other declarations.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Require the given selector.
    #[must_use]
    pub fn require(selector: VersionSelector) -> Self {
        Self {
            require: Some(selector),
            ..Self::default()
        }
    }

    /// Require exactly the given version.
    #[must_use]
    pub fn exactly(version: impl Into<Version>) -> Self {
        Self::require(VersionSelector::Exact(version.into()))
    }

    /// Require a bracket-syntax range.
    ///
    /// # Errors
    /// Returns an error for malformed bracket ranges.
    pub fn within(range: &str) -> Result<Self, Error> {
        Ok(Self::require(VersionSelector::Range(VersionRange::parse(
            range,
        )?)))
    }

    /// Require the latest available version.
    #[must_use]
    pub fn latest() -> Self {
        Self::require(VersionSelector::Latest)
    }

    /// Add a preferred selector.
    #[must_use]
    pub fn with_prefer(mut self, selector: VersionSelector) -> Self {
        self.prefer = Some(selector);
        self
    }

    /// Add a reject selector.
    #[must_use]
    pub fn with_reject(mut self, selector: VersionSelector) -> Self {
        self.rejects.push(selector);
        self
    }

    /// Mark the constraint strict.
    #[must_use]
    pub fn strictly(mut self) -> Self {
        self.strict = true;
        self
    }

    /// The required selector, if any.
    #[must_use]
    pub fn required(&self) -> Option<&VersionSelector> {
        self.require.as_ref()
    }

    /// The preferred selector, if any.
    #[must_use]
    pub fn preferred(&self) -> Option<&VersionSelector> {
        self.prefer.as_ref()
    }

    /// The selector resolution should use: require wins over prefer.
    #[must_use]
    pub fn selector(&self) -> Option<&VersionSelector> {
        self.require.as_ref().or(self.prefer.as_ref())
    }

    /// Reject selectors declared on this constraint.
    #[must_use]
    pub fn rejects(&self) -> &[VersionSelector] {
        &self.rejects
    }

    /// Whether the constraint is strict.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether the constraint carries no version expression.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.require.is_none() && self.prefer.is_none()
    }

    /// Whether the constraint's own selectors accept a candidate.
    #[must_use]
    pub fn accepts(&self, candidate: &Version, cmp: &VersionComparator) -> bool {
        if self.rejects.iter().any(|r| r.accepts(candidate, cmp)) {
            return false;
        }
        self.selector().is_none_or(|s| s.accepts(candidate, cmp))
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(require) = &self.require {
            write!(f, "{require}")?;
            if self.strict {
                f.write_str("!!")?;
            }
            wrote = true;
        }
        if let Some(prefer) = &self.prefer {
            if wrote {
                f.write_str(" ")?;
            }
            write!(f, "prefer {prefer}")?;
            wrote = true;
        }
        if !self.rejects.is_empty() {
            if wrote {
                f.write_str(" ")?;
            }
            f.write_str("reject ")?;
            for (i, reject) in self.rejects.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{reject}")?;
            }
            wrote = true;
        }
        if !wrote {
            f.write_str("(no version)")?;
        }
        Ok(())
    }
}
