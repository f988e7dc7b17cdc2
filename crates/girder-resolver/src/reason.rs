//! Why a component or edge was selected.

use std::fmt;

/// The kind of cause behind a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionCause {
    /// The synthetic root of the graph.
    Root,
    /// A dependency declaration requested it.
    Requested,
    /// A constraint declaration contributed to it.
    Constraint,
    /// A forced selector pinned it.
    Forced,
    /// Conflict resolution chose it among competing candidates.
    ConflictResolution,
    /// A reject selector excluded other candidates.
    Rejection,
}

impl SelectionCause {
    /// Default human-readable description.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Requested => "requested",
            Self::Constraint => "constraint",
            Self::Forced => "forced",
            Self::ConflictResolution => "by conflict resolution",
            Self::Rejection => "rejection",
        }
    }
}

impl fmt::Display for SelectionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One cause, optionally with a detailed description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDescriptor {
    cause: SelectionCause,
    description: Option<String>,
}

impl SelectionDescriptor {
    /// A descriptor with the cause's default description.
    #[must_use]
    pub fn of(cause: SelectionCause) -> Self {
        Self {
            cause,
            description: None,
        }
    }

    /// A descriptor with a detailed description.
    #[must_use]
    pub fn with_description(cause: SelectionCause, description: impl Into<String>) -> Self {
        Self {
            cause,
            description: Some(description.into()),
        }
    }

    /// The cause kind.
    #[must_use]
    pub fn cause(&self) -> SelectionCause {
        self.cause
    }
}

impl fmt::Display for SelectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {description}", self.cause),
            None => self.cause.fmt(f),
        }
    }
}

/// Append-only list of the causes behind one component's selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionReason {
    descriptors: Vec<SelectionDescriptor>,
}

impl SelectionReason {
    /// A reason with a single cause.
    #[must_use]
    pub fn because(descriptor: SelectionDescriptor) -> Self {
        Self {
            descriptors: vec![descriptor],
        }
    }

    /// Append a cause, skipping exact duplicates.
    pub fn add(&mut self, descriptor: SelectionDescriptor) {
        if !self.descriptors.contains(&descriptor) {
            self.descriptors.push(descriptor);
        }
    }

    /// Whether any descriptor has the given cause.
    #[must_use]
    pub fn has_cause(&self, cause: SelectionCause) -> bool {
        self.descriptors.iter().any(|d| d.cause == cause)
    }

    /// All descriptors, in the order they were appended.
    #[must_use]
    pub fn descriptors(&self) -> &[SelectionDescriptor] {
        &self.descriptors
    }

    /// Whether no cause was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, descriptor) in self.descriptors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            descriptor.fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_only_with_dedup() {
        let mut reason = SelectionReason::default();
        reason.add(SelectionDescriptor::of(SelectionCause::Requested));
        reason.add(SelectionDescriptor::of(SelectionCause::Requested));
        reason.add(SelectionDescriptor::with_description(
            SelectionCause::ConflictResolution,
            "between versions 1.0 and 2.0",
        ));
        assert_eq!(reason.descriptors().len(), 2);
        assert!(reason.has_cause(SelectionCause::ConflictResolution));
        assert!(!reason.has_cause(SelectionCause::Forced));
        assert_eq!(
            reason.to_string(),
            "requested; by conflict resolution: between versions 1.0 and 2.0"
        );
    }
}
