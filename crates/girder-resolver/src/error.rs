//! Resolution error taxonomy.

use crate::conflict::ConflictFailure;
use crate::graph::GraphFailure;
use crate::metadata::{ArtifactFailure, SelectorFailure};
use girder_core::ModuleId;
use thiserror::Error;

/// Error type for resolution operations.
///
/// Selector and conflict failures are raised synchronously by the selection
/// layer; the graph builder defers them to per-node storage and raises an
/// aggregate [`GraphFailure`] at finalization; the lenient layer defers
/// them further, to per-accessor results.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// No selector for a module could be resolved.
    #[error("could not resolve module '{module}'")]
    Selector {
        /// The module that failed.
        module: ModuleId,
        /// The underlying selector failure.
        #[source]
        failure: SelectorFailure,
    },

    /// Conflict resolution could not choose a winner.
    #[error(transparent)]
    Conflict(#[from] ConflictFailure),

    /// One or more nodes of the finalized graph carry failures.
    #[error(transparent)]
    Graph(GraphFailure),

    /// A dependency cycle between projects of the current build.
    #[error("circular dependency between projects: {}", path.join(" -> "))]
    ProjectCycle {
        /// The cycle, as project display names.
        path: Vec<String>,
    },

    /// One or more artifacts could not be fetched.
    #[error("{} artifact{} could not be resolved: {}", failures.len(), if failures.len() == 1 { "" } else { "s" }, first_failure(failures))]
    Artifacts {
        /// Every fetch failure, in discovery order.
        failures: Vec<ArtifactFailure>,
    },
}

fn first_failure(failures: &[ArtifactFailure]) -> String {
    failures
        .first()
        .map_or_else(String::new, ToString::to_string)
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
