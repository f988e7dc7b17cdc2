//! Error-deferring resolution results.
//!
//! Every public resolution entry point can be wrapped so that an engine
//! failure is captured, enriched with hints from the originating resolve
//! context and stored rather than propagated. `has_error()` never fails;
//! any accessor that actually needs data re-surfaces the stored,
//! contextualized failure. A broken resolution therefore never aborts
//! unrelated work that only inspects whether it succeeded.

use crate::artifacts::{ArtifactSet, ArtifactSetResolver};
use crate::error::ResolveError;
use crate::graph::{GraphResolver, ResolvedGraph};
use crate::metadata::ComponentMetadata;
use girder_core::ModuleVersionId;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Where a resolution was requested from, with optional hints attached to
/// any failure ("did you mean configuration 'runtime'?").
#[derive(Debug, Clone)]
pub struct ResolveContext {
    name: String,
    hints: Vec<String>,
}

impl ResolveContext {
    /// A context with the given display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hints: Vec::new(),
        }
    }

    /// Attach a hint shown alongside any failure.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// The context name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A captured, contextualized resolution failure.
#[derive(Debug, Clone)]
pub struct ResolutionError {
    context: String,
    hints: Vec<String>,
    source: Arc<ResolveError>,
}

impl ResolutionError {
    /// The underlying engine failure.
    #[must_use]
    pub fn cause(&self) -> &ResolveError {
        &self.source
    }

    /// The context the failure was captured in.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resolution of '{}' failed: {}", self.context, self.source)?;
        for hint in &self.hints {
            write!(f, " ({hint})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// A resolution result that defers its failure to the accessors.
#[derive(Debug)]
pub struct LenientResolution {
    context: ResolveContext,
    outcome: Result<Arc<ResolvedGraph>, ResolutionError>,
}

impl LenientResolution {
    /// Capture an engine result under a context.
    #[must_use]
    pub fn capture(
        context: &ResolveContext,
        result: Result<ResolvedGraph, ResolveError>,
    ) -> Self {
        let outcome = result.map(Arc::new).map_err(|error| ResolutionError {
            context: context.name.clone(),
            hints: context.hints.clone(),
            source: Arc::new(error),
        });
        Self {
            context: context.clone(),
            outcome,
        }
    }

    /// Whether the resolution failed. Never fails itself.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// The captured failure, if any. Never fails itself.
    #[must_use]
    pub fn error(&self) -> Option<&ResolutionError> {
        self.outcome.as_ref().err()
    }

    /// The resolved graph.
    ///
    /// # Errors
    /// Re-surfaces the captured, contextualized failure.
    pub fn graph(&self) -> Result<&ResolvedGraph, ResolutionError> {
        match &self.outcome {
            Ok(graph) => Ok(graph),
            Err(error) => Err(error.clone()),
        }
    }

    /// The selected module versions.
    ///
    /// # Errors
    /// Re-surfaces the captured, contextualized failure.
    pub fn module_versions(&self) -> Result<Vec<ModuleVersionId>, ResolutionError> {
        Ok(self
            .graph()?
            .module_versions()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Fetch (and verify) the artifact set behind the graph.
    ///
    /// # Errors
    /// Re-surfaces the captured failure, or captures and contextualizes a
    /// new one when artifact fetching fails.
    pub fn artifacts(
        &self,
        resolver: &ArtifactSetResolver<'_>,
    ) -> Result<ArtifactSet, ResolutionError> {
        let graph = self.graph()?;
        resolver.resolve(graph).map_err(|error| ResolutionError {
            context: self.context.name.clone(),
            hints: self.context.hints.clone(),
            source: Arc::new(error),
        })
    }

    /// The artifact files behind the graph.
    ///
    /// # Errors
    /// As [`LenientResolution::artifacts`].
    pub fn files(&self, resolver: &ArtifactSetResolver<'_>) -> Result<Vec<PathBuf>, ResolutionError> {
        self.artifacts(resolver).map(ArtifactSet::into_files)
    }
}

impl GraphResolver<'_> {
    /// Resolve leniently: failures are captured into the result instead of
    /// returned, so callers that only probe `has_error()` never trip over
    /// them.
    #[must_use]
    pub fn resolve_lenient(
        &self,
        root: ComponentMetadata,
        context: &ResolveContext,
    ) -> LenientResolution {
        LenientResolution::capture(context, self.resolve(root))
    }
}
