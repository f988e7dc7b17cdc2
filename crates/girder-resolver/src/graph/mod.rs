//! Dependency graph construction, results, and path diagnostics.

mod build;
mod paths;
mod result;

pub use build::{ComponentHandle, GraphResolver, ResolverConfig};
pub use paths::calculate_paths;
pub use result::{
    GraphFailure, GraphFailurePoint, GraphVisitor, ResolvedEdge, ResolvedGraph, ResolvedNode,
};

#[cfg(test)]
mod tests;
