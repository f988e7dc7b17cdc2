//! The finalized, immutable resolved graph and its visitor walk.

use crate::graph::paths::calculate_paths;
use crate::metadata::MetadataFailure;
use crate::reason::{SelectionDescriptor, SelectionReason};
use girder_core::{ArtifactId, ComponentId, ModuleId, ModuleVersionId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// One node of the resolved graph: a variant of a selected component.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    /// The component this node belongs to.
    pub component: ComponentId,
    /// The component's module version.
    pub module_version: ModuleVersionId,
    /// The variant name.
    pub variant: String,
    /// Why the component was selected.
    pub reason: SelectionReason,
    /// The metadata failure attached to the node, if its component's
    /// metadata could not be fetched.
    pub failure: Option<MetadataFailure>,
    /// Artifact file names the variant provides.
    pub artifacts: Vec<String>,
}

impl ResolvedNode {
    /// The node's metadata, reduced to "did it resolve": `None` when the
    /// component's metadata failed to fetch. The cause is retrievable
    /// separately through [`ResolvedNode::failure`].
    #[must_use]
    pub fn metadata_or_null(&self) -> Option<&ModuleVersionId> {
        self.failure.is_none().then_some(&self.module_version)
    }

    /// The artifact ids this node contributes.
    pub fn artifact_ids(&self) -> impl Iterator<Item = ArtifactId> + '_ {
        self.artifacts
            .iter()
            .map(|name| ArtifactId::new(self.module_version.clone(), name.clone()))
    }
}

impl fmt::Display for ResolvedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.module_version, self.variant)
    }
}

/// One edge of the resolved graph.
#[derive(Debug, Clone)]
pub struct ResolvedEdge {
    /// The declared constraint, rendered.
    pub constraint: String,
    /// The edge's selection reason, for diagnostics.
    pub reason: SelectionDescriptor,
}

/// Consumers walk the resolved graph through this interface.
///
/// Call order guarantee: `start`, then `visit_node` for every node (root
/// included), then `visit_edges` for every node in consumer-first order (a
/// node's edges come only after every ancestor reachable from root was
/// itself visited), then `finish`. Artifact or metadata work done in
/// `visit_edges` can therefore assume the dependent side is finalized.
pub trait GraphVisitor {
    /// Called once before any node.
    fn start(&mut self, root: &ResolvedNode) {
        let _ = root;
    }

    /// Called for every node, root first.
    fn visit_node(&mut self, node: &ResolvedNode) {
        let _ = node;
    }

    /// Called for every node with its incoming edges, consumers first.
    fn visit_edges(&mut self, node: &ResolvedNode, incoming: &[(&ResolvedNode, &ResolvedEdge)]) {
        let _ = (node, incoming);
    }

    /// Called once after all nodes and edges.
    fn finish(&mut self, root: &ResolvedNode) {
        let _ = root;
    }
}

/// The immutable result of graph resolution.
#[derive(Debug, Clone)]
pub struct ResolvedGraph {
    graph: DiGraph<ResolvedNode, ResolvedEdge>,
    root: NodeIndex,
}

impl ResolvedGraph {
    pub(crate) fn new(graph: DiGraph<ResolvedNode, ResolvedEdge>, root: NodeIndex) -> Self {
        Self { graph, root }
    }

    /// The root node index.
    #[must_use]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &DiGraph<ResolvedNode, ResolvedEdge> {
        &self.graph
    }

    /// A node by index.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &ResolvedNode {
        &self.graph[index]
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node indices in breadth-first order from the root, following edge
    /// declaration order.
    #[must_use]
    pub fn bfs_order(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut queue = VecDeque::from([self.root]);
        let mut seen = vec![false; self.graph.node_count()];
        seen[self.root.index()] = true;
        while let Some(node) = queue.pop_front() {
            order.push(node);
            // petgraph iterates edges newest-first; restore declaration order.
            let mut targets: Vec<NodeIndex> = self
                .graph
                .edges_directed(node, Direction::Outgoing)
                .map(|e| e.target())
                .collect();
            targets.reverse();
            for target in targets {
                if !seen[target.index()] {
                    seen[target.index()] = true;
                    queue.push_back(target);
                }
            }
        }
        order
    }

    /// Distinct selected module versions, breadth-first from the root, the
    /// root itself excluded.
    #[must_use]
    pub fn module_versions(&self) -> Vec<&ModuleVersionId> {
        let mut out: Vec<&ModuleVersionId> = Vec::new();
        for index in self.bfs_order() {
            if index == self.root {
                continue;
            }
            let mv = &self.graph[index].module_version;
            if !out.contains(&mv) {
                out.push(mv);
            }
        }
        out
    }

    /// Nodes carrying a metadata failure.
    #[must_use]
    pub fn broken_nodes(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&n| self.graph[n].failure.is_some())
            .collect()
    }

    /// Walk the graph with the documented [`GraphVisitor`] ordering.
    pub fn visit(&self, visitor: &mut dyn GraphVisitor) {
        let order = self.bfs_order();
        visitor.start(&self.graph[self.root]);
        for &index in &order {
            visitor.visit_node(&self.graph[index]);
        }
        for &index in &order {
            let incoming: Vec<(&ResolvedNode, &ResolvedEdge)> = self
                .graph
                .edges_directed(index, Direction::Incoming)
                .map(|e| (&self.graph[e.source()], e.weight()))
                .collect();
            visitor.visit_edges(&self.graph[index], &incoming);
        }
        visitor.finish(&self.graph[self.root]);
    }
}

/// One failure embedded in a finalized graph.
#[derive(Debug, Clone)]
pub enum GraphFailurePoint {
    /// A node whose component metadata could not be fetched.
    Node {
        /// The broken node.
        node: NodeIndex,
        /// The metadata failure.
        failure: MetadataFailure,
    },
    /// A module none of whose selectors could be satisfied.
    Module {
        /// The unresolved module.
        module: ModuleId,
        /// Nodes that depend on the module.
        dependents: Vec<NodeIndex>,
        /// The underlying selection failure.
        error: Box<crate::error::ResolveError>,
    },
}

/// Aggregate failure raised when a finalized graph carries broken nodes.
///
/// The dependency chains in the rendered message are computed when the
/// message is rendered, never eagerly, so the cost scales with failures
/// actually reported.
#[derive(Debug, Clone)]
pub struct GraphFailure {
    graph: Arc<ResolvedGraph>,
    failures: Vec<GraphFailurePoint>,
}

impl GraphFailure {
    pub(crate) fn new(graph: Arc<ResolvedGraph>, failures: Vec<GraphFailurePoint>) -> Self {
        Self { graph, failures }
    }

    /// The graph the failures are embedded in.
    #[must_use]
    pub fn graph(&self) -> &ResolvedGraph {
        &self.graph
    }

    /// Every failure point.
    #[must_use]
    pub fn failures(&self) -> &[GraphFailurePoint] {
        &self.failures
    }

    fn render_chain(&self, node: NodeIndex) -> String {
        calculate_paths(&self.graph, &[node])
            .into_iter()
            .next()
            .map_or_else(
                || self.graph.node(node).module_version.to_string(),
                |path| {
                    path.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" -> ")
                },
            )
    }

    fn shortest_dependent_chain(&self, dependents: &[NodeIndex]) -> Option<String> {
        calculate_paths(&self.graph, dependents)
            .into_iter()
            .min_by_key(Vec::len)
            .map(|path| {
                path.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" -> ")
            })
    }
}

impl fmt::Display for GraphFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "dependency resolution failed for {} of the resolved graph's nodes:",
            self.failures.len()
        )?;
        for point in &self.failures {
            match point {
                GraphFailurePoint::Node { node, failure } => {
                    writeln!(f, "  - {}: {failure}", self.render_chain(*node))?;
                }
                GraphFailurePoint::Module {
                    module,
                    dependents,
                    error,
                } => {
                    match self.shortest_dependent_chain(dependents) {
                        Some(chain) => writeln!(f, "  - {chain} -> {module}: {error}")?,
                        None => writeln!(f, "  - {module}: {error}")?,
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for GraphFailure {}
