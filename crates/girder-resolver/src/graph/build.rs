//! Breadth-first construction of the dependency graph.
//!
//! Nodes are discovered from a synthetic root. Every edge hands its target
//! module a selector; whenever a new selector arrives for a module, the
//! module's whole selector set is re-evaluated, so a module settled early
//! can change selection later. A changed selection detaches the displaced
//! component's outgoing subtree, releases the selectors that subtree
//! contributed (which can in turn re-trigger selection elsewhere) and
//! re-attaches dependents to the new selection.
//!
//! Metadata-fetch failures attach to their node and never abort sibling
//! branches; they surface when the finalized graph is inspected.

use crate::conflict::ConflictStrategy;
use crate::error::ResolveError;
use crate::exclude::ExclusionSpec;
use crate::graph::result::{
    GraphFailure, GraphFailurePoint, ResolvedEdge, ResolvedGraph, ResolvedNode,
};
use crate::metadata::{
    ComponentMetadata, ComponentMetadataSource, DependencyMetadata, IdResolveResult,
    MetadataFailure,
};
use crate::reason::{SelectionCause, SelectionDescriptor, SelectionReason};
use crate::registry::{ComponentRecord, ComponentRegistry};
use crate::selection::{self, RootCandidate};
use crate::selectors::{ModuleSelectors, SelectorState};
use ahash::AHashMap;
use girder_core::{ComponentId, ModuleId, ModuleVersionId, Version, VersionComparator};
use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Configuration for graph resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// The version comparator in effect.
    pub comparator: VersionComparator,
    /// How often one module's selection may change before the resolver
    /// stops flip-flopping and keeps the highest version.
    pub max_selection_changes: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            comparator: VersionComparator::default(),
            max_selection_changes: 1000,
        }
    }
}

/// Resolves a dependency graph from a root component's metadata.
pub struct GraphResolver<'a> {
    source: &'a dyn ComponentMetadataSource,
    strategy: &'a dyn ConflictStrategy,
    config: ResolverConfig,
}

impl std::fmt::Debug for GraphResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphResolver")
            .field("strategy", &self.strategy)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> GraphResolver<'a> {
    /// Create a resolver with default configuration.
    #[must_use]
    pub fn new(source: &'a dyn ComponentMetadataSource, strategy: &'a dyn ConflictStrategy) -> Self {
        Self {
            source,
            strategy,
            config: ResolverConfig::default(),
        }
    }

    /// Create a resolver with explicit configuration.
    #[must_use]
    pub fn with_config(
        source: &'a dyn ComponentMetadataSource,
        strategy: &'a dyn ConflictStrategy,
        config: ResolverConfig,
    ) -> Self {
        Self {
            source,
            strategy,
            config,
        }
    }

    /// Resolve the graph rooted at the given component.
    ///
    /// # Errors
    /// Returns an error when a project cycle is detected or when the
    /// finalized graph carries unresolved failures.
    pub fn resolve(&self, root: ComponentMetadata) -> Result<ResolvedGraph, ResolveError> {
        Builder::new(self.source, self.strategy, &self.config, root).run()
    }

    /// Resolve and walk the result with a visitor.
    ///
    /// # Errors
    /// As [`GraphResolver::resolve`].
    pub fn resolve_with_visitor(
        &self,
        root: ComponentMetadata,
        visitor: &mut dyn crate::graph::GraphVisitor,
    ) -> Result<ResolvedGraph, ResolveError> {
        let graph = self.resolve(root)?;
        graph.visit(visitor);
        Ok(graph)
    }
}

/// Handle into the per-run component arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle(usize);

#[derive(Debug)]
struct ComponentEntry {
    id: ComponentId,
    module_version: ModuleVersionId,
    reason: SelectionReason,
    rejected: bool,
    unmatched: Vec<Version>,
    rejected_versions: Vec<Version>,
    metadata: Option<Result<ComponentMetadata, MetadataFailure>>,
    nodes: SmallVec<[usize; 2]>,
    selected: bool,
}

impl ComponentRecord for ComponentEntry {
    fn component_id(&self) -> &ComponentId {
        &self.id
    }

    fn module_version(&self) -> &ModuleVersionId {
        &self.module_version
    }

    fn selection_reason(&self) -> &SelectionReason {
        &self.reason
    }

    fn add_cause(&mut self, descriptor: SelectionDescriptor) {
        self.reason.add(descriptor);
    }

    fn mark_rejected(&mut self) {
        self.rejected = true;
    }

    fn is_rejected(&self) -> bool {
        self.rejected
    }

    fn record_candidates(&mut self, unmatched: &[Version], rejected: &[Version]) {
        self.unmatched.extend_from_slice(unmatched);
        self.rejected_versions.extend_from_slice(rejected);
    }
}

#[derive(Debug, Default)]
struct GraphArena {
    entries: Vec<ComponentEntry>,
    index: AHashMap<ComponentId, ComponentHandle>,
}

impl GraphArena {
    fn insert(&mut self, id: ComponentId, module_version: ModuleVersionId) -> ComponentHandle {
        if let Some(&handle) = self.index.get(&id) {
            return handle;
        }
        let handle = ComponentHandle(self.entries.len());
        self.entries.push(ComponentEntry {
            id: id.clone(),
            module_version,
            reason: SelectionReason::default(),
            rejected: false,
            unmatched: Vec::new(),
            rejected_versions: Vec::new(),
            metadata: None,
            nodes: SmallVec::new(),
            selected: false,
        });
        self.index.insert(id, handle);
        handle
    }
}

impl ComponentRegistry for GraphArena {
    type Handle = ComponentHandle;
    type Record = ComponentEntry;

    fn component(&mut self, result: &IdResolveResult) -> ComponentHandle {
        self.insert(result.id.clone(), result.module_version.clone())
    }

    fn record(&self, handle: ComponentHandle) -> &ComponentEntry {
        &self.entries[handle.0]
    }

    fn record_mut(&mut self, handle: ComponentHandle) -> &mut ComponentEntry {
        &mut self.entries[handle.0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpandState {
    Pending,
    SkippedDeps,
    Expanded,
}

#[derive(Debug)]
struct NodeData {
    component: ComponentHandle,
    variant: usize,
    incoming: Vec<usize>,
    outgoing: Vec<usize>,
    expand: ExpandState,
    is_root: bool,
}

#[derive(Debug)]
struct EdgeData {
    from: usize,
    dependency: DependencyMetadata,
    exclusions: ExclusionSpec,
    selector: usize,
    removed: bool,
    target_node: Option<usize>,
    descriptor: SelectionDescriptor,
}

#[derive(Debug, Default)]
struct ModuleData {
    selectors: ModuleSelectors,
    edges: Vec<usize>,
    selected: Option<ComponentHandle>,
    failure: Option<ResolveError>,
    selection_changes: usize,
    overflow_warned: bool,
}

struct Builder<'a> {
    source: &'a dyn ComponentMetadataSource,
    strategy: &'a dyn ConflictStrategy,
    config: &'a ResolverConfig,
    arena: GraphArena,
    nodes: Vec<NodeData>,
    edges: Vec<EdgeData>,
    modules: IndexMap<ModuleId, ModuleData>,
    queue: VecDeque<usize>,
    root_handle: ComponentHandle,
    root_module: ModuleId,
}

impl<'a> Builder<'a> {
    fn new(
        source: &'a dyn ComponentMetadataSource,
        strategy: &'a dyn ConflictStrategy,
        config: &'a ResolverConfig,
        root: ComponentMetadata,
    ) -> Self {
        let root_module = root.module_version().module().clone();
        let mut arena = GraphArena::default();
        let root_handle = arena.insert(root.id().clone(), root.module_version().clone());

        let mut nodes = Vec::new();
        {
            let entry = &mut arena.entries[root_handle.0];
            entry.reason.add(SelectionDescriptor::of(SelectionCause::Root));
            entry.selected = true;
            for variant in 0..root.variants().len() {
                entry.nodes.push(nodes.len());
                nodes.push(NodeData {
                    component: root_handle,
                    variant,
                    incoming: Vec::new(),
                    outgoing: Vec::new(),
                    expand: ExpandState::Pending,
                    is_root: true,
                });
            }
            entry.metadata = Some(Ok(root));
        }

        let mut modules: IndexMap<ModuleId, ModuleData> = IndexMap::new();
        modules.insert(
            root_module.clone(),
            ModuleData {
                selected: Some(root_handle),
                ..ModuleData::default()
            },
        );

        let queue = (0..nodes.len()).collect();
        Self {
            source,
            strategy,
            config,
            arena,
            nodes,
            edges: Vec::new(),
            modules,
            queue,
            root_handle,
            root_module,
        }
    }

    fn run(mut self) -> Result<ResolvedGraph, ResolveError> {
        while let Some(node) = self.queue.pop_front() {
            if !self.node_live(node) || self.nodes[node].expand == ExpandState::Expanded {
                continue;
            }
            self.expand_node(node);
        }
        self.finalize()
    }

    fn node_live(&self, node: usize) -> bool {
        let data = &self.nodes[node];
        if data.is_root {
            return true;
        }
        let entry = &self.arena.entries[data.component.0];
        entry.selected
            && self
                .modules
                .get(entry.module_version.module())
                .is_some_and(|m| m.selected == Some(data.component))
    }

    fn enqueue(&mut self, node: usize) {
        self.queue.push_back(node);
    }

    /// Visit a node's declared dependencies, creating edges and handing the
    /// target modules their selectors.
    fn expand_node(&mut self, node: usize) {
        let follows_deps = self.nodes[node].is_root
            || self.nodes[node].incoming.iter().any(|&e| {
                !self.edges[e].removed && self.edges[e].dependency.transitive
            });
        if !follows_deps {
            self.nodes[node].expand = ExpandState::SkippedDeps;
            return;
        }
        self.nodes[node].expand = ExpandState::Expanded;

        let handle = self.nodes[node].component;
        let variant = self.nodes[node].variant;
        let deps: Vec<DependencyMetadata> = match &self.arena.entries[handle.0].metadata {
            Some(Ok(metadata)) => metadata.variants()[variant].dependencies.clone(),
            _ => return,
        };
        if deps.is_empty() {
            return;
        }

        let inherited = self.incoming_exclusions(node);
        let from_version = self.arena.entries[handle.0].module_version.clone();
        trace!(node = %from_version, dependencies = deps.len(), "expanding node");
        for dep in deps {
            if inherited.excludes(&dep.target) {
                trace!(from = %from_version, target = %dep.target, "dependency excluded on this path");
                continue;
            }
            let exclusions = inherited.union(&dep.exclusions);
            self.add_edge(node, &from_version, dep, exclusions);
        }
    }

    /// Exclusions in effect at a node: only rules shared by every live
    /// transitive incoming path still apply. Intransitive edges do not
    /// follow the node's dependencies and contribute nothing.
    fn incoming_exclusions(&self, node: usize) -> ExclusionSpec {
        self.incoming_exclusions_without(node, usize::MAX)
    }

    fn incoming_exclusions_without(&self, node: usize, skip: usize) -> ExclusionSpec {
        if self.nodes[node].is_root {
            return ExclusionSpec::none();
        }
        let mut acc: Option<ExclusionSpec> = None;
        for &edge in &self.nodes[node].incoming {
            if edge == skip
                || self.edges[edge].removed
                || !self.edges[edge].dependency.transitive
            {
                continue;
            }
            let spec = &self.edges[edge].exclusions;
            acc = Some(match acc {
                None => spec.clone(),
                Some(prev) => prev.intersect(spec),
            });
        }
        acc.unwrap_or_default()
    }

    /// Retract a node's expansion so the next queue pass redoes it, e.g.
    /// when a newly attached path changed the exclusions in effect.
    fn restart_node(&mut self, node: usize) {
        let outgoing = std::mem::take(&mut self.nodes[node].outgoing);
        for edge in outgoing {
            self.remove_edge(edge);
        }
        self.nodes[node].expand = ExpandState::Pending;
        self.enqueue(node);
    }

    fn add_edge(
        &mut self,
        from: usize,
        from_version: &ModuleVersionId,
        dep: DependencyMetadata,
        exclusions: ExclusionSpec,
    ) {
        let target_module = dep.target.clone();
        let descriptor = SelectionDescriptor::with_description(
            SelectionCause::Requested,
            format!("{} {} requested by {from_version}", dep.target, dep.constraint),
        );
        let selector = SelectorState::new(dep.clone());
        let edge = self.edges.len();
        self.edges.push(EdgeData {
            from,
            dependency: dep,
            exclusions,
            selector: 0,
            removed: false,
            target_node: None,
            descriptor,
        });
        self.nodes[from].outgoing.push(edge);

        let module = self.modules.entry(target_module.clone()).or_default();
        let slot = module.selectors.add(selector);
        module.edges.push(edge);
        self.edges[edge].selector = slot;

        self.update_module_selection(&target_module);
        self.attach_edge(edge);
    }

    /// Re-evaluate the full selector set of a module. Selection can change
    /// after the module was first settled; a stale selection is displaced
    /// and its subtree re-expanded through the new one.
    fn update_module_selection(&mut self, module_id: &ModuleId) {
        let root = RootCandidate {
            module: self.root_module.clone(),
            handle: self.root_handle,
        };
        let outcome = {
            let Some(module) = self.modules.get_mut(module_id) else {
                return;
            };
            if module.selectors.live_count() == 0 {
                return;
            }
            selection::select_best(
                &mut self.arena,
                self.source,
                self.strategy,
                &self.config.comparator,
                module_id,
                &mut module.selectors,
                Some(&root),
            )
        };
        match outcome {
            Err(error) => {
                warn!(module = %module_id, error = %error, "module selection failed");
                if let Some(module) = self.modules.get_mut(module_id) {
                    module.failure = Some(error);
                }
            }
            Ok(winner) => {
                let current = self.modules.get_mut(module_id).and_then(|module| {
                    module.failure = None;
                    module.selected
                });
                match current {
                    None => self.select_component(module_id, winner),
                    Some(current) if current == winner => {}
                    Some(current) => self.change_selection(module_id, current, winner),
                }
            }
        }
    }

    fn select_component(&mut self, module_id: &ModuleId, handle: ComponentHandle) {
        self.ensure_metadata_and_nodes(handle);
        self.arena.entries[handle.0].selected = true;
        debug!(
            module = %module_id,
            version = %self.arena.entries[handle.0].module_version,
            "selected component"
        );
        let live_edges: Vec<usize> = {
            let Some(module) = self.modules.get_mut(module_id) else {
                return;
            };
            module.selected = Some(handle);
            module
                .edges
                .iter()
                .copied()
                .filter(|&e| !self.edges[e].removed)
                .collect()
        };
        for edge in live_edges {
            self.attach_edge(edge);
        }
    }

    fn ensure_metadata_and_nodes(&mut self, handle: ComponentHandle) {
        if self.arena.entries[handle.0].metadata.is_none() {
            let id = self.arena.entries[handle.0].id.clone();
            let result = self.source.resolve_metadata(&id);
            if let Err(failure) = &result {
                // Attached to the component, surfaced at finalization. The
                // rest of the graph keeps resolving.
                warn!(component = %id, error = %failure, "metadata fetch failed");
            }
            self.arena.entries[handle.0].metadata = Some(result);
        }
        if self.arena.entries[handle.0].nodes.is_empty() {
            let variant_count = match &self.arena.entries[handle.0].metadata {
                Some(Ok(metadata)) => metadata.variants().len(),
                _ => 1,
            };
            for variant in 0..variant_count {
                let node = self.nodes.len();
                self.nodes.push(NodeData {
                    component: handle,
                    variant,
                    incoming: Vec::new(),
                    outgoing: Vec::new(),
                    expand: ExpandState::Pending,
                    is_root: false,
                });
                self.arena.entries[handle.0].nodes.push(node);
            }
        }
    }

    fn change_selection(
        &mut self,
        module_id: &ModuleId,
        current: ComponentHandle,
        winner: ComponentHandle,
    ) {
        {
            let Some(module) = self.modules.get_mut(module_id) else {
                return;
            };
            module.selection_changes += 1;
            if module.selection_changes > self.config.max_selection_changes {
                if !module.overflow_warned {
                    module.overflow_warned = true;
                    warn!(
                        module = %module_id,
                        "selection keeps changing, keeping the highest version to stabilize"
                    );
                }
                let keep_current = self.config.comparator.compare(
                    self.arena.entries[winner.0].module_version.version(),
                    self.arena.entries[current.0].module_version.version(),
                ) != std::cmp::Ordering::Greater;
                if keep_current {
                    return;
                }
            }
        }
        debug!(
            module = %module_id,
            from = %self.arena.entries[current.0].module_version,
            to = %self.arena.entries[winner.0].module_version,
            "selection changed"
        );
        self.deselect(module_id, current);
        self.select_component(module_id, winner);
    }

    /// Displace a selection: detach the component's outgoing subtree and
    /// leave the edges that pointed at it ready for re-attachment.
    fn deselect(&mut self, module_id: &ModuleId, handle: ComponentHandle) {
        if let Some(module) = self.modules.get_mut(module_id) {
            module.selected = None;
        }
        if handle == self.root_handle {
            // The root anchors the traversal; its subtree is never torn
            // down even when its module resolves elsewhere.
            return;
        }
        self.arena.entries[handle.0].selected = false;
        let nodes = self.arena.entries[handle.0].nodes.to_vec();
        for node in nodes {
            let outgoing = std::mem::take(&mut self.nodes[node].outgoing);
            for edge in outgoing {
                self.remove_edge(edge);
            }
            let incoming = std::mem::take(&mut self.nodes[node].incoming);
            for edge in incoming {
                self.edges[edge].target_node = None;
            }
            self.nodes[node].expand = ExpandState::Pending;
        }
    }

    /// Retract one edge. Releasing its selector can change or clear the
    /// target module's selection, cascading further retractions.
    fn remove_edge(&mut self, edge: usize) {
        if self.edges[edge].removed {
            return;
        }
        self.edges[edge].removed = true;
        if let Some(target) = self.edges[edge].target_node.take() {
            self.nodes[target].incoming.retain(|&e| e != edge);
        }
        let module_id = self.edges[edge].dependency.target.clone();
        let slot = self.edges[edge].selector;
        let Some(module) = self.modules.get_mut(&module_id) else {
            return;
        };
        module.selectors.release(slot);
        if module.selectors.live_count() == 0 {
            module.failure = None;
            let selected = module.selected;
            if let Some(handle) = selected {
                debug!(module = %module_id, "no selectors remain, deselecting");
                self.deselect(&module_id, handle);
            }
        } else {
            // A constraint disappeared: the remaining selectors may now
            // agree on a different version.
            self.update_module_selection(&module_id);
        }
    }

    /// Point an edge at the target module's currently selected component.
    fn attach_edge(&mut self, edge: usize) {
        if self.edges[edge].removed {
            return;
        }
        let module_id = self.edges[edge].dependency.target.clone();
        let Some(handle) = self.modules.get(&module_id).and_then(|m| m.selected) else {
            return;
        };
        if let Some(target) = self.edges[edge].target_node {
            if self.nodes[target].component == handle {
                return;
            }
            self.nodes[target].incoming.retain(|&e| e != edge);
            self.edges[edge].target_node = None;
        }

        let entry = &self.arena.entries[handle.0];
        let target = entry
            .nodes
            .iter()
            .copied()
            .find(|&node| match &entry.metadata {
                Some(Ok(metadata)) => self.edges[edge]
                    .dependency
                    .attributes
                    .compatible_with(&metadata.variants()[self.nodes[node].variant].attributes),
                _ => true,
            })
            .or_else(|| entry.nodes.first().copied());
        let Some(target) = target else {
            return;
        };
        self.edges[edge].target_node = Some(target);
        self.nodes[target].incoming.push(edge);

        match self.nodes[target].expand {
            ExpandState::Pending => self.enqueue(target),
            ExpandState::SkippedDeps if self.edges[edge].dependency.transitive => {
                self.nodes[target].expand = ExpandState::Pending;
                self.enqueue(target);
            }
            ExpandState::Expanded if self.edges[edge].dependency.transitive => {
                // A new path can narrow the exclusion intersection at an
                // already-visited node, making dependencies visible that
                // were filtered before.
                let with = self.incoming_exclusions(target);
                let without = self.incoming_exclusions_without(target, edge);
                if with != without {
                    trace!(node = target, "effective exclusions changed, re-expanding");
                    self.restart_node(target);
                }
            }
            _ => {}
        }
    }

    fn finalize(self) -> Result<ResolvedGraph, ResolveError> {
        let mut graph: DiGraph<ResolvedNode, ResolvedEdge> = DiGraph::new();
        let mut mapping: AHashMap<usize, NodeIndex> = AHashMap::new();

        // Map live nodes reachable from root, breadth-first.
        let root_nodes = self.arena.entries[self.root_handle.0].nodes.to_vec();
        let mut discovery: VecDeque<usize> = root_nodes.iter().copied().collect();
        let mut order: Vec<usize> = Vec::new();
        while let Some(node) = discovery.pop_front() {
            if mapping.contains_key(&node) {
                continue;
            }
            mapping.insert(node, graph.add_node(self.resolved_node(node)));
            order.push(node);
            for &edge in &self.nodes[node].outgoing {
                if self.edges[edge].removed {
                    continue;
                }
                if let Some(target) = self.edges[edge].target_node
                    && !mapping.contains_key(&target)
                {
                    discovery.push_back(target);
                }
            }
        }
        for &node in &order {
            for &edge in &self.nodes[node].outgoing {
                if self.edges[edge].removed {
                    continue;
                }
                if let Some(target) = self.edges[edge].target_node {
                    graph.add_edge(
                        mapping[&node],
                        mapping[&target],
                        ResolvedEdge {
                            constraint: self.edges[edge].dependency.constraint.to_string(),
                            reason: self.edges[edge].descriptor.clone(),
                        },
                    );
                }
            }
        }
        let root = mapping
            .get(&root_nodes[0])
            .copied()
            .unwrap_or_else(|| NodeIndex::new(0));
        let resolved = ResolvedGraph::new(graph, root);

        if let Some(cycle) = self.find_project_cycle(&resolved) {
            return Err(ResolveError::ProjectCycle { path: cycle });
        }

        // Collect deferred failures: broken nodes and unresolvable modules.
        let mut failures: Vec<GraphFailurePoint> = Vec::new();
        for &node in &order {
            let entry = &self.arena.entries[self.nodes[node].component.0];
            if let Some(Err(failure)) = &entry.metadata {
                failures.push(GraphFailurePoint::Node {
                    node: mapping[&node],
                    failure: failure.clone(),
                });
            }
        }
        for (module_id, module) in &self.modules {
            let Some(error) = &module.failure else {
                continue;
            };
            if module.selectors.live_count() == 0 {
                continue;
            }
            let dependents: Vec<NodeIndex> = module
                .edges
                .iter()
                .filter(|&&e| !self.edges[e].removed)
                .filter_map(|&e| mapping.get(&self.edges[e].from).copied())
                .collect();
            failures.push(GraphFailurePoint::Module {
                module: module_id.clone(),
                dependents,
                error: Box::new(error.clone()),
            });
        }

        info!(
            nodes = resolved.node_count(),
            edges = resolved.edge_count(),
            modules = self.modules.len(),
            failures = failures.len(),
            "graph resolution complete"
        );
        if failures.is_empty() {
            Ok(resolved)
        } else {
            Err(ResolveError::Graph(GraphFailure::new(
                Arc::new(resolved),
                failures,
            )))
        }
    }

    fn resolved_node(&self, node: usize) -> ResolvedNode {
        let data = &self.nodes[node];
        let entry = &self.arena.entries[data.component.0];
        let (variant, artifacts, failure) = match &entry.metadata {
            Some(Ok(metadata)) => {
                let variant = &metadata.variants()[data.variant];
                (variant.name.clone(), variant.artifacts.clone(), None)
            }
            Some(Err(failure)) => ("default".to_string(), Vec::new(), Some(failure.clone())),
            None => ("default".to_string(), Vec::new(), None),
        };
        ResolvedNode {
            component: entry.id.clone(),
            module_version: entry.module_version.clone(),
            variant,
            reason: entry.reason.clone(),
            failure,
            artifacts,
        }
    }

    /// Reject cycles between projects of the current build. Cycles through
    /// external module versions are legal and collapse onto their single
    /// node per component.
    fn find_project_cycle(&self, resolved: &ResolvedGraph) -> Option<Vec<String>> {
        use petgraph::visit::EdgeRef;
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }
        let graph = resolved.graph();
        let mut colors = vec![Color::White; graph.node_count()];
        let mut stack: Vec<NodeIndex> = Vec::new();

        fn visit(
            graph: &DiGraph<ResolvedNode, ResolvedEdge>,
            node: NodeIndex,
            colors: &mut [Color],
            stack: &mut Vec<NodeIndex>,
        ) -> Option<Vec<String>> {
            colors[node.index()] = Color::Gray;
            stack.push(node);
            for edge in graph.edges(node) {
                let target = edge.target();
                match colors[target.index()] {
                    Color::Gray if graph[target].component.is_project() => {
                        let from = stack.iter().position(|&n| n == target).unwrap_or(0);
                        let mut path: Vec<String> = stack[from..]
                            .iter()
                            .map(|&n| graph[n].component.to_string())
                            .collect();
                        path.push(graph[target].component.to_string());
                        return Some(path);
                    }
                    Color::White => {
                        if let Some(cycle) = visit(graph, target, colors, stack) {
                            return Some(cycle);
                        }
                    }
                    _ => {}
                }
            }
            stack.pop();
            colors[node.index()] = Color::Black;
            None
        }

        visit(graph, resolved.root(), &mut colors, &mut stack)
    }
}
