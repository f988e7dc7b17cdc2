use crate::conflict::HighestVersionStrategy;
use crate::error::ResolveError;
use crate::exclude::{ExcludeRule, ExclusionSpec};
use crate::graph::{GraphResolver, GraphVisitor, ResolvedGraph, ResolvedNode, calculate_paths};
use crate::memory::MemoryMetadataSource;
use crate::metadata::{
    ComponentMetadata, ComponentMetadataSource, DependencyMetadata, IdResolveResult,
    MetadataFailure, SelectorFailure, Variant,
};
use crate::reason::SelectionCause;
use girder_core::{
    ComponentId, ModuleId, ModuleVersionId, ProjectPath, UnionVersionSelector, VersionConstraint,
};
use petgraph::graph::NodeIndex;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn dep(target: &str, constraint: VersionConstraint) -> DependencyMetadata {
    DependencyMetadata::new(ModuleId::parse(target).expect("valid id"), constraint)
}

fn exact(target: &str, version: &str) -> DependencyMetadata {
    dep(target, VersionConstraint::exactly(version))
}

fn root_with(dependencies: Vec<DependencyMetadata>) -> ComponentMetadata {
    let module_version = ModuleVersionId::parse("test:app:1.0").expect("valid id");
    let mut variant = Variant::new("default");
    variant.dependencies = dependencies;
    ComponentMetadata::new(
        ComponentId::Project(ProjectPath::new(":app")),
        module_version,
        vec![variant],
    )
}

fn resolve(
    source: &dyn ComponentMetadataSource,
    root: ComponentMetadata,
) -> Result<ResolvedGraph, ResolveError> {
    GraphResolver::new(source, &HighestVersionStrategy).resolve(root)
}

fn version_strings(graph: &ResolvedGraph) -> Vec<String> {
    graph
        .module_versions()
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn find_node(graph: &ResolvedGraph, module_version: &str) -> NodeIndex {
    graph
        .graph()
        .node_indices()
        .find(|&n| graph.node(n).module_version.to_string() == module_version)
        .expect("node present")
}

#[test]
fn diamond_shares_one_node_per_component() {
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:d", "1.0")]);
    source.add_module("test:b:1.0", vec![exact("test:d", "1.0")]);
    source.add_module("test:d:1.0", vec![]);

    let graph = resolve(
        &source,
        root_with(vec![exact("test:a", "1.0"), exact("test:b", "1.0")]),
    )
    .expect("resolves");

    // root, a, b and a single shared d node.
    assert_eq!(graph.node_count(), 4);
    assert_eq!(
        version_strings(&graph),
        vec!["test:a:1.0", "test:b:1.0", "test:d:1.0"]
    );
    // Two exact selectors agreeing on d resolve it with one metadata call
    // per distinct component plus one id round-trip for the shared reuse.
    assert_eq!(source.metadata_resolve_count(), 3);
}

#[test]
fn later_selector_upgrades_settled_module_and_reexpands() {
    init_tracing();
    // a is visited first and settles c at 1.0, whose subtree pulls in
    // old-dep. When b arrives requiring c 2.0, conflict resolution
    // displaces c 1.0: its subtree must be retracted and c 2.0's subtree
    // (new-dep) expanded instead.
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:c", "1.0")]);
    source.add_module("test:b:1.0", vec![exact("test:c", "2.0")]);
    source.add_module("test:c:1.0", vec![exact("test:old-dep", "1.0")]);
    source.add_module("test:c:2.0", vec![exact("test:new-dep", "1.0")]);
    source.add_module("test:old-dep:1.0", vec![]);
    source.add_module("test:new-dep:1.0", vec![]);

    let graph = resolve(
        &source,
        root_with(vec![exact("test:a", "1.0"), exact("test:b", "1.0")]),
    )
    .expect("resolves");

    let versions = version_strings(&graph);
    assert!(versions.contains(&"test:c:2.0".to_string()));
    assert!(versions.contains(&"test:new-dep:1.0".to_string()));
    assert!(!versions.contains(&"test:c:1.0".to_string()));
    assert!(!versions.contains(&"test:old-dep:1.0".to_string()));

    let c = find_node(&graph, "test:c:2.0");
    assert!(
        graph
            .node(c)
            .reason
            .has_cause(SelectionCause::ConflictResolution)
    );
}

#[test]
fn forced_selector_pins_version_across_the_graph() {
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:c", "2.0")]);
    source.add_module("test:c:1.0", vec![]);
    source.add_module("test:c:2.0", vec![]);

    let graph = resolve(
        &source,
        root_with(vec![
            exact("test:a", "1.0"),
            exact("test:c", "1.0").forced(),
        ]),
    )
    .expect("resolves");

    let versions = version_strings(&graph);
    assert!(versions.contains(&"test:c:1.0".to_string()));
    assert!(!versions.contains(&"test:c:2.0".to_string()));
    let c = find_node(&graph, "test:c:1.0");
    assert!(graph.node(c).reason.has_cause(SelectionCause::Forced));
}

#[test]
fn module_version_cycle_collapses_to_single_nodes() {
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:b", "1.0")]);
    source.add_module("test:b:1.0", vec![exact("test:a", "1.0")]);

    let graph = resolve(&source, root_with(vec![exact("test:a", "1.0")])).expect("resolves");

    // root, a, b; the back edge lands on the existing a node.
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn project_cycle_is_rejected() {
    let mut source = MemoryMetadataSource::new();
    // :p1 is a project in the current build whose metadata points back at
    // the root project's module coordinates.
    let p1_version = ModuleVersionId::parse("test:p1:1.0").expect("valid id");
    let mut p1_variant = Variant::new("default");
    p1_variant.dependencies = vec![exact("test:app", "1.0")];
    source.add(ComponentMetadata::new(
        ComponentId::Project(ProjectPath::new(":p1")),
        p1_version,
        vec![p1_variant],
    ));
    let app_version = ModuleVersionId::parse("test:app:1.0").expect("valid id");
    source.add(ComponentMetadata::new(
        ComponentId::Project(ProjectPath::new(":app")),
        app_version,
        vec![Variant::new("default")],
    ));

    let error = resolve(&source, root_with(vec![exact("test:p1", "1.0")]))
        .expect_err("cycle must be rejected");
    let ResolveError::ProjectCycle { path } = error else {
        panic!("expected a project cycle error, got {error}");
    };
    assert_eq!(path.first(), path.last());
    assert!(path.iter().any(|p| p.contains(":p1")));
}

struct FailingMetadata<'a> {
    inner: &'a MemoryMetadataSource,
    broken: ComponentId,
}

impl ComponentMetadataSource for FailingMetadata<'_> {
    fn resolve_id(
        &self,
        target: &ModuleId,
        constraint: &VersionConstraint,
        rejects: &UnionVersionSelector,
    ) -> Result<IdResolveResult, SelectorFailure> {
        self.inner.resolve_id(target, constraint, rejects)
    }

    fn resolve_metadata(&self, id: &ComponentId) -> Result<ComponentMetadata, MetadataFailure> {
        if *id == self.broken {
            return Err(MetadataFailure {
                id: id.clone(),
                message: "simulated repository outage".to_string(),
            });
        }
        self.inner.resolve_metadata(id)
    }
}

#[test]
fn metadata_failure_attaches_to_node_without_aborting_siblings() {
    let mut inner = MemoryMetadataSource::new();
    inner.add_module("test:a:1.0", vec![]);
    inner.add_module("test:b:1.0", vec![]);
    let source = FailingMetadata {
        inner: &inner,
        broken: ComponentId::Module(ModuleVersionId::parse("test:a:1.0").expect("valid id")),
    };

    let error = resolve(
        &source,
        root_with(vec![exact("test:a", "1.0"), exact("test:b", "1.0")]),
    )
    .expect_err("finalization must fail");
    let ResolveError::Graph(failure) = error else {
        panic!("expected a graph failure, got {error}");
    };

    // The sibling branch kept resolving.
    let graph = failure.graph();
    assert!(version_strings(graph).contains(&"test:b:1.0".to_string()));

    // The broken node answers metadata queries with null, cause separate.
    let a = find_node(graph, "test:a:1.0");
    assert!(graph.node(a).metadata_or_null().is_none());
    assert!(graph.node(a).failure.is_some());

    // The rendered message carries the dependency chain and the cause.
    let message = failure.to_string();
    assert!(message.contains("test:app:1.0 -> test:a:1.0"));
    assert!(message.contains("simulated repository outage"));
}

#[test]
fn unresolvable_module_is_reported_with_its_dependents() {
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:ghost", "1.0")]);

    let error =
        resolve(&source, root_with(vec![exact("test:a", "1.0")])).expect_err("must fail");
    let ResolveError::Graph(failure) = error else {
        panic!("expected a graph failure, got {error}");
    };
    let message = failure.to_string();
    assert!(message.contains("test:ghost"));
    assert!(message.contains("test:app:1.0 -> test:a:1.0"));
}

#[derive(Default)]
struct RecordingVisitor {
    events: Vec<String>,
}

impl GraphVisitor for RecordingVisitor {
    fn start(&mut self, root: &ResolvedNode) {
        self.events.push(format!("start {}", root.module_version));
    }

    fn visit_node(&mut self, node: &ResolvedNode) {
        self.events.push(format!("node {}", node.module_version));
    }

    fn visit_edges(&mut self, node: &ResolvedNode, _: &[(&ResolvedNode, &crate::graph::ResolvedEdge)]) {
        self.events.push(format!("edges {}", node.module_version));
    }

    fn finish(&mut self, root: &ResolvedNode) {
        self.events.push(format!("finish {}", root.module_version));
    }
}

#[test]
fn visitor_sees_all_nodes_before_any_edges_in_consumer_first_order() {
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:c", "1.0")]);
    source.add_module("test:b:1.0", vec![]);
    source.add_module("test:c:1.0", vec![]);

    let mut visitor = RecordingVisitor::default();
    GraphResolver::new(&source, &HighestVersionStrategy)
        .resolve_with_visitor(
            root_with(vec![exact("test:a", "1.0"), exact("test:b", "1.0")]),
            &mut visitor,
        )
        .expect("resolves");

    let events = &visitor.events;
    assert_eq!(events.first().map(String::as_str), Some("start test:app:1.0"));
    assert_eq!(events.last().map(String::as_str), Some("finish test:app:1.0"));

    let last_node = events
        .iter()
        .rposition(|e| e.starts_with("node "))
        .expect("nodes visited");
    let first_edges = events
        .iter()
        .position(|e| e.starts_with("edges "))
        .expect("edges visited");
    assert!(last_node < first_edges, "every visit_node precedes visit_edges");

    // Consumer-first: a's edges are visited before its dependency c's.
    let a_edges = events.iter().position(|e| e == "edges test:a:1.0");
    let c_edges = events.iter().position(|e| e == "edges test:c:1.0");
    assert!(a_edges < c_edges);
    // And the root's before everything else's.
    let root_edges = events.iter().position(|e| e == "edges test:app:1.0");
    assert!(root_edges < a_edges);
}

#[test]
fn exclusions_filter_dependencies_along_their_path() {
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:b", "1.0")]);
    source.add_module("test:b:1.0", vec![exact("test:c", "1.0")]);
    source.add_module("test:c:1.0", vec![]);

    let excluded = exact("test:a", "1.0")
        .with_exclusions(ExclusionSpec::of([ExcludeRule::module("test", "c")]));
    let graph = resolve(&source, root_with(vec![excluded])).expect("resolves");
    assert!(!version_strings(&graph).contains(&"test:c:1.0".to_string()));
}

#[test]
fn exclusions_apply_only_when_shared_by_every_path() {
    // One path to b excludes c, another does not: the intersection at b is
    // empty, so c must (re)appear even though b was first expanded through
    // the excluding path.
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:b", "1.0")]);
    source.add_module("test:d:1.0", vec![exact("test:b", "1.0")]);
    source.add_module("test:b:1.0", vec![exact("test:c", "1.0")]);
    source.add_module("test:c:1.0", vec![]);

    let excluding = exact("test:a", "1.0")
        .with_exclusions(ExclusionSpec::of([ExcludeRule::module("test", "c")]));
    let graph = resolve(
        &source,
        root_with(vec![excluding, exact("test:d", "1.0")]),
    )
    .expect("resolves");
    assert!(version_strings(&graph).contains(&"test:c:1.0".to_string()));
}

#[test]
fn intransitive_dependency_does_not_expand_target() {
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:b", "1.0")]);
    source.add_module("test:b:1.0", vec![]);

    let graph = resolve(
        &source,
        root_with(vec![exact("test:a", "1.0").intransitive()]),
    )
    .expect("resolves");
    let versions = version_strings(&graph);
    assert!(versions.contains(&"test:a:1.0".to_string()));
    assert!(!versions.contains(&"test:b:1.0".to_string()));
}

#[test]
fn transitive_edge_wakes_up_a_skipped_node() {
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:b", "1.0")]);
    source.add_module("test:b:1.0", vec![]);
    source.add_module("test:c:1.0", vec![exact("test:a", "1.0")]);

    let graph = resolve(
        &source,
        root_with(vec![
            exact("test:a", "1.0").intransitive(),
            exact("test:c", "1.0"),
        ]),
    )
    .expect("resolves");
    // c's transitive edge onto a re-awakens the skipped expansion.
    assert!(version_strings(&graph).contains(&"test:b:1.0".to_string()));
}

#[test]
fn calculated_paths_are_minimal() {
    // x is reachable directly from root and through a three-hop chain; the
    // diagnostic path must take the direct edge.
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:b", "1.0")]);
    source.add_module("test:b:1.0", vec![exact("test:x", "1.0")]);
    source.add_module("test:x:1.0", vec![]);

    let graph = resolve(
        &source,
        root_with(vec![exact("test:a", "1.0"), exact("test:x", "1.0")]),
    )
    .expect("resolves");

    let x = find_node(&graph, "test:x:1.0");
    let paths = calculate_paths(&graph, &[x]);
    assert_eq!(paths.len(), 1);
    assert_eq!(
        paths[0]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        vec!["test:app:1.0", "test:x:1.0"]
    );

    // A deeper node routes through the chain.
    let b = find_node(&graph, "test:b:1.0");
    let paths = calculate_paths(&graph, &[b]);
    assert_eq!(paths[0].len(), 3);
}

#[test]
fn variant_selection_follows_edge_attributes() {
    use crate::attributes::AttributeSet;

    let mut source = MemoryMetadataSource::new();
    let lib_version = ModuleVersionId::parse("test:lib:1.0").expect("valid id");
    source.add(ComponentMetadata::new(
        ComponentId::Module(lib_version.clone()),
        lib_version,
        vec![
            Variant::new("api").with_attributes(AttributeSet::new().with("usage", "api")),
            Variant::new("runtime")
                .with_attributes(AttributeSet::new().with("usage", "runtime")),
        ],
    ));

    let wants_runtime = exact("test:lib", "1.0")
        .with_attributes(AttributeSet::new().with("usage", "runtime"));
    let graph = resolve(&source, root_with(vec![wants_runtime])).expect("resolves");

    let lib = find_node(&graph, "test:lib:1.0");
    assert_eq!(graph.node(lib).variant, "runtime");
}

#[test]
fn retraction_cascades_through_released_selectors() {
    init_tracing();
    // c:1.0 settles early and its subtree (leaf) is fully expanded before
    // the deeper path d -> e forces c up to 2.0. Displacing c:1.0 releases
    // the only selector on leaf, which must disappear entirely, not linger.
    let mut source = MemoryMetadataSource::new();
    source.add_module("test:a:1.0", vec![exact("test:c", "1.0")]);
    source.add_module("test:d:1.0", vec![exact("test:e", "1.0")]);
    source.add_module("test:e:1.0", vec![exact("test:c", "2.0")]);
    source.add_module("test:c:1.0", vec![exact("test:leaf", "1.0")]);
    source.add_module("test:c:2.0", vec![]);
    source.add_module("test:leaf:1.0", vec![]);

    let graph = resolve(
        &source,
        root_with(vec![exact("test:a", "1.0"), exact("test:d", "1.0")]),
    )
    .expect("resolves");
    let versions = version_strings(&graph);
    assert!(versions.contains(&"test:c:2.0".to_string()));
    assert!(!versions.contains(&"test:c:1.0".to_string()));
    assert!(!versions.contains(&"test:leaf:1.0".to_string()));
    assert_eq!(versions.len(), 4);
}
