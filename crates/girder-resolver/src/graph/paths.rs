//! Shortest dependency chains for diagnostics.
//!
//! Finds a root-to-node chain for error messages without an all-pairs
//! shortest-path pass. The traversal is a backward walk over dependents
//! using a deque with front re-insertion: a node is peeked, its dependents
//! are pushed in front of it, and only when it is reached again (all of its
//! dependents finalized) is its own shortest path fixed. This is a specific
//! depth-first-leaning discipline, not a cost-based search; on equal-length
//! paths the first one discovered wins and no stronger tie-break is
//! guaranteed.

use crate::graph::result::ResolvedGraph;
use ahash::{AHashMap, AHashSet};
use girder_core::ModuleVersionId;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use std::collections::VecDeque;

/// Compute, for each given node, a shortest chain from the graph root to
/// that node. Nodes unreachable from the root produce no chain.
#[must_use]
pub fn calculate_paths(
    graph: &ResolvedGraph,
    targets: &[NodeIndex],
) -> Vec<Vec<ModuleVersionId>> {
    targets
        .iter()
        .filter_map(|&target| shortest_chain(graph, target))
        .collect()
}

fn dependents(graph: &ResolvedGraph, node: NodeIndex) -> Vec<NodeIndex> {
    let mut seen = AHashSet::new();
    graph
        .graph()
        .neighbors_directed(node, Direction::Incoming)
        .filter(|&d| seen.insert(d))
        .collect()
}

fn shortest_chain(graph: &ResolvedGraph, target: NodeIndex) -> Option<Vec<ModuleVersionId>> {
    let root = graph.root();
    if target == root {
        return Some(vec![graph.node(root).module_version.clone()]);
    }

    let mut queue: VecDeque<NodeIndex> = dependents(graph, target).into();
    let mut seen: AHashSet<NodeIndex> = AHashSet::new();
    let mut paths: AHashMap<NodeIndex, Vec<NodeIndex>> = AHashMap::new();

    while let Some(&node) = queue.front() {
        if node == root {
            queue.pop_front();
            paths.entry(root).or_insert_with(|| vec![root]);
        } else if seen.insert(node) {
            // First encounter: explore the node's own dependents before
            // finalizing it. The node stays queued behind them.
            for dependent in dependents(graph, node) {
                if !seen.contains(&dependent) {
                    queue.push_front(dependent);
                }
            }
        } else {
            let node = queue.pop_front().unwrap_or(node);
            if paths.contains_key(&node) {
                continue;
            }
            let best = dependents(graph, node)
                .into_iter()
                .filter_map(|d| paths.get(&d))
                .min_by_key(|p| p.len());
            if let Some(best) = best {
                let mut path = best.clone();
                path.push(node);
                paths.insert(node, path);
            }
        }
    }

    let mut chain: Vec<NodeIndex> = dependents(graph, target)
        .into_iter()
        .filter_map(|d| paths.get(&d))
        .min_by_key(|p| p.len())?
        .clone();
    chain.push(target);
    Some(
        chain
            .into_iter()
            .map(|n| graph.node(n).module_version.clone())
            .collect(),
    )
}
