//! Impact slice: bounded reachability from a seed node

use crate::graph::GraphStore;
use crate::model::{EdgeKey, NodeId, NodeKind, TypeVisibility};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::{Duration, Instant};
use tracing::debug;

/// Which way edges are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "out")]
    Outbound,
    #[serde(alias = "in")]
    Inbound,
}

/// Nodes and edges reached by a slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub nodes: BTreeSet<NodeId>,
    pub edges: BTreeSet<EdgeKey>,
    /// The time budget ran out before the frontier was exhausted.
    pub partial: bool,
}

impl Slice {
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn contains_edge(&self, key: &EdgeKey) -> bool {
        self.edges.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Per-kind tallies reported alongside a slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceCounts {
    pub modules: usize,
    pub classes: usize,
    pub funcs: usize,
    pub edges: usize,
}

/// Human-facing digest of a slice, keyed by file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    pub direction: Direction,
    pub file_list: Vec<String>,
    pub counts: SliceCounts,
}

/// Breadth-first search from `seed` along edges of visible kinds.
///
/// A class seed expands to its methods, since classes carry no edges.
/// Ancestors of every reached node are added afterwards.
pub fn impact_slice(
    store: &GraphStore,
    seed: &NodeId,
    direction: Direction,
    visibility: TypeVisibility,
    budget: Duration,
) -> Slice {
    let mut slice = Slice::default();
    let Some(seed_node) = store.node(seed) else {
        return slice;
    };

    let started = Instant::now();
    let mut queue = VecDeque::new();
    slice.nodes.insert(seed.clone());
    queue.push_back(seed.clone());
    if seed_node.kind() == NodeKind::Class {
        for child in store.children_of(seed) {
            if store.kind_of(&child) == Some(NodeKind::Func) && slice.nodes.insert(child.clone()) {
                queue.push_back(child);
            }
        }
    }

    while let Some(current) = queue.pop_front() {
        if started.elapsed() >= budget {
            debug!("Impact slice from {} hit its {:?} budget", seed, budget);
            slice.partial = true;
            break;
        }
        let edges = match direction {
            Direction::Outbound => store.edges_from(&current),
            Direction::Inbound => store.edges_to(&current),
        };
        for edge in edges {
            if !visibility.is_visible(edge.kind) {
                continue;
            }
            let next = match direction {
                Direction::Outbound => &edge.to,
                Direction::Inbound => &edge.from,
            };
            // dangling imports lead nowhere
            if !store.contains(next) {
                continue;
            }
            slice.edges.insert(edge.key());
            if slice.nodes.insert(next.clone()) {
                queue.push_back(next.clone());
            }
        }
    }

    include_ancestors(store, &mut slice.nodes);
    slice
}

/// func implies its class (if any) and module; class implies its module.
fn include_ancestors(store: &GraphStore, nodes: &mut BTreeSet<NodeId>) {
    let reached: Vec<NodeId> = nodes.iter().cloned().collect();
    for id in reached {
        let Some(node) = store.node(&id) else {
            continue;
        };
        if node.kind() == NodeKind::Module {
            continue;
        }
        if let Some(parent) = node.parent().filter(|p| store.contains(p)) {
            nodes.insert(parent.clone());
        }
        if let Some(home) = store.home_module(&id) {
            nodes.insert(home);
        }
    }
}

/// Summarise a slice by owning file.
pub fn summarize(store: &GraphStore, slice: &Slice, direction: Direction) -> ImpactSummary {
    let mut files = BTreeMap::new();
    let mut counts = SliceCounts {
        edges: slice.edges.len(),
        ..SliceCounts::default()
    };
    for node in slice.nodes.iter().filter_map(|id| store.node(id)) {
        match node.kind() {
            NodeKind::Module => {
                let file = node.fs_path.clone().unwrap_or_else(|| node.label.clone());
                files.insert(file, ());
            }
            NodeKind::Class => counts.classes += 1,
            NodeKind::Func => counts.funcs += 1,
        }
    }
    counts.modules = files.len();
    ImpactSummary {
        direction,
        file_list: files.into_keys().collect(),
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Artifacts, Edge, NodeRecord};

    fn chain() -> GraphStore {
        let m = NodeRecord::new("m", NodeKind::Module, "src/m.py");
        let a = NodeRecord::new("a", NodeKind::Func, "a()").with_parent("m");
        let b = NodeRecord::new("b", NodeKind::Func, "b()").with_parent("m");
        let c = NodeRecord::new("c", NodeKind::Func, "c()").with_parent("m");
        GraphStore::from_artifacts(Artifacts {
            nodes: vec![m, a, b, c],
            edges: vec![Edge::call("a", "b"), Edge::call("b", "c")],
        })
    }

    #[test]
    fn zero_budget_is_partial_but_keeps_seed() {
        let store = chain();
        let slice = impact_slice(
            &store,
            &"a".into(),
            Direction::Outbound,
            TypeVisibility::default(),
            Duration::ZERO,
        );
        assert!(slice.partial);
        assert!(slice.contains_node(&"a".into()));
        assert!(slice.contains_node(&"m".into()));
        assert!(slice.edges.is_empty());
    }

    #[test]
    fn unknown_seed_is_empty() {
        let store = chain();
        let slice = impact_slice(
            &store,
            &"nope".into(),
            Direction::Inbound,
            TypeVisibility::default(),
            Duration::from_millis(50),
        );
        assert!(slice.is_empty());
        assert!(!slice.partial);
    }

    #[test]
    fn summary_counts_by_kind() {
        let store = chain();
        let slice = impact_slice(
            &store,
            &"a".into(),
            Direction::Outbound,
            TypeVisibility::default(),
            Duration::from_millis(50),
        );
        let summary = summarize(&store, &slice, Direction::Outbound);
        assert_eq!(summary.file_list, vec!["src/m.py".to_string()]);
        assert_eq!(summary.counts.modules, 1);
        assert_eq!(summary.counts.funcs, 3);
        assert_eq!(summary.counts.edges, 2);
    }
}
