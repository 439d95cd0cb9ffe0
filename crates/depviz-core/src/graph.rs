//! Graph Store: canonical nodes and edges, backed by petgraph::StableDiGraph

use crate::model::*;
use petgraph::Direction;
use petgraph::stable_graph::{EdgeReference, NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Outcome of offering an edge to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Added,
    /// Stored as an unresolved import; rendered but flagged.
    Dangling,
    Duplicate,
    /// Unknown source, or a non-import edge to an unknown target.
    Dropped,
}

/// Summary of a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added_nodes: usize,
    pub updated_nodes: usize,
    pub added_edges: usize,
    pub dropped_edges: usize,
}

/// The diagram's nodes and edges. All mutation goes through this type.
#[derive(Clone)]
pub struct GraphStore {
    inner: StableDiGraph<Node, EdgeKind>,
    index: HashMap<NodeId, NodeIndex>,
    /// Import edges whose target is not in the store (yet).
    dangling: Vec<Edge>,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .field("dangling", &self.dangling.len())
            .finish()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        GraphStore {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
            dangling: Vec::new(),
        }
    }

    pub fn from_artifacts(artifacts: Artifacts) -> Self {
        let mut store = GraphStore::new();
        store.merge(artifacts);
        store
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).and_then(|&idx| self.inner.node_weight(idx))
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        let idx = *self.index.get(id)?;
        self.inner.node_weight_mut(idx)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn kind_of(&self, id: &NodeId) -> Option<NodeKind> {
        self.node(id).map(Node::kind)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Resolved plus dangling edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count() + self.dangling.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0 && self.dangling.is_empty()
    }

    /// Iterate over all nodes in store order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes().filter(move |n| n.kind() == kind)
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(|n| n.id.clone()).collect()
    }

    fn edge_of(&self, e: EdgeReference<'_, EdgeKind>) -> Edge {
        Edge {
            from: self.inner[e.source()].id.clone(),
            to: self.inner[e.target()].id.clone(),
            kind: *e.weight(),
        }
    }

    /// Iterate over all edges: resolved first, then dangling imports.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.inner
            .edge_references()
            .map(move |e| self.edge_of(e))
            .chain(self.dangling.iter().cloned())
    }

    pub fn dangling_edges(&self) -> &[Edge] {
        &self.dangling
    }

    pub fn is_dangling(&self, edge: &Edge) -> bool {
        self.dangling.contains(edge)
    }

    /// Outgoing edges of a node, dangling imports included.
    pub fn edges_from(&self, id: &NodeId) -> Vec<Edge> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        self.inner
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| self.edge_of(e))
            .chain(self.dangling.iter().filter(|e| &e.from == id).cloned())
            .collect()
    }

    /// Incoming edges of a node.
    pub fn edges_to(&self, id: &NodeId) -> Vec<Edge> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        self.inner
            .edges_directed(idx, Direction::Incoming)
            .map(|e| self.edge_of(e))
            .collect()
    }

    /// Every edge with `id` as either endpoint.
    pub fn incident_edges(&self, id: &NodeId) -> Vec<Edge> {
        let mut edges = self.edges_from(id);
        edges.extend(self.edges_to(id));
        edges
    }

    pub fn has_edge(&self, edge: &Edge) -> bool {
        match (self.index.get(&edge.from), self.index.get(&edge.to)) {
            (Some(&a), Some(&b)) => self
                .inner
                .edges_connecting(a, b)
                .any(|e| *e.weight() == edge.kind),
            _ => self.dangling.contains(edge),
        }
    }

    /// Add an edge unless its identity triple is already present.
    pub fn add_edge(&mut self, edge: Edge) -> EdgeInsert {
        if self.has_edge(&edge) {
            return EdgeInsert::Duplicate;
        }
        let Some(&from) = self.index.get(&edge.from) else {
            warn!("Dropping edge {} from unknown node", edge.key());
            return EdgeInsert::Dropped;
        };
        match self.index.get(&edge.to) {
            Some(&to) => {
                self.inner.add_edge(from, to, edge.kind);
                EdgeInsert::Added
            }
            None if edge.kind == EdgeKind::Import => {
                self.dangling.push(edge);
                EdgeInsert::Dangling
            }
            None => {
                warn!("Dropping {} edge to unknown node {}", edge.kind.as_str(), edge.to);
                EdgeInsert::Dropped
            }
        }
    }

    pub fn remove_edge(&mut self, edge: &Edge) -> bool {
        if let Some(pos) = self.dangling.iter().position(|e| e == edge) {
            self.dangling.remove(pos);
            return true;
        }
        let (Some(&a), Some(&b)) = (self.index.get(&edge.from), self.index.get(&edge.to)) else {
            return false;
        };
        let found = self
            .inner
            .edges_connecting(a, b)
            .find(|e| *e.weight() == edge.kind)
            .map(|e| e.id());
        match found {
            Some(eid) => self.inner.remove_edge(eid).is_some(),
            None => false,
        }
    }

    /// Insert a node, or overlay the record onto the existing node with the
    /// same id. Returns `true` when the node is new.
    pub fn upsert(&mut self, record: NodeRecord) -> bool {
        match self.index.get(&record.id) {
            Some(&idx) => {
                let existing = NodeRecord::from(self.inner[idx].clone());
                self.inner[idx] = Node::from(existing.overlay(record));
                false
            }
            None => {
                let id = record.id.clone();
                let idx = self.inner.add_node(Node::from(record));
                self.index.insert(id, idx);
                true
            }
        }
    }

    /// Idempotent union of a payload into the store.
    pub fn merge(&mut self, artifacts: Artifacts) -> MergeReport {
        let mut report = MergeReport::default();
        for record in artifacts.nodes {
            if self.upsert(record) {
                report.added_nodes += 1;
            } else {
                report.updated_nodes += 1;
            }
        }

        // previously unresolved imports may now have a target
        for edge in std::mem::take(&mut self.dangling) {
            self.add_edge(edge);
        }

        for edge in artifacts.edges {
            if self.is_own_child_import(&edge) {
                continue;
            }
            match self.add_edge(edge) {
                EdgeInsert::Added | EdgeInsert::Dangling => report.added_edges += 1,
                EdgeInsert::Duplicate => {}
                EdgeInsert::Dropped => report.dropped_edges += 1,
            }
        }

        debug!(
            "Merged {} new / {} updated nodes, {} edges ({} dropped)",
            report.added_nodes, report.updated_nodes, report.added_edges, report.dropped_edges
        );
        report
    }

    /// A module "importing" one of its own functions is parser noise.
    fn is_own_child_import(&self, edge: &Edge) -> bool {
        if edge.kind != EdgeKind::Import {
            return false;
        }
        match (self.node(&edge.from), self.node(&edge.to)) {
            (Some(from), Some(to)) => {
                from.kind() == NodeKind::Module
                    && to.kind() == NodeKind::Func
                    && to.parent() == Some(&from.id)
            }
            _ => false,
        }
    }

    /// Clear the store, then merge.
    pub fn replace(&mut self, artifacts: Artifacts) -> MergeReport {
        self.clear();
        self.merge(artifacts)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.index.clear();
        self.dangling.clear();
    }

    /// Repair structural invariants after a load or merge:
    /// a class's parent must be a module, a function's parent a module or
    /// class, and a docked item must have a parent that exists.
    /// Returns the number of nodes touched.
    pub fn normalize(&mut self) -> usize {
        let mut repaired = 0;
        let indices: Vec<NodeIndex> = self.inner.node_indices().collect();
        for idx in indices {
            let node = &self.inner[idx];
            let kind = node.kind();
            if kind == NodeKind::Module {
                continue;
            }
            let parent = node.parent().cloned();
            let parent_kind = parent.as_ref().and_then(|p| self.kind_of(p));
            let legal = matches!(
                (kind, parent_kind),
                (NodeKind::Class, Some(NodeKind::Module))
                    | (NodeKind::Func, Some(NodeKind::Module | NodeKind::Class))
            );
            if legal {
                continue;
            }

            let node = &mut self.inner[idx];
            let mut touched = false;
            if parent_kind.is_some() {
                warn!("{} cannot be owned by {:?}; detaching", node.id, parent);
                if let Some(slot) = node.parent_mut() {
                    *slot = None;
                }
                touched = true;
            }
            let pos = node.reported_pos().unwrap_or_default();
            if let Some(placement) = node.placement_mut()
                && placement.is_docked()
            {
                *placement = Placement::Free { pos };
                touched = true;
            }
            if touched {
                repaired += 1;
            }
        }
        repaired
    }

    pub fn set_all_collapsed(&mut self, collapsed: bool) {
        let indices: Vec<NodeIndex> = self.inner.node_indices().collect();
        for idx in indices {
            if let Some(m) = self.inner[idx].as_module_mut() {
                m.collapsed = collapsed;
            }
        }
    }

    /// Flip a module's collapsed flag. Children keep their offsets.
    pub fn toggle_collapsed(&mut self, id: &NodeId) -> Option<bool> {
        let m = self.node_mut(id)?.as_module_mut()?;
        m.collapsed = !m.collapsed;
        Some(m.collapsed)
    }

    /// Delete a node, every descendant, and every edge touching any of them.
    /// Returns the removed nodes.
    pub fn remove(&mut self, id: &NodeId) -> Vec<Node> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut doomed = vec![id.clone()];
        doomed.extend(self.descendants(id));

        let mut removed = Vec::with_capacity(doomed.len());
        for victim in &doomed {
            if let Some(idx) = self.index.remove(victim) {
                if let Some(node) = self.inner.remove_node(idx) {
                    removed.push(node);
                }
            }
        }
        let doomed: HashSet<&NodeId> = doomed.iter().collect();
        self.dangling
            .retain(|e| !doomed.contains(&e.from) && !doomed.contains(&e.to));
        removed
    }

    /// Direct children regardless of dock state.
    pub fn children_of(&self, id: &NodeId) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| n.parent() == Some(id))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Direct children currently docked in `id`.
    pub fn docked_children(&self, id: &NodeId) -> Vec<&Node> {
        self.nodes()
            .filter(|n| n.parent() == Some(id) && n.is_docked())
            .collect()
    }

    /// All transitive children, breadth-first.
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut frontier = vec![id.clone()];
        while let Some(current) = frontier.pop() {
            for child in self.children_of(&current) {
                if &child != id && !out.contains(&child) {
                    frontier.push(child.clone());
                    out.push(child);
                }
            }
        }
        out
    }

    /// The module that owns a node directly or through its class.
    pub fn home_module(&self, id: &NodeId) -> Option<NodeId> {
        let node = self.node(id)?;
        match node.kind() {
            NodeKind::Module => Some(node.id.clone()),
            NodeKind::Class => node
                .parent()
                .filter(|p| self.kind_of(p) == Some(NodeKind::Module))
                .cloned(),
            NodeKind::Func => {
                let parent = self.node(node.parent()?)?;
                match parent.kind() {
                    NodeKind::Module => Some(parent.id.clone()),
                    NodeKind::Class => parent
                        .parent()
                        .filter(|p| self.kind_of(p) == Some(NodeKind::Module))
                        .cloned(),
                    NodeKind::Func => None,
                }
            }
        }
    }

    /// Docked with a parent that exists in the store.
    pub fn is_docked(&self, id: &NodeId) -> bool {
        self.node(id)
            .is_some_and(|n| n.is_docked() && n.parent().is_some_and(|p| self.contains(p)))
    }

    /// The collapsed module that hides `id`, following docked links upward.
    pub fn collapsed_ancestor(&self, id: &NodeId) -> Option<NodeId> {
        let mut current = self.node(id)?;
        loop {
            if !self.is_docked(&current.id) {
                return None;
            }
            let parent = self.node(current.parent()?)?;
            match parent.kind() {
                NodeKind::Module => {
                    return parent.is_collapsed().then(|| parent.id.clone());
                }
                _ => current = parent,
            }
        }
    }

    /// Export the store as a payload (records plus edges).
    pub fn to_artifacts(&self) -> Artifacts {
        Artifacts {
            nodes: self.nodes().cloned().map(NodeRecord::from).collect(),
            edges: self.edges().collect(),
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
