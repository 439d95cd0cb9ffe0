//! Candidate resolution: turns call names into `call` edges

use crate::calls::{call_sites, strip_strings_and_comments};
use crate::imports::import_targets;
use depviz_core::{Edge, EdgeInsert, GraphStore, Node, NodeId, NodeKind};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// The trailing identifier of a function label: `Cls.run()` -> `run`.
fn callable_name(node: &Node) -> &str {
    node.bare_name().rsplit('.').next().unwrap_or("")
}

/// Modules each module imports, restricted to modules present in the store.
fn import_preferences(store: &GraphStore) -> HashMap<NodeId, HashSet<NodeId>> {
    store
        .nodes_of_kind(NodeKind::Module)
        .map(|module| {
            let source = module.as_module().and_then(|m| m.source.as_deref()).unwrap_or("");
            let targets = import_targets(&module.label, source)
                .into_iter()
                .filter(|t| store.kind_of(t) == Some(NodeKind::Module))
                .collect();
            (module.id.clone(), targets)
        })
        .collect()
}

/// Propose `call` edges that are not already in the store.
///
/// For each call name, a candidate living in a module the caller's module
/// imports wins; otherwise the first candidate that is not the caller.
pub fn infer_call_edges(store: &GraphStore) -> Vec<Edge> {
    let funcs: Vec<&Node> = store.nodes_of_kind(NodeKind::Func).collect();

    let mut by_name: HashMap<&str, Vec<&Node>> = HashMap::new();
    for &f in &funcs {
        let name = callable_name(f);
        if !name.is_empty() {
            by_name.entry(name).or_default().push(f);
        }
    }

    let prefs = import_preferences(store);
    let empty = HashSet::new();
    let mut proposed = Vec::new();
    let mut seen = HashSet::new();

    for caller in &funcs {
        let Some(snippet) = caller.snippet() else {
            continue;
        };
        let home = store.home_module(&caller.id);
        let preferred = home.as_ref().and_then(|h| prefs.get(h)).unwrap_or(&empty);

        for name in call_sites(&strip_strings_and_comments(snippet)) {
            let Some(candidates) = by_name.get(name.as_str()) else {
                continue;
            };
            let others = || candidates.iter().filter(|c| c.id != caller.id);
            let chosen = others()
                .find(|c| {
                    store
                        .home_module(&c.id)
                        .is_some_and(|m| preferred.contains(&m))
                })
                .or_else(|| others().next());
            let Some(target) = chosen else {
                continue;
            };
            let edge = Edge::call(caller.id.clone(), target.id.clone());
            if store.has_edge(&edge) || !seen.insert(edge.key()) {
                continue;
            }
            debug!("Inferred {} ({} -> {})", edge.key(), caller.label, target.label);
            proposed.push(edge);
        }
    }
    proposed
}

/// Infer and insert edges. Returns how many were added.
pub fn apply_inferred_edges(store: &mut GraphStore) -> usize {
    let proposed = infer_call_edges(store);
    let added = proposed
        .into_iter()
        .filter(|edge| store.add_edge(edge.clone()) == EdgeInsert::Added)
        .count();
    if added > 0 {
        info!("Inferred {} call edges", added);
    }
    added
}
