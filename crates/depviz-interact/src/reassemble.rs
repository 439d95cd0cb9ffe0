//! Pull lost children back into their containers

use depviz_core::{GraphStore, NodeId, NodeKind, Placement};

fn redock(store: &mut GraphStore, id: &NodeId) -> bool {
    let has_parent = store
        .node(id)
        .and_then(|n| n.parent())
        .is_some_and(|p| store.contains(p));
    if !has_parent {
        return false;
    }
    match store.node_mut(id).and_then(|n| n.placement_mut()) {
        Some(p) => {
            *p = Placement::Docked { offset: None };
            true
        }
        None => false,
    }
}

fn methods_of(store: &GraphStore, class: &NodeId) -> Vec<NodeId> {
    store
        .children_of(class)
        .into_iter()
        .filter(|c| store.kind_of(c) == Some(NodeKind::Func))
        .collect()
}

/// Dock a function or class back into its parent, clearing its slot so the
/// next layout pass appends it. A class brings its methods along.
pub fn reattach(store: &mut GraphStore, id: &NodeId) -> bool {
    match store.kind_of(id) {
        Some(NodeKind::Func) => redock(store, id),
        Some(NodeKind::Class) => {
            if !redock(store, id) {
                return false;
            }
            for m in methods_of(store, id) {
                redock(store, &m);
            }
            true
        }
        _ => false,
    }
}

/// Re-dock every method of a class.
pub fn reassemble_class(store: &mut GraphStore, id: &NodeId) -> bool {
    if store.kind_of(id) != Some(NodeKind::Class) {
        return false;
    }
    for m in methods_of(store, id) {
        redock(store, &m);
    }
    true
}

/// Re-dock every function and class that belongs to a module, then expand it.
pub fn reassemble_module(store: &mut GraphStore, id: &NodeId) -> bool {
    if store.kind_of(id) != Some(NodeKind::Module) {
        return false;
    }
    for child in store.children_of(id) {
        match store.kind_of(&child) {
            Some(NodeKind::Func) => {
                redock(store, &child);
            }
            Some(NodeKind::Class) => {
                reattach(store, &child);
            }
            _ => {}
        }
    }
    if let Some(m) = store.node_mut(id).and_then(|n| n.as_module_mut()) {
        m.collapsed = false;
    }
    true
}

/// Dispatch on kind: classes and modules reassemble, functions reattach.
pub fn reassemble(store: &mut GraphStore, id: &NodeId) -> bool {
    match store.kind_of(id) {
        Some(NodeKind::Module) => reassemble_module(store, id),
        Some(NodeKind::Class) => reassemble_class(store, id),
        Some(NodeKind::Func) => reattach(store, id),
        None => false,
    }
}

pub fn has_lost_methods(store: &GraphStore, class: &NodeId) -> bool {
    methods_of(store, class).iter().any(|m| !store.is_docked(m))
}

/// Any direct function undocked, or any class free or missing methods.
pub fn has_lost_children(store: &GraphStore, id: &NodeId) -> bool {
    match store.kind_of(id) {
        Some(NodeKind::Class) => has_lost_methods(store, id),
        Some(NodeKind::Module) => store.children_of(id).iter().any(|c| match store.kind_of(c) {
            Some(NodeKind::Func) => !store.is_docked(c),
            Some(NodeKind::Class) => !store.is_docked(c) || has_lost_methods(store, c),
            _ => false,
        }),
        _ => false,
    }
}
