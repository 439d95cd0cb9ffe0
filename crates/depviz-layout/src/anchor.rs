//! Edge endpoints

use crate::layout::Layout;
use depviz_core::{GraphStore, NodeId, NodeKind, Point};

/// World-space point where edges attach to `id`.
///
/// Items hidden inside a collapsed module attach to that module's centre.
/// Returns `None` when the node or its geometry is missing.
pub fn anchor_point(store: &GraphStore, layout: &Layout, id: &NodeId) -> Option<Point> {
    let node = store.node(id)?;
    if let Some(module) = store.collapsed_ancestor(id) {
        return layout.box_of(&module).map(|b| b.center());
    }
    match node.kind() {
        NodeKind::Module | NodeKind::Class => layout.box_of(id).map(|b| b.center()),
        NodeKind::Func => layout.func_rect(id).map(|r| r.center()),
    }
}
