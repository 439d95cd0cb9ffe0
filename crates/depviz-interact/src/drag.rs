//! Drag gesture: docked/free transitions for modules, classes and functions
//!
//! Every transition reads geometry from the last `Layout` and writes only
//! the dragged node's placement, so an abandoned gesture can always be
//! undone with [`cancel`].

use depviz_core::{GraphStore, LayoutConfig, NodeId, NodeKind, Placement, Point};
use depviz_layout::{Layout, Rect, push_out, resolve_leaf};
use tracing::debug;

/// Where the dragged node was when the gesture began.
#[derive(Debug, Clone, PartialEq)]
enum Origin {
    Module(Point),
    Item(Placement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drag {
    pub node: NodeId,
    pub kind: NodeKind,
    /// Pointer minus the node's top-left corner at grab time.
    pub grab: Point,
    pub last_pointer: Point,
    origin: Origin,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging(Drag),
}

impl Gesture {
    pub fn is_dragging(&self) -> bool {
        matches!(self, Gesture::Dragging(_))
    }

    pub fn node(&self) -> Option<&NodeId> {
        match self {
            Gesture::Idle => None,
            Gesture::Dragging(d) => Some(&d.node),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Left the parent container and became free.
    Detached,
    /// Geometry was missing; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Modules and docked items stay where the last move put them.
    Settled,
    Docked { parent: NodeId },
    StayedFree,
    /// A class dropped on a module other than its own.
    Refused { target: NodeId },
    Ignored,
}

fn world_origin(layout: &Layout, id: &NodeId) -> Option<Point> {
    layout.rect_of(id).map(|r| r.origin())
}

/// Start dragging `id` grabbed at `pointer` (world space).
pub fn begin(store: &GraphStore, layout: &Layout, id: &NodeId, pointer: Point) -> Option<Drag> {
    let node = store.node(id)?;
    if layout.is_hidden(id) {
        return None;
    }
    let corner = world_origin(layout, id)?;
    let origin = match node.kind() {
        NodeKind::Module => Origin::Module(node.as_module()?.pos),
        _ => Origin::Item(*node.placement()?),
    };
    Some(Drag {
        node: id.clone(),
        kind: node.kind(),
        grab: Point::new(pointer.x - corner.x, pointer.y - corner.y),
        last_pointer: pointer,
        origin,
    })
}

fn set_placement(store: &mut GraphStore, id: &NodeId, placement: Placement) {
    if let Some(p) = store.node_mut(id).and_then(|n| n.placement_mut()) {
        *p = placement;
    }
}

/// Boxes of every module except those listed.
fn module_boxes_except(store: &GraphStore, layout: &Layout, skip: &[Option<&NodeId>]) -> Vec<Rect> {
    store
        .nodes_of_kind(NodeKind::Module)
        .filter(|m| !skip.contains(&Some(&m.id)))
        .filter_map(|m| layout.box_of(&m.id))
        .collect()
}

/// Offset of a function inside its container, clamped to the interior.
fn clamp_func_offset(config: &LayoutConfig, parent_box: Rect, parent_is_class: bool, at: Point, width: f64) -> Point {
    let pad = config.module_pad;
    let head = config.head_for(parent_is_class) + pad;
    let inner_w = parent_box.w - pad * 2.0;
    let max_x = pad + (inner_w - width).max(0.0);
    let max_y = head.max(parent_box.h - pad - config.func_height);
    Point::new(
        (at.x - parent_box.x).clamp(pad, max_x),
        (at.y - parent_box.y).clamp(head, max_y),
    )
}

/// Offset of a class inside its module, clamped to the interior.
fn clamp_class_offset(config: &LayoutConfig, module_box: Rect, at: Point, class_box: Rect) -> Point {
    let pad = config.module_pad;
    let head = config.module_head + pad;
    let max_x = pad.max(module_box.w - pad - class_box.w);
    let max_y = head.max(module_box.h - pad - class_box.h);
    Point::new(
        (at.x - module_box.x).clamp(pad, max_x),
        (at.y - module_box.y).clamp(head, max_y),
    )
}

/// Apply one pointer move to the dragged node.
pub fn drag_to(store: &mut GraphStore, layout: &Layout, config: &LayoutConfig, drag: &mut Drag, pointer: Point) -> MoveOutcome {
    drag.last_pointer = pointer;
    let at = Point::new(pointer.x - drag.grab.x, pointer.y - drag.grab.y);
    let id = drag.node.clone();
    match drag.kind {
        NodeKind::Module => move_module(store, layout, config, &id, at),
        NodeKind::Class => move_class(store, layout, config, &id, at, pointer),
        NodeKind::Func => move_func(store, layout, config, &id, at),
    }
}

fn move_module(store: &mut GraphStore, layout: &Layout, config: &LayoutConfig, id: &NodeId, at: Point) -> MoveOutcome {
    let Some(current) = layout.box_of(id) else {
        return MoveOutcome::Ignored;
    };
    let others = module_boxes_except(store, layout, &[Some(id)]);
    let pos = push_out(current.moved_to(at), &others, config.push_out_rounds);
    match store.node_mut(id).and_then(|n| n.as_module_mut()) {
        Some(m) => {
            m.pos = pos;
            MoveOutcome::Moved
        }
        None => MoveOutcome::Ignored,
    }
}

fn move_class(store: &mut GraphStore, layout: &Layout, config: &LayoutConfig, id: &NodeId, at: Point, pointer: Point) -> MoveOutcome {
    let Some(class_box) = layout.box_of(id) else {
        return MoveOutcome::Ignored;
    };
    let parent = store.node(id).and_then(|n| n.parent()).cloned();
    let candidate = class_box.moved_to(at);

    if store.is_docked(id) {
        let Some(module_box) = parent.as_ref().and_then(|p| layout.box_of(p)) else {
            return MoveOutcome::Ignored;
        };
        let pad = config.detach_pad;
        if !module_box.contains(pointer, pad) || !module_box.contains(candidate.center(), pad) {
            set_placement(store, id, Placement::Free { pos: at });
            debug!("class {} detached", id);
            return MoveOutcome::Detached;
        }
        let offset = clamp_class_offset(config, module_box, at, class_box);
        set_placement(store, id, Placement::Docked { offset: Some(offset) });
        return MoveOutcome::Moved;
    }

    let obstacles = module_boxes_except(store, layout, &[parent.as_ref()]);
    let pos = push_out(candidate, &obstacles, config.push_out_rounds);
    set_placement(store, id, Placement::Free { pos });
    MoveOutcome::Moved
}

fn move_func(store: &mut GraphStore, layout: &Layout, config: &LayoutConfig, id: &NodeId, at: Point) -> MoveOutcome {
    let Some(rect) = layout.func_rect(id) else {
        return MoveOutcome::Ignored;
    };

    if store.is_docked(id) {
        let Some(parent) = store.node(id).and_then(|n| n.parent()).cloned() else {
            return MoveOutcome::Ignored;
        };
        let Some(parent_box) = layout.box_of(&parent) else {
            return MoveOutcome::Ignored;
        };
        let probe = Point::new(at.x + config.module_pad, at.y + config.module_pad);
        if !parent_box.contains(probe, config.detach_pad) {
            set_placement(store, id, Placement::Free { pos: at });
            debug!("function {} detached from {}", id, parent);
            return MoveOutcome::Detached;
        }
        let is_class = store.kind_of(&parent) == Some(NodeKind::Class);
        let offset = clamp_func_offset(config, parent_box, is_class, at, rect.w);
        set_placement(store, id, Placement::Docked { offset: Some(offset) });
        return MoveOutcome::Moved;
    }

    let home = store.home_module(id);
    let obstacles = module_boxes_except(store, layout, &[home.as_ref()]);
    let pos = push_out(rect.moved_to(at), &obstacles, config.push_out_rounds);
    set_placement(store, id, Placement::Free { pos });
    MoveOutcome::Moved
}

/// Containers a free item may dock into on release.
fn allowed_targets(store: &GraphStore, id: &NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    if let Some(home) = store.home_module(id) {
        out.push(home);
    }
    if let Some(parent) = store.node(id).and_then(|n| n.parent())
        && store.kind_of(parent) == Some(NodeKind::Class)
    {
        out.push(parent.clone());
    }
    out
}

/// Container among `candidates` whose padded box overlaps `rect` most.
fn best_target(layout: &Layout, rect: &Rect, candidates: &[NodeId], pad: f64) -> Option<(NodeId, Rect)> {
    let mut best: Option<(NodeId, Rect, f64)> = None;
    for id in candidates {
        if layout.is_hidden(id) {
            continue;
        }
        let Some(b) = layout.box_of(id) else { continue };
        let area = rect.overlap_area(&b.inflate(pad));
        if area > 0.0 && best.as_ref().is_none_or(|(_, _, a)| area > *a) {
            best = Some((id.clone(), b, area));
        }
    }
    best.map(|(id, b, _)| (id, b))
}

/// Finish the gesture. Free items try to dock; everything else settles.
pub fn release(store: &mut GraphStore, layout: &Layout, config: &LayoutConfig, drag: &Drag) -> ReleaseOutcome {
    let id = &drag.node;
    if !store.contains(id) {
        return ReleaseOutcome::Ignored;
    }
    if drag.kind == NodeKind::Module || store.is_docked(id) {
        return ReleaseOutcome::Settled;
    }
    match drag.kind {
        NodeKind::Func => release_func(store, layout, config, id),
        NodeKind::Class => release_class(store, layout, config, drag),
        NodeKind::Module => ReleaseOutcome::Settled,
    }
}

fn release_func(store: &mut GraphStore, layout: &Layout, config: &LayoutConfig, id: &NodeId) -> ReleaseOutcome {
    let Some(rect) = layout.func_rect(id) else {
        return ReleaseOutcome::Ignored;
    };
    let parent = store.node(id).and_then(|n| n.parent()).cloned();
    let allowed = allowed_targets(store, id);

    if let Some((mut target, mut target_box)) = best_target(layout, &rect, &allowed, config.detach_pad) {
        // dropping a method on its class's module lands it in the class
        if store.kind_of(&target) == Some(NodeKind::Module)
            && let Some(class) = parent.as_ref().filter(|p| store.kind_of(p) == Some(NodeKind::Class))
            && let Some(class_box) = layout.box_of(class)
        {
            target = class.clone();
            target_box = class_box;
        }
        if parent.as_ref() == Some(&target) {
            let is_class = store.kind_of(&target) == Some(NodeKind::Class);
            let offset = clamp_func_offset(config, target_box, is_class, rect.origin(), rect.w);
            set_placement(store, id, Placement::Docked { offset: Some(offset) });
            debug!("function {} docked into {}", id, target);
            return ReleaseOutcome::Docked { parent: target };
        }
    }

    let others: Vec<Rect> = store
        .nodes_of_kind(NodeKind::Func)
        .filter(|n| &n.id != id && !store.is_docked(&n.id))
        .filter_map(|n| layout.func_rect(&n.id))
        .collect();
    let pos = resolve_leaf(rect, &others, config);
    set_placement(store, id, Placement::Free { pos });
    ReleaseOutcome::StayedFree
}

fn release_class(store: &mut GraphStore, layout: &Layout, config: &LayoutConfig, drag: &Drag) -> ReleaseOutcome {
    let id = &drag.node;
    let Some(class_box) = layout.box_of(id) else {
        return ReleaseOutcome::Ignored;
    };
    let modules: Vec<NodeId> = store.nodes_of_kind(NodeKind::Module).map(|m| m.id.clone()).collect();
    let Some((target, module_box)) = best_target(layout, &class_box, &modules, config.detach_pad) else {
        return ReleaseOutcome::StayedFree;
    };
    let parent = store.node(id).and_then(|n| n.parent()).cloned();
    if parent.as_ref() != Some(&target) {
        debug!("class {} refused by {}", id, target);
        return ReleaseOutcome::Refused { target };
    }
    let at = Point::new(drag.last_pointer.x - drag.grab.x, drag.last_pointer.y - drag.grab.y);
    let offset = clamp_class_offset(config, module_box, at, class_box);
    set_placement(store, id, Placement::Docked { offset: Some(offset) });
    ReleaseOutcome::Docked { parent: target }
}

/// Put the dragged node back where the gesture found it.
pub fn cancel(store: &mut GraphStore, drag: &Drag) {
    match &drag.origin {
        Origin::Module(pos) => {
            if let Some(m) = store.node_mut(&drag.node).and_then(|n| n.as_module_mut()) {
                m.pos = *pos;
            }
        }
        Origin::Item(placement) => set_placement(store, &drag.node, *placement),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn func_clamp_respects_header_of_parent_kind() {
        let config = LayoutConfig::default();
        let parent = Rect::new(0.0, 0.0, 220.0, 200.0);
        let in_module = clamp_func_offset(&config, parent, false, Point::new(-50.0, -50.0), 200.0);
        assert_eq!(in_module, Point::new(10.0, 38.0));
        let in_class = clamp_func_offset(&config, parent, true, Point::new(-50.0, -50.0), 200.0);
        assert_eq!(in_class, Point::new(10.0, 32.0));
        let far = clamp_func_offset(&config, parent, false, Point::new(900.0, 900.0), 180.0);
        assert_eq!(far, Point::new(30.0, 148.0));
    }

    #[test]
    fn class_clamp_degenerates_to_header_when_too_big() {
        let config = LayoutConfig::default();
        let module = Rect::new(100.0, 100.0, 220.0, 120.0);
        let class = Rect::new(0.0, 0.0, 300.0, 300.0);
        assert_eq!(
            clamp_class_offset(&config, module, Point::new(500.0, 500.0), class),
            Point::new(10.0, 38.0)
        );
    }
}
