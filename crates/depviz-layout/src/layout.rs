//! Box table and the top-to-bottom flow pass for container interiors

use crate::geometry::Rect;
use depviz_core::{
    ApproxMeasure, GraphStore, LayoutConfig, Node, NodeBody, NodeId, NodeKind, Placement, Point,
    TextMeasure,
};
use std::collections::{HashMap, HashSet};

/// Derived geometry for one layout pass. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Boxes of modules and visible classes.
    pub boxes: HashMap<NodeId, Rect>,
    /// Rendered rectangles of visible functions.
    pub funcs: HashMap<NodeId, Rect>,
    /// Docked items inside a collapsed module.
    pub hidden: HashSet<NodeId>,
}

impl Layout {
    pub fn box_of(&self, id: &NodeId) -> Option<Rect> {
        self.boxes.get(id).copied()
    }

    pub fn func_rect(&self, id: &NodeId) -> Option<Rect> {
        self.funcs.get(id).copied()
    }

    /// Box or function rectangle, whichever the node has.
    pub fn rect_of(&self, id: &NodeId) -> Option<Rect> {
        self.box_of(id).or_else(|| self.func_rect(id))
    }

    pub fn is_hidden(&self, id: &NodeId) -> bool {
        self.hidden.contains(id)
    }

    /// Shift a node's rectangle in place.
    pub fn shift(&mut self, id: &NodeId, dx: f64, dy: f64) {
        if let Some(r) = self.boxes.get_mut(id) {
            *r = r.translate(dx, dy);
        }
        if let Some(r) = self.funcs.get_mut(id) {
            *r = r.translate(dx, dy);
        }
    }

    /// Bounding rect of everything laid out.
    pub fn extent(&self) -> Option<Rect> {
        self.boxes
            .values()
            .chain(self.funcs.values())
            .copied()
            .reduce(|a, b| a.union(&b))
    }
}

/// Placement and width the flow pass assigns to a node.
struct Writeback {
    id: NodeId,
    offset: Option<Point>,
    width: Option<f64>,
}

/// Computes boxes from the store and the tuned constants.
pub struct LayoutEngine<M: TextMeasure = ApproxMeasure> {
    config: LayoutConfig,
    measure: M,
}

impl LayoutEngine<ApproxMeasure> {
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_measure(config, ApproxMeasure::default())
    }
}

impl Default for LayoutEngine<ApproxMeasure> {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

fn dy_or_last(node: &Node) -> f64 {
    node.placement()
        .and_then(Placement::offset)
        .map(|o| o.y)
        .unwrap_or(f64::INFINITY)
}

fn sort_by_offset(nodes: &mut [&Node]) {
    nodes.sort_by(|a, b| dy_or_last(a).total_cmp(&dy_or_last(b)));
}

impl<M: TextMeasure> LayoutEngine<M> {
    pub fn with_measure(config: LayoutConfig, measure: M) -> Self {
        LayoutEngine { config, measure }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Width a child label needs inside a container.
    pub fn label_width(&self, label: &str) -> f64 {
        self.config
            .min_label_width
            .max(self.measure.width(label, false) + self.config.label_pad)
    }

    /// Container width from its bold title and the labels it must fit.
    pub fn container_width<'a>(&self, title: &str, labels: impl IntoIterator<Item = &'a str>) -> f64 {
        let c = &self.config;
        let title_w = self.measure.width(title, true) + c.module_pad * 2.0;
        let child_w = labels
            .into_iter()
            .map(|l| self.label_width(l))
            .fold(c.min_label_width, f64::max);
        c.min_container_width.max(title_w).max(child_w + c.module_pad * 2.0)
    }

    pub fn collapsed_height(&self) -> f64 {
        self.config.module_head + self.config.module_pad * 2.0
    }

    pub fn class_height(&self, methods: usize) -> f64 {
        let c = &self.config;
        c.module_head + c.module_pad + methods as f64 * c.slot_stride() + c.module_pad
    }

    fn docked_methods<'a>(store: &'a GraphStore, class: &NodeId) -> Vec<&'a Node> {
        store
            .docked_children(class)
            .into_iter()
            .filter(|n| n.kind() == NodeKind::Func)
            .collect()
    }

    /// Width of a module: title, direct children and methods of docked classes.
    pub fn module_width(&self, store: &GraphStore, module: &Node) -> f64 {
        let kids = store.docked_children(&module.id);
        let mut labels: Vec<&str> = kids.iter().map(|k| k.label.as_str()).collect();
        for class in kids.iter().filter(|k| k.kind() == NodeKind::Class) {
            labels.extend(Self::docked_methods(store, &class.id).iter().map(|f| f.label.as_str()));
        }
        self.container_width(&module.label, labels)
    }

    /// Height the module needs when expanded.
    pub fn open_height(&self, store: &GraphStore, module: &NodeId) -> f64 {
        let c = &self.config;
        let body: f64 = store
            .docked_children(module)
            .iter()
            .map(|k| match k.kind() {
                NodeKind::Class => self.class_height(Self::docked_methods(store, &k.id).len()) + c.slot_gap,
                _ => c.slot_height + c.slot_gap,
            })
            .sum();
        c.module_head + c.module_pad + body + c.module_pad
    }

    /// Height the module occupies in its current state.
    pub fn module_height(&self, store: &GraphStore, module: &Node) -> f64 {
        if module.is_collapsed() {
            self.collapsed_height()
        } else {
            self.open_height(store, &module.id)
        }
    }

    /// Lay out without touching the store.
    pub fn measure(&self, store: &GraphStore) -> Layout {
        self.compute(store).0
    }

    /// Full layout pass. Writes assigned slot offsets and widths back to
    /// the store so the next pass keeps the same order.
    pub fn layout(&self, store: &mut GraphStore) -> Layout {
        let (layout, writes) = self.compute(store);
        for w in writes {
            let Some(node) = store.node_mut(&w.id) else {
                continue;
            };
            if let (Some(offset), Some(placement)) = (w.offset, node.placement_mut()) {
                if placement.is_docked() {
                    *placement = Placement::Docked {
                        offset: Some(offset),
                    };
                }
            }
            if let (Some(width), NodeBody::Func(f)) = (w.width, &mut node.body) {
                f.width = Some(width);
            }
        }
        layout
    }

    /// Methods stacked inside a class box.
    fn place_methods(&self, class_box: Rect, mut methods: Vec<&Node>, layout: &mut Layout, writes: &mut Vec<Writeback>) {
        let c = &self.config;
        sort_by_offset(&mut methods);
        let width = class_box.w - c.module_pad * 2.0;
        for (i, f) in methods.into_iter().enumerate() {
            let offset = Point::new(c.module_pad, c.module_head + c.module_pad + i as f64 * c.slot_stride());
            layout.funcs.insert(
                f.id.clone(),
                Rect::new(class_box.x + offset.x, class_box.y + offset.y, width, c.func_height),
            );
            writes.push(Writeback {
                id: f.id.clone(),
                offset: Some(offset),
                width: Some(width),
            });
        }
    }

    fn hide_subtree(store: &GraphStore, kids: &[&Node], layout: &mut Layout) {
        for k in kids {
            layout.hidden.insert(k.id.clone());
            if k.kind() == NodeKind::Class {
                for f in Self::docked_methods(store, &k.id) {
                    layout.hidden.insert(f.id.clone());
                }
            }
        }
    }

    fn compute(&self, store: &GraphStore) -> (Layout, Vec<Writeback>) {
        let c = &self.config;
        let mut layout = Layout::default();
        let mut writes = Vec::new();

        for module in store.nodes_of_kind(NodeKind::Module) {
            let Some(body) = module.as_module() else { continue };
            let origin = body.pos;
            let width = self.module_width(store, module);
            let mut kids = store.docked_children(&module.id);

            if body.collapsed {
                Self::hide_subtree(store, &kids, &mut layout);
                layout
                    .boxes
                    .insert(module.id.clone(), Rect::at(origin, width, self.collapsed_height()));
                continue;
            }

            let inner_w = width - c.module_pad * 2.0;
            sort_by_offset(&mut kids);
            let mut y = c.module_head + c.module_pad;
            for kid in kids {
                let offset = Point::new(c.module_pad, y);
                match kid.kind() {
                    NodeKind::Class => {
                        let methods = Self::docked_methods(store, &kid.id);
                        let class_box = Rect::new(origin.x + offset.x, origin.y + offset.y, inner_w, self.class_height(methods.len()));
                        layout.boxes.insert(kid.id.clone(), class_box);
                        self.place_methods(class_box, methods, &mut layout, &mut writes);
                        writes.push(Writeback {
                            id: kid.id.clone(),
                            offset: Some(offset),
                            width: None,
                        });
                        y += class_box.h + c.slot_gap;
                    }
                    _ => {
                        layout.funcs.insert(
                            kid.id.clone(),
                            Rect::new(origin.x + offset.x, origin.y + offset.y, inner_w, c.func_height),
                        );
                        writes.push(Writeback {
                            id: kid.id.clone(),
                            offset: Some(offset),
                            width: Some(inner_w),
                        });
                        y += c.slot_height + c.slot_gap;
                    }
                }
            }
            layout
                .boxes
                .insert(module.id.clone(), Rect::at(origin, width, y + c.module_pad));
        }

        for node in store.nodes() {
            if node.kind() == NodeKind::Module || store.is_docked(&node.id) {
                continue;
            }
            let pos = node
                .placement()
                .and_then(Placement::free_pos)
                .unwrap_or_default();
            match node.kind() {
                NodeKind::Class => {
                    let methods = Self::docked_methods(store, &node.id);
                    let width = self.container_width(&node.label, methods.iter().map(|f| f.label.as_str()));
                    let class_box = Rect::at(pos, width, self.class_height(methods.len()));
                    layout.boxes.insert(node.id.clone(), class_box);
                    self.place_methods(class_box, methods, &mut layout, &mut writes);
                }
                NodeKind::Func => {
                    // keeps the width it had while docked
                    let width = node
                        .func_width()
                        .unwrap_or_else(|| c.func_width.max(self.label_width(&node.label)));
                    layout.funcs.insert(node.id.clone(), Rect::at(pos, width, c.func_height));
                    writes.push(Writeback {
                        id: node.id.clone(),
                        offset: None,
                        width: Some(width),
                    });
                }
                NodeKind::Module => {}
            }
        }

        (layout, writes)
    }
}
