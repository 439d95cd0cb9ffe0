//! Layered draw list regenerated from the store and the box table

use crate::edges::{CubicBezier, EdgePath, RoutedEdge};
use crate::geometry::Rect;
use crate::layout::Layout;
use depviz_core::{EdgeKey, EdgeKind, GraphStore, Node, NodeId, NodeKind, Point, Slice, TypeVisibility};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

/// Z-order bands, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    EdgesBack,
    Modules,
    ClassesDocked,
    ClassesFree,
    EdgesFront,
    ModulesCollapsed,
    FuncsDocked,
    FuncsFree,
}

/// How strongly an element is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Emphasis {
    #[default]
    Normal,
    /// Part of the active impact slice.
    Related,
    /// Outside the active slice.
    Dimmed,
    /// Filtered out (edge type toggled off, or not incident to the focus).
    Hidden,
}

/// Edge focus: only edges touching the focus stay visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Focus {
    Node(NodeId),
    /// A module and its direct children.
    Module(NodeId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DrawCommand {
    Container {
        id: NodeId,
        kind: NodeKind,
        rect: Rect,
        label: String,
        collapsed: bool,
        emphasis: Emphasis,
    },
    Func {
        id: NodeId,
        rect: Rect,
        label: String,
        docked: bool,
        emphasis: Emphasis,
    },
    Edge {
        key: EdgeKey,
        kind: EdgeKind,
        curve: Option<CubicBezier>,
        unresolved: bool,
        emphasis: Emphasis,
    },
    Arrow {
        key: EdgeKey,
        kind: EdgeKind,
        at: Point,
        angle: f64,
        emphasis: Emphasis,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneItem {
    pub layer: Layer,
    pub command: DrawCommand,
}

/// Inputs that affect emphasis but not geometry.
#[derive(Debug, Clone, Default)]
pub struct SceneOptions<'a> {
    pub visibility: TypeVisibility,
    pub slice: Option<&'a Slice>,
    pub focus: Option<&'a Focus>,
    /// Focus dimming is suspended while a search is active.
    pub searching: bool,
}

/// The full draw list, sorted by layer (stable within a layer).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub items: Vec<SceneItem>,
}

fn node_emphasis(slice: Option<&Slice>, id: &NodeId) -> Emphasis {
    match slice {
        Some(s) if !s.is_empty() => {
            if s.contains_node(id) {
                Emphasis::Related
            } else {
                Emphasis::Dimmed
            }
        }
        _ => Emphasis::Normal,
    }
}

impl Scene {
    pub fn build(
        store: &GraphStore,
        layout: &Layout,
        routes: &HashMap<EdgeKey, RoutedEdge>,
        options: &SceneOptions<'_>,
    ) -> Scene {
        let mut items = Vec::new();
        let slice = options.slice;

        for node in store.nodes() {
            if layout.is_hidden(&node.id) {
                continue;
            }
            let emphasis = node_emphasis(slice, &node.id);
            match node.kind() {
                NodeKind::Module | NodeKind::Class => {
                    let Some(rect) = layout.box_of(&node.id) else { continue };
                    let collapsed = node.is_collapsed();
                    let layer = match node.kind() {
                        NodeKind::Module if collapsed => Layer::ModulesCollapsed,
                        NodeKind::Module => Layer::Modules,
                        _ if store.is_docked(&node.id) => Layer::ClassesDocked,
                        _ => Layer::ClassesFree,
                    };
                    items.push(SceneItem {
                        layer,
                        command: DrawCommand::Container {
                            id: node.id.clone(),
                            kind: node.kind(),
                            rect,
                            label: node.label.clone(),
                            collapsed,
                            emphasis,
                        },
                    });
                }
                NodeKind::Func => {
                    let Some(rect) = layout.func_rect(&node.id) else { continue };
                    let docked = store.is_docked(&node.id);
                    items.push(SceneItem {
                        layer: if docked { Layer::FuncsDocked } else { Layer::FuncsFree },
                        command: DrawCommand::Func {
                            id: node.id.clone(),
                            rect,
                            label: node.label.clone(),
                            docked,
                            emphasis,
                        },
                    });
                }
            }
        }

        let incident = focus_set(store, options);
        for edge in store.edges() {
            let key = edge.key();
            let Some(routed) = routes.get(&key) else { continue };
            let emphasis = if !options.visibility.is_visible(edge.kind) {
                Emphasis::Hidden
            } else if incident
                .as_ref()
                .is_some_and(|ids| !ids.contains(&edge.from) && !ids.contains(&edge.to))
            {
                Emphasis::Hidden
            } else {
                match slice {
                    Some(s) if !s.is_empty() => {
                        if s.contains_edge(&key) {
                            Emphasis::Related
                        } else {
                            Emphasis::Dimmed
                        }
                    }
                    _ => Emphasis::Normal,
                }
            };
            let layer = if routed.behind { Layer::EdgesBack } else { Layer::EdgesFront };
            let (curve, arrow) = match routed.path {
                EdgePath::Hidden => (None, None),
                EdgePath::Curve { curve, arrow } => (Some(curve), arrow),
            };
            items.push(SceneItem {
                layer,
                command: DrawCommand::Edge {
                    key: key.clone(),
                    kind: edge.kind,
                    curve,
                    unresolved: routed.unresolved,
                    emphasis,
                },
            });
            if let Some(arrow) = arrow {
                items.push(SceneItem {
                    layer,
                    command: DrawCommand::Arrow {
                        key,
                        kind: edge.kind,
                        at: arrow.at,
                        angle: arrow.angle,
                        emphasis,
                    },
                });
            }
        }

        items.sort_by_key(|item| item.layer);
        Scene { items }
    }

    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCommand> {
        self.items
            .iter()
            .filter(move |i| i.layer == layer)
            .map(|i| &i.command)
    }

    /// Layer of the draw command for a node id or edge key.
    pub fn layer_of(&self, key: &str) -> Option<Layer> {
        self.items
            .iter()
            .find(|i| match &i.command {
                DrawCommand::Container { id, .. } | DrawCommand::Func { id, .. } => id.as_str() == key,
                DrawCommand::Edge { key: k, .. } => k.0 == key,
                DrawCommand::Arrow { .. } => false,
            })
            .map(|i| i.layer)
    }

    /// JSON form of the draw list sent to the front end.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Standalone SVG document of the scene.
    pub fn to_svg(&self, extent: Option<Rect>) -> String {
        let view = extent.unwrap_or_default().inflate(40.0);
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}" width="{}" height="{}">"#,
            view.x, view.y, view.w, view.h, view.w, view.h
        );
        for item in &self.items {
            write_command(&mut out, &item.command);
        }
        out.push_str("</svg>\n");
        out
    }
}

fn focus_set(store: &GraphStore, options: &SceneOptions<'_>) -> Option<HashSet<NodeId>> {
    if options.searching {
        return None;
    }
    match options.focus? {
        Focus::Node(id) => Some(HashSet::from([id.clone()])),
        Focus::Module(id) => {
            let mut ids: HashSet<NodeId> = store.children_of(id).into_iter().collect();
            ids.insert(id.clone());
            Some(ids)
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn opacity(emphasis: Emphasis) -> f64 {
    match emphasis {
        Emphasis::Normal | Emphasis::Related => 1.0,
        Emphasis::Dimmed => 0.2,
        Emphasis::Hidden => 0.0,
    }
}

fn write_command(out: &mut String, command: &DrawCommand) {
    match command {
        DrawCommand::Container { id, kind, rect, label, emphasis, .. } => {
            let class = if *kind == NodeKind::Class { "class" } else { "module" };
            let _ = writeln!(
                out,
                r#"  <g data-id="{}" transform="translate({}, {})" opacity="{}"><rect class="{}" width="{}" height="{}"/><text x="10" y="16">{}</text></g>"#,
                escape(id.as_str()), rect.x, rect.y, opacity(*emphasis), class, rect.w, rect.h, escape(label)
            );
        }
        DrawCommand::Func { id, rect, label, emphasis, .. } => {
            let _ = writeln!(
                out,
                r#"  <g data-id="{}" transform="translate({}, {})" opacity="{}"><rect class="func" width="{}" height="{}"/><text x="10" y="16">{}</text></g>"#,
                escape(id.as_str()), rect.x, rect.y, opacity(*emphasis), rect.w, rect.h, escape(label)
            );
        }
        DrawCommand::Edge { kind, curve, unresolved, emphasis, .. } => {
            let d = curve.map(|c| c.to_path_data()).unwrap_or_default();
            let extra = if *unresolved { " unresolved" } else { "" };
            let _ = writeln!(
                out,
                r#"  <path class="edge {}{}" d="{}" fill="none" opacity="{}"/>"#,
                kind.as_str(), extra, d, opacity(*emphasis)
            );
        }
        DrawCommand::Arrow { kind, at, angle, emphasis, .. } => {
            let _ = writeln!(
                out,
                r#"  <path class="edge-arrow {}" d="M -6 -3 L 0 0 L -6 3 z" transform="translate({}, {}) rotate({})" opacity="{}"/>"#,
                kind.as_str(), at.x, at.y, angle, opacity(*emphasis)
            );
        }
    }
}

/// Convenience for hit-testing the topmost node under a point.
pub fn node_at<'a>(store: &'a GraphStore, layout: &Layout, p: Point) -> Option<&'a Node> {
    let mut best: Option<(&Node, f64)> = None;
    for node in store.nodes() {
        if layout.is_hidden(&node.id) {
            continue;
        }
        let Some(rect) = layout.rect_of(&node.id) else { continue };
        if !rect.contains(p, 0.0) {
            continue;
        }
        // functions sit above containers; among containers the smallest wins
        let score = if node.kind() == NodeKind::Func { 0.0 } else { rect.area().max(f64::MIN_POSITIVE) };
        if best.is_none_or(|(_, s)| score < s) {
            best = Some((node, score));
        }
    }
    best.map(|(n, _)| n)
}
