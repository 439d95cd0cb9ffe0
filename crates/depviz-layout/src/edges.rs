//! Edge curves, mid-curve arrows and occlusion layering

use crate::anchor::anchor_point;
use crate::geometry::Rect;
use crate::layout::Layout;
use depviz_core::{Edge, EdgeKey, GraphStore, LayoutConfig, NodeKind, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A cubic Bézier segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
}

impl CubicBezier {
    /// Horizontal "S" elbow: both controls at the mid x, each sharing its
    /// endpoint's y.
    pub fn elbow(start: Point, end: Point) -> Self {
        let mid_x = (start.x + end.x) / 2.0;
        CubicBezier {
            start,
            control1: Point::new(mid_x, start.y),
            control2: Point::new(mid_x, end.y),
            end,
        }
    }

    /// Sample the curve at parameter t in [0, 1].
    pub fn sample(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * self.start.x + b * self.control1.x + c * self.control2.x + d * self.end.x,
            a * self.start.y + b * self.control1.y + c * self.control2.y + d * self.end.y,
        )
    }

    /// First derivative at t.
    pub fn derivative(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = 3.0 * mt * mt;
        let b = 6.0 * mt * t;
        let c = 3.0 * t * t;
        Point::new(
            a * (self.control1.x - self.start.x) + b * (self.control2.x - self.control1.x) + c * (self.end.x - self.control2.x),
            a * (self.control1.y - self.start.y) + b * (self.control2.y - self.control1.y) + c * (self.end.y - self.control2.y),
        )
    }

    /// Hull of the control polygon; exact for elbows.
    pub fn bounds(&self) -> Rect {
        Rect::spanning(self.start, self.end)
            .union(&Rect::spanning(self.control1, self.control2))
    }

    /// SVG path data.
    pub fn to_path_data(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x, self.start.y, self.control1.x, self.control1.y, self.control2.x, self.control2.y, self.end.x, self.end.y
        )
    }
}

/// Arrow glyph placement: position and rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub at: Point,
    pub angle: f64,
}

impl Arrow {
    pub fn on(curve: &CubicBezier, t: f64) -> Self {
        let d = curve.derivative(t);
        Arrow {
            at: curve.sample(t),
            angle: d.y.atan2(d.x).to_degrees(),
        }
    }
}

/// The drawable shape of one edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum EdgePath {
    /// Coincident or missing anchors: an empty path.
    Hidden,
    Curve {
        curve: CubicBezier,
        arrow: Option<Arrow>,
    },
}

impl EdgePath {
    pub fn between(p1: Point, p2: Point, directed: bool, epsilon: f64) -> Self {
        if (p1.x - p2.x).abs() < epsilon && (p1.y - p2.y).abs() < epsilon {
            return EdgePath::Hidden;
        }
        let curve = CubicBezier::elbow(p1, p2);
        EdgePath::Curve {
            curve,
            arrow: directed.then(|| Arrow::on(&curve, 0.5)),
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, EdgePath::Hidden)
    }

    pub fn bounds(&self) -> Option<Rect> {
        match self {
            EdgePath::Hidden => None,
            EdgePath::Curve { curve, .. } => Some(curve.bounds()),
        }
    }
}

/// An edge with its current geometry and layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedEdge {
    pub edge: Edge,
    pub path: EdgePath,
    /// Drawn beneath expanded modules.
    pub behind: bool,
    /// Import whose target is not in the store.
    pub unresolved: bool,
}

/// Does the curve cross an expanded module that owns neither endpoint?
pub fn crosses_foreign_module(store: &GraphStore, layout: &Layout, edge: &Edge, bounds: &Rect) -> bool {
    let from_home = store.home_module(&edge.from);
    let to_home = store.home_module(&edge.to);
    store
        .nodes_of_kind(NodeKind::Module)
        .filter(|m| !m.is_collapsed())
        .filter(|m| Some(&m.id) != from_home.as_ref() && Some(&m.id) != to_home.as_ref())
        .filter_map(|m| layout.box_of(&m.id))
        .any(|b| bounds.intersects(&b))
}

/// Compute the path and layer for one edge.
pub fn route_edge(store: &GraphStore, layout: &Layout, config: &LayoutConfig, edge: &Edge) -> RoutedEdge {
    let unresolved = store.is_dangling(edge);
    let anchors = (
        anchor_point(store, layout, &edge.from),
        anchor_point(store, layout, &edge.to),
    );
    let path = match anchors {
        (Some(p1), Some(p2)) => EdgePath::between(p1, p2, edge.kind.is_directed(), config.anchor_epsilon),
        _ => EdgePath::Hidden,
    };
    let behind = path
        .bounds()
        .is_some_and(|b| crosses_foreign_module(store, layout, edge, &b));
    RoutedEdge {
        edge: edge.clone(),
        path,
        behind,
        unresolved,
    }
}

/// Route every edge in the store, keyed by identity.
pub fn route_all(store: &GraphStore, layout: &Layout, config: &LayoutConfig) -> HashMap<EdgeKey, RoutedEdge> {
    store
        .edges()
        .map(|e| (e.key(), route_edge(store, layout, config, &e)))
        .collect()
}
