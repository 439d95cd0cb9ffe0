//! DepViz Layout — box geometry, edge routing, collision and arrangement

pub mod anchor;
pub mod arrange;
pub mod collision;
pub mod edges;
pub mod geometry;
pub mod layout;
pub mod scene;

#[cfg(test)]
pub mod tests;

#[cfg(test)]
pub mod test_utils;

pub use anchor::anchor_point;
pub use arrange::{ArrangeMode, arrange, plan, spawn_position};
pub use collision::{leaf_step, mtv, overlap_total, push_out, resolve_leaf};
pub use edges::{Arrow, CubicBezier, EdgePath, RoutedEdge, crosses_foreign_module, route_all, route_edge};
pub use geometry::Rect;
pub use layout::{Layout, LayoutEngine};
pub use scene::{DrawCommand, Emphasis, Focus, Layer, Scene, SceneItem, SceneOptions, node_at};
