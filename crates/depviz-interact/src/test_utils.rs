//! Session fixtures

use crate::session::Session;
use depviz_core::{Artifacts, Edge, NodeId, NodeKind, NodeRecord, Point, SourceRange};

pub fn open_module(id: &str, path: &str, x: f64, y: f64) -> NodeRecord {
    let mut m = NodeRecord::new(id, NodeKind::Module, path).at(x, y);
    m.collapsed = Some(false);
    m.fs_path = Some(path.to_string());
    m
}

pub fn class(id: &str, parent: &str) -> NodeRecord {
    NodeRecord::new(id, NodeKind::Class, format!("class {}", id)).with_parent(parent)
}

pub fn func(id: &str, parent: &str, path: &str) -> NodeRecord {
    let mut f = NodeRecord::new(id, NodeKind::Func, format!("def {}()", id)).with_parent(parent);
    f.fs_path = Some(path.to_string());
    f.range = Some(SourceRange { line: 3, col: 4 });
    f
}

/// `M` at the origin with `F` and `K{G}`; `N` to the right with `H`.
///
/// Boxes after the first layout: M (0,0,220,220), F (10,38,200,42),
/// K (10,96,200,106), G (20,134,180,42), N (600,0,220,106), H (610,38,200,42).
pub fn two_modules() -> Artifacts {
    Artifacts {
        nodes: vec![
            open_module("M", "src/m.py", 0.0, 0.0),
            func("F", "M", "src/m.py"),
            class("K", "M"),
            func("G", "K", "src/m.py"),
            open_module("N", "src/n.py", 600.0, 0.0),
            func("H", "N", "src/n.py"),
        ],
        edges: vec![Edge::import("N", "M"), Edge::call("H", "F"), Edge::call("H", "G")],
    }
}

pub fn session() -> Session {
    let mut s = Session::default();
    s.merge(two_modules());
    s.drain_events();
    s
}

pub fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

pub fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

/// Press, move once, run a frame, release.
pub fn drag(session: &mut Session, from: Point, to: Point) {
    session.pointer_down(from);
    session.pointer_move(to);
    session.frame();
    session.pointer_up(to);
}
