//! Fixtures for layout tests

use depviz_core::{Artifacts, Edge, GraphStore, NodeKind, NodeRecord};

pub fn open_module(id: &str, label: &str, x: f64, y: f64) -> NodeRecord {
    let mut m = NodeRecord::new(id, NodeKind::Module, label).at(x, y);
    m.collapsed = Some(false);
    m
}

pub fn class(id: &str, parent: &str) -> NodeRecord {
    NodeRecord::new(id, NodeKind::Class, format!("class {}", id)).with_parent(parent)
}

pub fn func(id: &str, parent: &str) -> NodeRecord {
    NodeRecord::new(id, NodeKind::Func, format!("def {}()", id)).with_parent(parent)
}

pub fn free_func(id: &str, parent: &str, x: f64, y: f64) -> NodeRecord {
    let mut f = func(id, parent).at(x, y);
    f.docked = Some(false);
    f
}

/// `M` at the origin holding `F` and `K{G}`; `N` far to the right holding `H`.
pub fn two_open_modules() -> GraphStore {
    GraphStore::from_artifacts(Artifacts {
        nodes: vec![
            open_module("M", "src/m.py", 0.0, 0.0),
            func("F", "M"),
            class("K", "M"),
            func("G", "K"),
            open_module("N", "src/n.py", 600.0, 0.0),
            func("H", "N"),
        ],
        edges: vec![Edge::import("N", "M"), Edge::call("H", "F"), Edge::call("H", "G")],
    })
}

/// Modules spread over three folder depths.
pub fn folder_tree() -> GraphStore {
    let mut nodes = Vec::new();
    for (id, path) in [
        ("a", "main.py"),
        ("b", "pkg/util.py"),
        ("c", "pkg/core.py"),
        ("d", "pkg/sub/deep.py"),
        ("e", "setup.py"),
    ] {
        let mut m = open_module(id, path, 0.0, 0.0);
        m.fs_path = Some(path.to_string());
        nodes.push(m);
    }
    nodes.push(func("f1", "b"));
    nodes.push(func("f2", "b"));
    nodes.push(func("f3", "d"));
    GraphStore::from_artifacts(Artifacts { nodes, edges: vec![] })
}
