//! Fixtures shared by the core tests

use crate::model::{Artifacts, Edge, NodeKind, NodeRecord};

pub fn module(id: &str, label: &str) -> NodeRecord {
    NodeRecord::new(id, NodeKind::Module, label)
}

pub fn class(id: &str, parent: &str) -> NodeRecord {
    NodeRecord::new(id, NodeKind::Class, format!("class {}", id)).with_parent(parent)
}

pub fn func(id: &str, parent: &str) -> NodeRecord {
    NodeRecord::new(id, NodeKind::Func, format!("{}()", id)).with_parent(parent)
}

/// Module `M` holding function `F` and class `K` (method `G`), plus a
/// second module `N` with function `H` that calls into `M`.
pub fn two_modules() -> Artifacts {
    Artifacts {
        nodes: vec![
            module("M", "src/m.py"),
            func("F", "M"),
            class("K", "M"),
            func("G", "K"),
            module("N", "src/n.py"),
            func("H", "N"),
        ],
        edges: vec![
            Edge::import("N", "M"),
            Edge::call("H", "F"),
            Edge::call("H", "G"),
            Edge::call("F", "G"),
        ],
    }
}

/// `A --call--> B --call--> C`, all in one module.
pub fn call_chain() -> Artifacts {
    Artifacts {
        nodes: vec![
            module("M", "src/chain.py"),
            func("A", "M"),
            func("B", "M"),
            func("C", "M"),
        ],
        edges: vec![Edge::call("A", "B"), Edge::call("B", "C")],
    }
}
