//! Core data structures for the dependency diagram

use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-bit FNV-1a over UTF-16 code units, rendered as lowercase hex.
///
/// Matches the identity scheme used by the import collaborator, so ids derived
/// here line up with ids already present in saved graphs.
pub fn fnv1a_hex(source: &str) -> String {
    let mut h: u32 = 2_166_136_261;
    for unit in source.encode_utf16() {
        h ^= unit as u32;
        h = h.wrapping_mul(16_777_619);
    }
    format!("{:x}", h)
}

/// Stable, content-derived identifier for a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Id of the module for a workspace-relative file label.
    pub fn module(file_label: &str) -> Self {
        NodeId(format!("mod_{}", fnv1a_hex(&file_label.replace('\\', "/"))))
    }

    pub fn class(file_label: &str, name: &str) -> Self {
        NodeId(format!("cls_{}", fnv1a_hex(&format!("{}:{}", file_label, name))))
    }

    pub fn func(file_label: &str, name: &str, line: u32) -> Self {
        NodeId(format!("fn_{}", fnv1a_hex(&format!("{}:{}:{}", file_label, name, line))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminates what kind of code artifact a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Module,
    Class,
    Func,
}

impl NodeKind {
    /// Modules and classes own a box in the layout.
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Module | NodeKind::Class)
    }
}

/// What kind of relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Import,
    Call,
}

impl EdgeKind {
    /// Directed kinds carry a mid-curve arrow glyph.
    pub fn is_directed(self) -> bool {
        matches!(self, EdgeKind::Call)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Import => "import",
            EdgeKind::Call => "call",
        }
    }
}

/// A directed edge. Identity is the `(from, to, type)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, kind: EdgeKind) -> Self {
        Edge {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }

    pub fn call(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self::new(from, to, EdgeKind::Call)
    }

    pub fn import(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self::new(from, to, EdgeKind::Import)
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey(format!("{}->{}:{}", self.from, self.to, self.kind.as_str()))
    }

    pub fn touches(&self, id: &NodeId) -> bool {
        &self.from == id || &self.to == id
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// Wire form of an edge identity: `from->to:type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeKey(pub String);

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// World-space point (or offset).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub line: u32,
    pub col: u32,
}

/// Which edge kinds are currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeVisibility {
    pub import: bool,
    pub call: bool,
}

impl Default for TypeVisibility {
    fn default() -> Self {
        TypeVisibility {
            import: true,
            call: true,
        }
    }
}

impl TypeVisibility {
    pub fn is_visible(&self, kind: EdgeKind) -> bool {
        match kind {
            EdgeKind::Import => self.import,
            EdgeKind::Call => self.call,
        }
    }

    pub fn toggle(&mut self, kind: EdgeKind) {
        match kind {
            EdgeKind::Import => self.import = !self.import,
            EdgeKind::Call => self.call = !self.call,
        }
    }
}

/// Where a class or function sits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Owned by the parent container; `offset` is relative to the parent box
    /// and absent until the first layout pass assigns a slot.
    Docked { offset: Option<Point> },
    /// Owned by nobody, absolute world position.
    Free { pos: Point },
}

impl Placement {
    pub fn is_docked(&self) -> bool {
        matches!(self, Placement::Docked { .. })
    }

    pub fn offset(&self) -> Option<Point> {
        match self {
            Placement::Docked { offset } => *offset,
            Placement::Free { .. } => None,
        }
    }

    pub fn free_pos(&self) -> Option<Point> {
        match self {
            Placement::Free { pos } => Some(*pos),
            Placement::Docked { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleBody {
    pub pos: Point,
    pub collapsed: bool,
    /// Full source text, consulted only by import re-scanning.
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassBody {
    pub parent: Option<NodeId>,
    pub placement: Placement,
    /// Absolute `x,y` the host sent alongside a docked placement.
    pub reported_pos: Option<Point>,
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncBody {
    pub parent: Option<NodeId>,
    pub placement: Placement,
    /// Absolute `x,y` the host sent alongside a docked placement.
    pub reported_pos: Option<Point>,
    pub snippet: Option<String>,
    /// Rendered width cached by the last layout pass.
    pub width: Option<f64>,
}

/// Kind-specific part of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Module(ModuleBody),
    Class(ClassBody),
    Func(FuncBody),
}

/// A single node in the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NodeRecord", into = "NodeRecord")]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub fs_path: Option<String>,
    pub range: Option<SourceRange>,
    pub body: NodeBody,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::Module(_) => NodeKind::Module,
            NodeBody::Class(_) => NodeKind::Class,
            NodeBody::Func(_) => NodeKind::Func,
        }
    }

    pub fn parent(&self) -> Option<&NodeId> {
        match &self.body {
            NodeBody::Module(_) => None,
            NodeBody::Class(c) => c.parent.as_ref(),
            NodeBody::Func(f) => f.parent.as_ref(),
        }
    }

    pub fn parent_mut(&mut self) -> Option<&mut Option<NodeId>> {
        match &mut self.body {
            NodeBody::Module(_) => None,
            NodeBody::Class(c) => Some(&mut c.parent),
            NodeBody::Func(f) => Some(&mut f.parent),
        }
    }

    pub fn placement(&self) -> Option<&Placement> {
        match &self.body {
            NodeBody::Module(_) => None,
            NodeBody::Class(c) => Some(&c.placement),
            NodeBody::Func(f) => Some(&f.placement),
        }
    }

    pub fn placement_mut(&mut self) -> Option<&mut Placement> {
        match &mut self.body {
            NodeBody::Module(_) => None,
            NodeBody::Class(c) => Some(&mut c.placement),
            NodeBody::Func(f) => Some(&mut f.placement),
        }
    }

    /// Host-reported absolute position of a docked class or function.
    pub fn reported_pos(&self) -> Option<Point> {
        match &self.body {
            NodeBody::Module(_) => None,
            NodeBody::Class(c) => c.reported_pos,
            NodeBody::Func(f) => f.reported_pos,
        }
    }

    /// Raw dock flag; see `GraphStore::is_docked` for the effective state.
    pub fn is_docked(&self) -> bool {
        self.placement().is_some_and(Placement::is_docked)
    }

    pub fn as_module(&self) -> Option<&ModuleBody> {
        match &self.body {
            NodeBody::Module(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_module_mut(&mut self) -> Option<&mut ModuleBody> {
        match &mut self.body {
            NodeBody::Module(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.as_module().is_some_and(|m| m.collapsed)
    }

    pub fn snippet(&self) -> Option<&str> {
        match &self.body {
            NodeBody::Module(_) => None,
            NodeBody::Class(c) => c.snippet.as_deref(),
            NodeBody::Func(f) => f.snippet.as_deref(),
        }
    }

    pub fn func_width(&self) -> Option<f64> {
        match &self.body {
            NodeBody::Func(f) => f.width,
            _ => None,
        }
    }

    /// Label with decorations (`class `, `def `, trailing call parens) removed.
    pub fn bare_name(&self) -> &str {
        let mut s = self.label.trim();
        for prefix in ["class ", "def ", "function "] {
            if let Some(rest) = s.strip_prefix(prefix) {
                s = rest.trim_start();
            }
        }
        match s.find(['(', ':']) {
            Some(i) => s[..i].trim_end(),
            None => s,
        }
    }
}

/// Loose wire record for a node as supplied by collaborators.
///
/// Every field besides `id` and `kind` is optional so that merges can tell
/// "not provided" apart from "provided".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dy: Option<f64>,
    #[serde(default, rename = "_w", skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
}

impl NodeRecord {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, label: impl Into<String>) -> Self {
        NodeRecord {
            id: id.into(),
            kind,
            label: label.into(),
            parent: None,
            docked: None,
            collapsed: None,
            x: None,
            y: None,
            dx: None,
            dy: None,
            width: None,
            source: None,
            snippet: None,
            fs_path: None,
            range: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn has_position(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    /// Field-wise merge: `incoming` wins wherever it provides a value.
    pub fn overlay(self, incoming: NodeRecord) -> NodeRecord {
        NodeRecord {
            id: incoming.id,
            kind: incoming.kind,
            label: if incoming.label.is_empty() {
                self.label
            } else {
                incoming.label
            },
            parent: incoming.parent.or(self.parent),
            docked: incoming.docked.or(self.docked),
            collapsed: incoming.collapsed.or(self.collapsed),
            x: incoming.x.or(self.x),
            y: incoming.y.or(self.y),
            dx: incoming.dx.or(self.dx),
            dy: incoming.dy.or(self.dy),
            width: incoming.width.or(self.width),
            source: incoming.source.or(self.source),
            snippet: incoming.snippet.or(self.snippet),
            fs_path: incoming.fs_path.or(self.fs_path),
            range: incoming.range.or(self.range),
        }
    }

    fn reported_pos(&self) -> Option<Point> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }

    fn placement(&self) -> Placement {
        // docked defaults to true; without a parent there is nothing to dock to
        if self.docked.unwrap_or(true) && self.parent.is_some() {
            let offset = match (self.dx, self.dy) {
                (Some(dx), Some(dy)) => Some(Point::new(dx, dy)),
                _ => None,
            };
            Placement::Docked { offset }
        } else {
            Placement::Free {
                pos: Point::new(self.x.unwrap_or(0.0), self.y.unwrap_or(0.0)),
            }
        }
    }
}

impl From<NodeRecord> for Node {
    fn from(r: NodeRecord) -> Self {
        let body = match r.kind {
            NodeKind::Module => NodeBody::Module(ModuleBody {
                pos: Point::new(r.x.unwrap_or(0.0), r.y.unwrap_or(0.0)),
                collapsed: r.collapsed.unwrap_or(true),
                source: r.source.clone(),
            }),
            NodeKind::Class => NodeBody::Class(ClassBody {
                parent: r.parent.clone(),
                placement: r.placement(),
                reported_pos: r.reported_pos(),
                snippet: r.snippet.clone(),
            }),
            NodeKind::Func => NodeBody::Func(FuncBody {
                parent: r.parent.clone(),
                placement: r.placement(),
                reported_pos: r.reported_pos(),
                snippet: r.snippet.clone(),
                width: r.width,
            }),
        };
        Node {
            id: r.id,
            label: r.label,
            fs_path: r.fs_path,
            range: r.range,
            body,
        }
    }
}

impl From<Node> for NodeRecord {
    fn from(n: Node) -> Self {
        let mut r = NodeRecord::new(n.id, NodeKind::Module, n.label);
        r.fs_path = n.fs_path;
        r.range = n.range;
        let (parent, placement, reported_pos) = match n.body {
            NodeBody::Module(m) => {
                r.x = Some(m.pos.x);
                r.y = Some(m.pos.y);
                r.collapsed = Some(m.collapsed);
                r.source = m.source;
                return r;
            }
            NodeBody::Class(c) => {
                r.kind = NodeKind::Class;
                r.snippet = c.snippet;
                (c.parent, c.placement, c.reported_pos)
            }
            NodeBody::Func(f) => {
                r.kind = NodeKind::Func;
                r.snippet = f.snippet;
                r.width = f.width;
                (f.parent, f.placement, f.reported_pos)
            }
        };
        r.parent = parent;
        match placement {
            Placement::Docked { offset } => {
                r.docked = Some(true);
                if let Some(o) = offset {
                    r.dx = Some(o.x);
                    r.dy = Some(o.y);
                }
                if let Some(p) = reported_pos {
                    r.x = Some(p.x);
                    r.y = Some(p.y);
                }
            }
            Placement::Free { pos } => {
                r.docked = Some(false);
                r.x = Some(pos.x);
                r.y = Some(pos.y);
            }
        }
        r
    }
}

/// A batch of nodes and edges from the import collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Artifacts {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<Edge>,
}
