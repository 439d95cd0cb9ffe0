//! DepViz Core — node/edge model, graph store, impact slice and view state

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod slice;
pub mod snapshot;


#[cfg(test)]
pub mod test_utils;

pub use config::{ApproxMeasure, LayoutConfig, TextMeasure};
pub use error::{DepvizError, Result};
pub use graph::{EdgeInsert, GraphStore, MergeReport};
pub use model::{
    Artifacts, ClassBody, Edge, EdgeKey, EdgeKind, FuncBody, ModuleBody, Node, NodeBody, NodeId,
    NodeKind, NodeRecord, Placement, Point, SourceRange, TypeVisibility, fnv1a_hex,
};
pub use slice::{Direction, ImpactSummary, Slice, SliceCounts, impact_slice, summarize};
pub use snapshot::{SNAPSHOT_VERSION, Snapshot, ViewState};
