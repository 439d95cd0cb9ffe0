//! Batch placement of module containers

use crate::layout::LayoutEngine;
use depviz_core::{GraphStore, NodeId, NodeKind, Point, TextMeasure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrangeMode {
    /// Columns by path depth.
    #[default]
    ByFolder,
    /// Rows dealt round-robin by height.
    Balanced,
}

struct Sized {
    id: NodeId,
    label: String,
    w: f64,
    h: f64,
}

fn folder_depth(path: &str) -> usize {
    path.split(['/', '\\']).count().saturating_sub(1)
}

fn sized_modules<M: TextMeasure>(store: &GraphStore, engine: &LayoutEngine<M>) -> Vec<Sized> {
    store
        .nodes_of_kind(NodeKind::Module)
        .map(|m| Sized {
            id: m.id.clone(),
            label: m.label.clone(),
            w: engine.module_width(store, m),
            h: engine.open_height(store, &m.id),
        })
        .collect()
}

/// Compute positions for every module without touching the store.
pub fn plan<M: TextMeasure>(store: &GraphStore, engine: &LayoutEngine<M>, mode: ArrangeMode) -> Vec<(NodeId, Point)> {
    let c = engine.config();
    let mut modules = sized_modules(store, engine);
    let mut out = Vec::with_capacity(modules.len());

    match mode {
        ArrangeMode::ByFolder => {
            let mut buckets: BTreeMap<usize, Vec<Sized>> = BTreeMap::new();
            for m in modules {
                buckets.entry(folder_depth(&m.label)).or_default().push(m);
            }
            for (depth, mut bucket) in buckets {
                bucket.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
                let x = depth as f64 * (c.arrange_column_width + c.arrange_gap_x);
                let mut y = 0.0;
                for m in bucket {
                    out.push((m.id, Point::new(x, y)));
                    y += m.h + c.arrange_gap_y;
                }
            }
        }
        ArrangeMode::Balanced => {
            if modules.is_empty() {
                return out;
            }
            modules.sort_by(|a, b| b.h.total_cmp(&a.h).then_with(|| a.id.cmp(&b.id)));
            let rows_n = ((modules.len() as f64).sqrt().round() as usize).max(1);
            let mut rows: Vec<Vec<Sized>> = (0..rows_n).map(|_| Vec::new()).collect();
            for (i, m) in modules.into_iter().enumerate() {
                rows[i % rows_n].push(m);
            }
            let mut y = 0.0;
            for row in rows {
                let mut x = 0.0;
                let mut tallest: f64 = 0.0;
                for m in row {
                    out.push((m.id, Point::new(x, y)));
                    x += c.arrange_column_width.max(m.w) + c.arrange_gap_x;
                    tallest = tallest.max(m.h);
                }
                y += tallest + c.arrange_gap_y;
            }
        }
    }
    out
}

/// Reposition every module. Docked children follow since their offsets
/// are relative. Returns the number of modules placed.
pub fn arrange<M: TextMeasure>(store: &mut GraphStore, engine: &LayoutEngine<M>, mode: ArrangeMode) -> usize {
    let placed = plan(store, engine, mode);
    let count = placed.len();
    for (id, pos) in placed {
        if let Some(m) = store.node_mut(&id).and_then(|n| n.as_module_mut()) {
            m.pos = pos;
        }
    }
    debug!("arranged {} modules ({:?})", count, mode);
    count
}

/// Slot `k` of the triangular fan used for modules that arrive without a
/// position: row `r` holds `r + 1` slots, walking down-left.
pub fn spawn_position(origin: Point, k: usize, spacing_x: f64, spacing_y: f64) -> Point {
    let row = ((-1.0 + (1.0 + 8.0 * k as f64).sqrt()) / 2.0).floor() as usize;
    let col = k - row * (row + 1) / 2;
    Point::new(
        origin.x + (row as f64 - col as f64) * spacing_x,
        origin.y + col as f64 * spacing_y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_counts_separators() {
        assert_eq!(folder_depth("a.ts"), 0);
        assert_eq!(folder_depth("src/a.ts"), 1);
        assert_eq!(folder_depth("src\\lib\\a.py"), 2);
    }

    #[test]
    fn spawn_fan_is_triangular() {
        let o = Point::new(0.0, 0.0);
        assert_eq!(spawn_position(o, 0, 320.0, 220.0), Point::new(0.0, 0.0));
        assert_eq!(spawn_position(o, 1, 320.0, 220.0), Point::new(320.0, 0.0));
        assert_eq!(spawn_position(o, 2, 320.0, 220.0), Point::new(0.0, 220.0));
        assert_eq!(spawn_position(o, 3, 320.0, 220.0), Point::new(640.0, 0.0));
        assert_eq!(spawn_position(o, 5, 320.0, 220.0), Point::new(0.0, 440.0));
    }
}
