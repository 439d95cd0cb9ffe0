//! Overlap resolution for dragged boxes

use crate::geometry::Rect;
use depviz_core::{LayoutConfig, Point};

/// Minimum translation that separates `a` from `b`, pushing away from
/// `b`'s center along the axis of least overlap. `None` when the boxes
/// do not overlap.
pub fn mtv(a: &Rect, b: &Rect) -> Option<Point> {
    if !a.intersects(b) {
        return None;
    }
    let (ox, oy) = a.overlap(b);
    let (ca, cb) = (a.center(), b.center());
    if ox < oy {
        let sign = if ca.x < cb.x { -1.0 } else { 1.0 };
        Some(Point::new(sign * ox, 0.0))
    } else {
        let sign = if ca.y < cb.y { -1.0 } else { 1.0 };
        Some(Point::new(0.0, sign * oy))
    }
}

/// Push `rect` out of every obstacle, up to `rounds` passes. Returns the
/// resolved origin.
pub fn push_out(rect: Rect, obstacles: &[Rect], rounds: usize) -> Point {
    let mut r = rect;
    for _ in 0..rounds {
        let mut moved = false;
        for ob in obstacles {
            if let Some(v) = mtv(&r, ob) {
                r = r.translate(v.x, v.y);
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
    r.origin()
}

/// One step of the leaf resolver: the first obstacle overlapping `target`
/// by at least `min_overlap` on both axes, and the displacement that
/// clears it by `margin`.
pub fn leaf_step(target: &Rect, others: &[Rect], min_overlap: f64, margin: f64) -> Option<Point> {
    others.iter().find_map(|o| {
        let (ox, oy) = target.overlap(o);
        if ox.min(oy) < min_overlap {
            return None;
        }
        let (ct, co) = (target.center(), o.center());
        if ox <= oy {
            let sign = if ct.x < co.x { -1.0 } else { 1.0 };
            Some(Point::new(sign * (ox + margin), 0.0))
        } else {
            let sign = if ct.y < co.y { -1.0 } else { 1.0 };
            Some(Point::new(0.0, sign * (oy + margin)))
        }
    })
}

/// Separate a dropped free function from the other functions. Only
/// `target` moves. Returns the final origin.
pub fn resolve_leaf(target: Rect, others: &[Rect], config: &LayoutConfig) -> Point {
    let mut r = target;
    for _ in 0..config.leaf_rounds {
        match leaf_step(&r, others, config.leaf_min_overlap, config.leaf_margin) {
            Some(v) => r = r.translate(v.x, v.y),
            None => break,
        }
    }
    r.origin()
}

/// Total pairwise overlap area between `rect` and the obstacles.
pub fn overlap_total(rect: &Rect, obstacles: &[Rect]) -> f64 {
    obstacles.iter().map(|o| rect.overlap_area(o)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mtv_pushes_along_smaller_axis() {
        let a = Rect::new(90.0, 0.0, 20.0, 100.0);
        let b = Rect::new(100.0, 0.0, 100.0, 100.0);
        let v = mtv(&a, &b).unwrap();
        assert_eq!(v, Point::new(-10.0, 0.0));
        assert!(mtv(&a, &Rect::new(500.0, 0.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn leaf_step_ignores_slight_overlap() {
        let t = Rect::new(0.0, 0.0, 100.0, 42.0);
        let o = Rect::new(90.0, 0.0, 100.0, 42.0);
        assert!(leaf_step(&t, &[o], 20.0, 4.0).is_none());
    }
}
