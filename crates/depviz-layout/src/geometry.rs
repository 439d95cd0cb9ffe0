//! Axis-aligned rectangles in world space

use depviz_core::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect { x, y, w, h }
    }

    pub fn at(origin: Point, w: f64, h: f64) -> Self {
        Rect::new(origin.x, origin.y, w, h)
    }

    /// Smallest rect holding both points.
    pub fn spanning(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Rect::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    /// Inclusive containment with an optional outward pad.
    pub fn contains(&self, p: Point, pad: f64) -> bool {
        p.x >= self.x - pad && p.x <= self.right() + pad && p.y >= self.y - pad && p.y <= self.bottom() + pad
    }

    pub fn inflate(&self, pad: f64) -> Rect {
        Rect::new(self.x - pad, self.y - pad, self.w + pad * 2.0, self.h + pad * 2.0)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    pub fn moved_to(&self, origin: Point) -> Rect {
        Rect::new(origin.x, origin.y, self.w, self.h)
    }

    /// Strict overlap test; touching edges do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && self.right() > other.x && self.y < other.bottom() && self.bottom() > other.y
    }

    /// Overlap extent on each axis, zero when apart.
    pub fn overlap(&self, other: &Rect) -> (f64, f64) {
        let w = (self.right().min(other.right()) - self.x.max(other.x)).max(0.0);
        let h = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0);
        (w, h)
    }

    pub fn overlap_area(&self, other: &Rect) -> f64 {
        let (w, h) = self.overlap(other);
        w * h
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_is_not_intersecting() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert_eq!(a.overlap_area(&b), 0.0);
    }

    #[test]
    fn flat_rect_still_intersects() {
        let line = Rect::spanning(Point::new(-5.0, 5.0), Point::new(50.0, 5.0));
        assert_eq!(line.h, 0.0);
        assert!(line.intersects(&Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn padded_containment() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!r.contains(Point::new(-3.0, 5.0), 0.0));
        assert!(r.contains(Point::new(-3.0, 5.0), 4.0));
    }
}
