//! View state and whole-canvas snapshots

use crate::error::Result;
use crate::model::{Artifacts, Point, TypeVisibility, fnv1a_hex};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Camera and filter state of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewState {
    pub pan: Point,
    pub zoom: f64,
    pub type_visibility: TypeVisibility,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            pan: Point::default(),
            zoom: 1.0,
            type_visibility: TypeVisibility::default(),
        }
    }
}

impl ViewState {
    /// Screen-space point to world-space.
    pub fn to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan.x) / self.zoom,
            (screen.y - self.pan.y) / self.zoom,
        )
    }

    /// Pan so that `world` sits at the centre of a viewport of the given size.
    pub fn center_on(&mut self, world: Point, viewport_w: f64, viewport_h: f64) {
        self.pan.x = viewport_w / 2.0 - world.x * self.zoom;
        self.pan.y = viewport_h / 2.0 - world.y * self.zoom;
    }

    /// Set zoom within `[min, max]`, keeping `pivot` (screen space) fixed.
    pub fn zoom_to(&mut self, zoom: f64, pivot: Point, min: f64, max: f64) {
        let next = zoom.clamp(min, max);
        let world = self.to_world(pivot);
        self.zoom = next;
        self.pan.x = pivot.x - world.x * next;
        self.pan.y = pivot.y - world.y * next;
    }
}

/// Everything needed to restore a canvas: camera, filters and graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(flatten)]
    pub view: ViewState,
    #[serde(default)]
    pub data: Artifacts,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Snapshot {
    pub fn new(view: ViewState, data: Artifacts) -> Self {
        Snapshot {
            version: SNAPSHOT_VERSION,
            view,
            data,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot, or a bare `{nodes, edges}` payload wrapped in a
    /// default view.
    pub fn from_json(source: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(source)?;
        if value.get("data").is_some() {
            Ok(serde_json::from_value(value)?)
        } else {
            let data: Artifacts = serde_json::from_value(value)?;
            Ok(Snapshot::new(ViewState::default(), data))
        }
    }

    /// FNV-1a of the compact JSON form; equal states hash equal.
    pub fn content_hash(&self) -> String {
        match self.to_json() {
            Ok(text) => fnv1a_hex(&text),
            Err(_) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_payload_gets_default_view() {
        let snap = Snapshot::from_json(r#"{"nodes":[],"edges":[]}"#).unwrap();
        assert_eq!(snap.view, ViewState::default());
        assert_eq!(snap.version, SNAPSHOT_VERSION);
    }

    #[test]
    fn wire_shape_is_flat() {
        let snap = Snapshot::new(ViewState::default(), Artifacts::default());
        let value: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();
        assert_eq!(value["zoom"], 1.0);
        assert_eq!(value["typeVisibility"]["call"], true);
        assert!(value["data"]["nodes"].is_array());
    }

    #[test]
    fn zoom_keeps_pivot_fixed() {
        let mut view = ViewState::default();
        let pivot = Point::new(100.0, 50.0);
        let before = view.to_world(pivot);
        view.zoom_to(2.0, pivot, 0.2, 3.0);
        let after = view.to_world(pivot);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
        view.zoom_to(10.0, pivot, 0.2, 3.0);
        assert_eq!(view.zoom, 3.0);
    }
}
