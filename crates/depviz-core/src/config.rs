//! Layout constants and text measurement

use crate::error::{DepvizError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Every tuned number the layout, drag and collision code consults.
///
/// Missing keys in a TOML file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct LayoutConfig {
    pub module_pad: f64,
    pub module_head: f64,
    pub class_head: f64,
    pub slot_height: f64,
    pub slot_gap: f64,
    pub func_height: f64,
    pub func_width: f64,
    pub min_container_width: f64,
    pub min_label_width: f64,
    pub label_pad: f64,
    pub detach_pad: f64,

    pub arrange_gap_x: f64,
    pub arrange_gap_y: f64,
    pub arrange_column_width: f64,
    pub spawn_spacing_x: f64,
    pub spawn_spacing_y: f64,

    pub push_out_rounds: usize,
    pub leaf_rounds: usize,
    pub leaf_min_overlap: f64,
    pub leaf_margin: f64,

    pub slice_budget_ms: u64,
    pub anchor_epsilon: f64,
    pub history_depth: usize,

    pub zoom_min: f64,
    pub zoom_max: f64,
    pub zoom_step: f64,
    pub pan_step: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            module_pad: 10.0,
            module_head: 28.0,
            class_head: 22.0,
            slot_height: 50.0,
            slot_gap: 8.0,
            func_height: 42.0,
            func_width: 180.0,
            min_container_width: 220.0,
            min_label_width: 160.0,
            label_pad: 20.0,
            detach_pad: 24.0,

            arrange_gap_x: 160.0,
            arrange_gap_y: 120.0,
            arrange_column_width: 280.0,
            spawn_spacing_x: 320.0,
            spawn_spacing_y: 220.0,

            push_out_rounds: 24,
            leaf_rounds: 50,
            leaf_min_overlap: 20.0,
            leaf_margin: 4.0,

            slice_budget_ms: 50,
            anchor_epsilon: 0.5,
            history_depth: 100,

            zoom_min: 0.2,
            zoom_max: 3.0,
            zoom_step: 0.1,
            pan_step: 40.0,
        }
    }
}

impl LayoutConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| DepvizError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn slice_budget(&self) -> Duration {
        Duration::from_millis(self.slice_budget_ms)
    }

    /// Vertical distance between consecutive slots in a container.
    pub fn slot_stride(&self) -> f64 {
        self.slot_height + self.slot_gap
    }

    /// Header height of a container of the given kind.
    pub fn head_for(&self, is_class: bool) -> f64 {
        if is_class { self.class_head } else { self.module_head }
    }
}

/// Measures rendered label widths.
pub trait TextMeasure {
    fn width(&self, text: &str, bold: bool) -> f64;
}

/// Fixed per-character advance, rounded up like a canvas measurement.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMeasure {
    pub regular: f64,
    pub bold: f64,
}

impl Default for ApproxMeasure {
    fn default() -> Self {
        ApproxMeasure {
            regular: 7.0,
            bold: 7.6,
        }
    }
}

impl TextMeasure for ApproxMeasure {
    fn width(&self, text: &str, bold: bool) -> f64 {
        let advance = if bold { self.bold } else { self.regular };
        (text.chars().count() as f64 * advance).ceil()
    }
}
