//! Requests the session hands to its host

use depviz_core::{ImpactSummary, NodeId, Snapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    /// Plain graph payload.
    Json,
    /// Full snapshot, view state included.
    Dv,
    Svg,
    /// SVG payload the host rasterizes.
    Png,
}

impl ExportKind {
    pub fn suggested_name(self) -> &'static str {
        match self {
            ExportKind::Json => "depviz.json",
            ExportKind::Dv => "graph.dv",
            ExportKind::Svg => "depviz.svg",
            ExportKind::Png => "depviz.png",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportKind::Json => "json",
            ExportKind::Dv => "dv",
            ExportKind::Svg => "svg",
            ExportKind::Png => "png",
        };
        f.write_str(s)
    }
}

impl FromStr for ExportKind {
    type Err = depviz_core::DepvizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportKind::Json),
            "dv" => Ok(ExportKind::Dv),
            "svg" => Ok(ExportKind::Svg),
            "png" => Ok(ExportKind::Png),
            other => Err(depviz_core::DepvizError::UnknownFormat(other.to_string())),
        }
    }
}

/// Outbound request for the host. Drained with `Session::drain_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundEvent {
    /// Store this snapshot (explicit save, or a graph change with a new hash).
    #[serde(rename_all = "camelCase")]
    PersistSnapshot {
        label: String,
        hash: String,
        payload: Snapshot,
    },
    #[serde(rename_all = "camelCase")]
    OpenLocation { file: String, line: u32, col: u32 },
    #[serde(rename_all = "camelCase")]
    PeekSymbol { file: String, symbol_name: String },
    ImpactSummary(ImpactSummary),
    #[serde(rename_all = "camelCase")]
    Export {
        kind: ExportKind,
        suggested_name: String,
        content: String,
    },
    /// A module left the canvas; the importer may forget its fingerprint.
    #[serde(rename_all = "camelCase")]
    EvictFingerprint { fs_path: String },
    /// Transient highlight for a refused drop.
    Flash { id: NodeId },
}
