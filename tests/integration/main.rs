//! Integration tests for DepViz
//!
//! These tests drive the crates together the way the CLI and server do.

use depviz_core::{
    Artifacts, Direction, Edge, LayoutConfig, NodeId, NodeKind, NodeRecord, Snapshot,
};
use depviz_interact::{ExportKind, OutboundEvent, Session};
use depviz_layout::DrawCommand;
use depviz_server::{ClientMessage, DepvizServer, ServerConfig, ServerMessage, dispatch};
use tempfile::TempDir;

fn module(id: &str, path: &str, x: f64) -> NodeRecord {
    let mut m = NodeRecord::new(id, NodeKind::Module, path).at(x, 0.0);
    m.collapsed = Some(false);
    m.fs_path = Some(path.to_string());
    m
}

fn payload() -> Artifacts {
    Artifacts {
        nodes: vec![
            module("M", "src/m.py", 0.0),
            NodeRecord::new("F", NodeKind::Func, "def F()").with_parent("M"),
            NodeRecord::new("K", NodeKind::Class, "class K").with_parent("M"),
            NodeRecord::new("G", NodeKind::Func, "def G()").with_parent("K"),
            module("N", "src/n.py", 600.0),
            NodeRecord::new("H", NodeKind::Func, "def H()").with_parent("N"),
        ],
        edges: vec![Edge::import("N", "M"), Edge::call("H", "F"), Edge::call("H", "G")],
    }
}

/// A `.dv` export written to disk loads back into an identical graph.
#[test]
fn test_snapshot_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("graph.dv");

    let mut session = Session::default();
    session.merge(payload());
    session.frame();
    let exported = session.export(ExportKind::Dv).unwrap();
    std::fs::write(&path, &exported.content).unwrap();

    let source = std::fs::read_to_string(&path).unwrap();
    let snapshot = Snapshot::from_json(&source).unwrap();
    let mut restored = Session::default();
    restored.load_snapshot(snapshot);

    assert_eq!(restored.store().to_artifacts(), session.store().to_artifacts());
    assert_eq!(restored.snapshot().content_hash(), session.snapshot().content_hash());
}

/// A bare `{nodes, edges}` file is accepted as a snapshot with a default view.
#[test]
fn test_bare_artifacts_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("artifacts.json");
    std::fs::write(&path, serde_json::to_string(&payload()).unwrap()).unwrap();

    let snapshot = Snapshot::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(snapshot.view.zoom, 1.0);
    assert_eq!(snapshot.data.nodes.len(), 6);
}

/// Partial TOML overrides flow through to the layout.
#[test]
fn test_layout_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("depviz.toml");
    std::fs::write(&path, "module_pad = 20.0\nhistory_depth = 5\n").unwrap();

    let config = LayoutConfig::load(&path).unwrap();
    assert_eq!(config.module_pad, 20.0);
    assert_eq!(config.history_depth, 5);
    assert_eq!(config.func_height, LayoutConfig::default().func_height);

    let mut session = Session::new(config);
    session.merge(payload());
    let f = session.layout().rect_of(&NodeId::from("F")).unwrap();
    assert_eq!(f.x, 20.0);
}

#[test]
fn test_missing_config_file_is_error() {
    let dir = TempDir::new().unwrap();
    assert!(LayoutConfig::load(&dir.path().join("absent.toml")).is_err());
}

#[test]
fn test_slice_summary_across_modules() {
    let mut session = Session::default();
    session.merge(payload());

    let summary = session.slice(&NodeId::from("H"), Direction::Outbound).unwrap();
    assert_eq!(summary.file_list, vec!["src/m.py".to_string(), "src/n.py".to_string()]);
    assert_eq!(summary.counts.funcs, 3);
    assert_eq!(summary.counts.classes, 1);
    assert_eq!(summary.counts.edges, 2);
}

/// JSON messages from a host client drive the session end to end.
#[test]
fn test_protocol_session() {
    let mut session = Session::default();

    let msg: ClientMessage = serde_json::from_value(serde_json::json!({
        "type": "addArtifacts",
        "payload": payload(),
    }))
    .unwrap();
    let replies = dispatch(&mut session, msg);

    let scene = replies
        .iter()
        .find_map(|r| match r {
            ServerMessage::Scene { scene, .. } => Some(scene),
            _ => None,
        })
        .expect("scene reply");
    let containers = scene
        .items
        .iter()
        .filter(|i| matches!(i.command, DrawCommand::Container { .. }))
        .count();
    assert_eq!(containers, 3);
    assert!(replies.iter().any(|r| matches!(
        r,
        ServerMessage::Event {
            event: OutboundEvent::PersistSnapshot { .. }
        }
    )));

    let toggle: ClientMessage =
        serde_json::from_str(r#"{"type":"toggleCollapse","id":"N"}"#).unwrap();
    dispatch(&mut session, toggle);
    assert!(session.store().node(&NodeId::from("N")).unwrap().is_collapsed());

    let undo: ClientMessage = serde_json::from_str(r#"{"type":"undo"}"#).unwrap();
    dispatch(&mut session, undo);
    assert!(!session.store().node(&NodeId::from("N")).unwrap().is_collapsed());
}

#[test]
fn test_svg_export_written() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::default();
    session.merge(payload());
    session.frame();

    let svg = session.export(ExportKind::Svg).unwrap();
    let path = dir.path().join(&svg.suggested_name);
    std::fs::write(&path, &svg.content).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("<svg"));
    assert!(written.contains("def H()"));
}

#[tokio::test]
async fn test_server_construction() {
    let mut session = Session::default();
    session.merge(payload());
    let server = DepvizServer::new(
        session,
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            static_dir: None,
        },
    );
    assert_eq!(server.state().session.lock().await.store().node_count(), 6);
}
