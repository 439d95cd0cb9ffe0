//! CLI command implementations

use anyhow::Context;
use depviz_core::{Direction, LayoutConfig, NodeId, Snapshot};
use depviz_interact::{ExportKind, Session};
use depviz_layout::ArrangeMode;
use depviz_server::{DepvizServer, ServerConfig};
use std::path::{Path, PathBuf};

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    match path {
        Some(path) => {
            tracing::info!("Loading layout config: {}", path.display());
            Ok(LayoutConfig::load(path)?)
        }
        None => Ok(LayoutConfig::default()),
    }
}

/// Read an artifacts or snapshot file into a fresh session.
fn open_session(config: LayoutConfig, input: &Path) -> anyhow::Result<Session> {
    let source = std::fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let snapshot = Snapshot::from_json(&source)
        .with_context(|| format!("cannot parse {}", input.display()))?;

    let mut session = Session::new(config);
    session.load_snapshot(snapshot);
    session.drain_events();
    tracing::info!(
        "Loaded {} nodes, {} edges from {}",
        session.store().node_count(),
        session.store().edge_count(),
        input.display()
    );
    Ok(session)
}

pub async fn serve(
    config: LayoutConfig,
    input: Option<PathBuf>,
    host: String,
    port: u16,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let session = match input {
        Some(input) => open_session(config, &input)?,
        None => Session::new(config),
    };

    tracing::info!("Starting DepViz server on {}:{}", host, port);
    let server = DepvizServer::new(
        session,
        ServerConfig {
            host,
            port,
            static_dir,
        },
    );
    server.start().await
}

pub fn layout(
    config: LayoutConfig,
    input: &Path,
    arrange: Option<ArrangeMode>,
) -> anyhow::Result<()> {
    let mut session = open_session(config, input)?;
    if let Some(mode) = arrange {
        let placed = session.arrange(mode);
        tracing::debug!("Arranged {} modules", placed);
    }
    session.frame();

    let out = serde_json::json!({
        "view": session.view(),
        "scene": session.scene().to_json(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub fn slice(
    config: LayoutConfig,
    input: &Path,
    id: &str,
    direction: Direction,
) -> anyhow::Result<()> {
    let mut session = open_session(config, input)?;
    let seed = NodeId::from(id);
    let summary = session
        .slice(&seed, direction)
        .with_context(|| format!("unknown node: {}", id))?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub fn export(
    config: LayoutConfig,
    input: &Path,
    kind: ExportKind,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut session = open_session(config, input)?;
    session.frame();
    let payload = session.export(kind)?;

    let output = output.unwrap_or_else(|| PathBuf::from(&payload.suggested_name));
    std::fs::write(&output, payload.content)
        .with_context(|| format!("cannot write {}", output.display()))?;
    tracing::info!("Exported {} to {}", kind, output.display());
    Ok(())
}
