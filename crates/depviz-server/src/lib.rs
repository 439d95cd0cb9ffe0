//! DepViz Server — HTTP + WebSocket host for a canvas session

pub mod handlers;
pub mod router;
pub mod websocket;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use depviz_interact::Session;
use tokio::sync::{Mutex, broadcast};
use tracing::info;

pub use websocket::{ClientMessage, ServerMessage, dispatch};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Front-end assets served for any path the API does not claim.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 7878,
            static_dir: None,
        }
    }
}

/// Shared state: the single session and the fan-out channel to clients.
pub struct ServerState {
    pub session: Mutex<Session>,
    pub update_tx: broadcast::Sender<String>,
    pub static_dir: Option<PathBuf>,
}

impl ServerState {
    pub fn new(session: Session) -> Self {
        let (update_tx, _) = broadcast::channel(256);
        ServerState {
            session: Mutex::new(session),
            update_tx,
            static_dir: None,
        }
    }

    /// Send a serialized message to every connected client.
    pub fn broadcast(&self, msg: String) -> Result<usize, broadcast::error::SendError<String>> {
        self.update_tx.send(msg)
    }
}

pub struct DepvizServer {
    config: ServerConfig,
    state: Arc<ServerState>,
}

impl DepvizServer {
    pub fn new(session: Session, config: ServerConfig) -> Self {
        let mut state = ServerState::new(session);
        state.static_dir = config.static_dir.clone();
        DepvizServer {
            config,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    pub async fn start(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("DepViz listening on http://{}", addr);
        let app = router::create_router(self.state);
        axum::serve(listener, app).await?;
        Ok(())
    }
}
