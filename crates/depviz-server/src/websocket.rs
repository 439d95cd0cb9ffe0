//! WebSocket protocol: host messages in, scenes and session events out

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use depviz_core::{Artifacts, Direction, NodeId, Point, Snapshot, TypeVisibility, ViewState};
use depviz_interact::{ExportKind, OutboundEvent, ReleaseOutcome, Session};
use depviz_layout::{ArrangeMode, Focus, Scene};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::ServerState;

/// Messages the front end sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    AddArtifacts { payload: Artifacts },
    Replace { payload: Artifacts },
    LoadSnapshot { payload: Snapshot },
    Clear,
    AutoArrange {
        #[serde(default)]
        mode: ArrangeMode,
    },
    SetAllCollapsed { collapsed: bool },
    ToggleCollapse { id: NodeId },
    /// Screen coordinates; `id` skips hit-testing when the host knows the target.
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        id: Option<NodeId>,
    },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    PointerCancel,
    Frame,
    Slice { id: NodeId, direction: Direction },
    ClearSlice,
    Delete { id: NodeId },
    Reattach { id: NodeId },
    Reassemble { id: NodeId },
    Focus {
        #[serde(default)]
        focus: Option<Focus>,
    },
    Search { query: String },
    SearchNext,
    SearchPrev,
    Undo,
    Redo,
    Save,
    Export { kind: ExportKind },
    SetTypeVisibility { visibility: TypeVisibility },
    OpenLocation { id: NodeId },
    Peek { id: NodeId },
    Ping,
}

/// Messages the server sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    Scene { view: ViewState, scene: Scene },
    Event { event: OutboundEvent },
    #[serde(rename_all = "camelCase")]
    Released { node: NodeId, docked_in: Option<NodeId> },
    Error { message: String },
    Pong,
}

fn scene_message(session: &Session) -> ServerMessage {
    ServerMessage::Scene {
        view: *session.view(),
        scene: session.scene().clone(),
    }
}

/// Apply one client message to the session and collect what to send back:
/// a scene when the frame redrew, then any queued session events.
/// Pointer moves only queue; the next message runs the frame.
pub fn dispatch(session: &mut Session, msg: ClientMessage) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    // moves wait for the host's next frame message
    let run_frame = !matches!(msg, ClientMessage::PointerMove { .. });
    match msg {
        ClientMessage::AddArtifacts { payload } => {
            session.merge(payload);
        }
        ClientMessage::Replace { payload } => {
            session.replace(payload);
        }
        ClientMessage::LoadSnapshot { payload } => session.load_snapshot(payload),
        ClientMessage::Clear => session.clear(),
        ClientMessage::AutoArrange { mode } => {
            session.arrange(mode);
        }
        ClientMessage::SetAllCollapsed { collapsed } => session.set_all_collapsed(collapsed),
        ClientMessage::ToggleCollapse { id } => {
            session.toggle_collapse(&id);
        }
        ClientMessage::PointerDown { x, y, id } => {
            let screen = Point::new(x, y);
            match id {
                Some(id) => {
                    session.pointer_down_on(&id, screen);
                }
                None => {
                    session.pointer_down(screen);
                }
            }
        }
        ClientMessage::PointerMove { x, y } => {
            session.pointer_move(Point::new(x, y));
        }
        ClientMessage::PointerUp { x, y } => {
            let node = session.gesture().node().cloned();
            if let (Some(node), Some(outcome)) = (node, session.pointer_up(Point::new(x, y))) {
                let docked_in = match outcome {
                    ReleaseOutcome::Docked { parent } => Some(parent),
                    _ => None,
                };
                out.push(ServerMessage::Released { node, docked_in });
            }
        }
        ClientMessage::PointerCancel => {
            session.pointer_cancel();
        }
        ClientMessage::Frame => {}
        ClientMessage::Slice { id, direction } => {
            if session.slice(&id, direction).is_none() {
                out.push(ServerMessage::Error {
                    message: format!("unknown node {}", id),
                });
            }
        }
        ClientMessage::ClearSlice => session.clear_slice(),
        ClientMessage::Delete { id } => {
            session.delete(&id);
        }
        ClientMessage::Reattach { id } => {
            session.reattach(&id);
        }
        ClientMessage::Reassemble { id } => {
            session.reassemble(&id);
        }
        ClientMessage::Focus { focus } => session.set_focus(focus),
        ClientMessage::Search { query } => {
            session.search(&query);
        }
        ClientMessage::SearchNext => {
            session.search_next();
        }
        ClientMessage::SearchPrev => {
            session.search_prev();
        }
        ClientMessage::Undo => {
            session.undo();
        }
        ClientMessage::Redo => {
            session.redo();
        }
        ClientMessage::Save => session.save(),
        ClientMessage::Export { kind } => {
            if let Err(e) = session.export(kind) {
                out.push(ServerMessage::Error {
                    message: e.to_string(),
                });
            }
        }
        ClientMessage::SetTypeVisibility { visibility } => session.set_type_visibility(visibility),
        ClientMessage::OpenLocation { id } => {
            session.open_location(&id);
        }
        ClientMessage::Peek { id } => {
            session.peek(&id);
        }
        ClientMessage::Ping => out.push(ServerMessage::Pong),
    }

    if run_frame && session.frame() {
        out.push(scene_message(session));
    }
    out.extend(
        session
            .drain_events()
            .into_iter()
            .map(|event| ServerMessage::Event { event }),
    );
    out
}

/// Handle WebSocket upgrade requests
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<ServerState>) {
    info!("New WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.update_tx.subscribe();

    let initial = {
        let mut session = state.session.lock().await;
        session.frame();
        scene_message(&session)
    };
    match serde_json::to_string(&initial) {
        Ok(json) => {
            if sender.send(Message::Text(json)).await.is_err() {
                warn!("Failed to send initial scene to WebSocket client");
                return;
            }
        }
        Err(e) => warn!("Failed to serialize initial scene: {}", e),
    }

    let state_clone = Arc::clone(&state);
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => handle_client_message(client_msg, &state_clone).await,
                    Err(e) => warn!("Failed to parse WebSocket message: {}", e),
                },
                Message::Close(_) => {
                    debug!("WebSocket client disconnected");
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if sender.send(Message::Text(msg)).await.is_err() {
                        debug!("Failed to send message to WebSocket client");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged behind by {} messages", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    info!("WebSocket connection closed");
}

/// Run a client message against the shared session and fan out the replies
async fn handle_client_message(msg: ClientMessage, state: &ServerState) {
    debug!("Received message: {:?}", msg);
    let replies = {
        let mut session = state.session.lock().await;
        dispatch(&mut session, msg)
    };
    for reply in replies {
        match serde_json::to_string(&reply) {
            Ok(json) => {
                if state.broadcast(json).is_err() {
                    debug!("No WebSocket clients to receive update");
                }
            }
            Err(e) => warn!("Failed to serialize server message: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depviz_core::{NodeKind, NodeRecord};

    fn payload() -> Artifacts {
        let mut m = NodeRecord::new("m", NodeKind::Module, "m.py").at(0.0, 0.0);
        m.collapsed = Some(false);
        Artifacts {
            nodes: vec![m, NodeRecord::new("f", NodeKind::Func, "def f()").with_parent("m")],
            edges: vec![],
        }
    }

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"pointerDown","x":3,"y":4}"#).unwrap();
        assert_eq!(msg, ClientMessage::PointerDown { x: 3.0, y: 4.0, id: None });

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"slice","id":"fn_1","direction":"in"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Slice {
                id: NodeId::from("fn_1"),
                direction: Direction::Inbound
            }
        );

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"autoArrange"}"#).unwrap();
        assert_eq!(msg, ClientMessage::AutoArrange { mode: ArrangeMode::ByFolder });

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"launchMissiles"}"#).is_err());
    }

    #[test]
    fn test_server_message_serialization() {
        let json = serde_json::to_string(&ServerMessage::Pong).unwrap();
        insta::assert_snapshot!(json, @r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_dispatch_merge_sends_scene_and_persist() {
        let mut session = Session::default();
        let replies = dispatch(&mut session, ClientMessage::AddArtifacts { payload: payload() });

        assert!(matches!(replies.first(), Some(ServerMessage::Scene { .. })));
        assert!(replies.iter().any(|r| matches!(
            r,
            ServerMessage::Event {
                event: OutboundEvent::PersistSnapshot { .. }
            }
        )));

        // idle frame: nothing to send
        assert!(dispatch(&mut session, ClientMessage::Frame).is_empty());
    }

    #[test]
    fn test_dispatch_drag_reports_release() {
        let mut session = Session::default();
        dispatch(&mut session, ClientMessage::AddArtifacts { payload: payload() });

        dispatch(&mut session, ClientMessage::PointerDown { x: 20.0, y: 50.0, id: None });
        dispatch(&mut session, ClientMessage::PointerMove { x: 500.0, y: 500.0 });
        let replies = dispatch(&mut session, ClientMessage::PointerUp { x: 500.0, y: 500.0 });
        assert!(replies.contains(&ServerMessage::Released {
            node: NodeId::from("f"),
            docked_in: None
        }));
    }

    #[test]
    fn test_dispatch_unknown_slice_seed_is_error() {
        let mut session = Session::default();
        let replies = dispatch(
            &mut session,
            ClientMessage::Slice {
                id: NodeId::from("nope"),
                direction: Direction::Outbound,
            },
        );
        assert!(matches!(replies.first(), Some(ServerMessage::Error { .. })));
    }

    #[tokio::test]
    async fn test_broadcast() {
        let state = ServerState::new(Session::default());
        let mut rx = state.update_tx.subscribe();
        assert!(state.broadcast("test message".to_string()).is_ok());
        assert_eq!(rx.recv().await.ok().as_deref(), Some("test message"));
    }

    #[test]
    fn test_handle_client_message_broadcasts_pong() {
        let state = ServerState::new(Session::default());
        let mut rx = state.update_tx.subscribe();
        tokio_test::block_on(handle_client_message(ClientMessage::Ping, &state));
        let first = rx.try_recv().ok();
        assert_eq!(first.as_deref(), Some(r#"{"type":"pong"}"#));
    }
}
