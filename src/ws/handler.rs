//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::matchmaking::Assignment;
use crate::ws::protocol::ServerEvent;
use crate::ws::session::{Inbound, Session};

/// Errors writing to a client socket
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("socket write failed: {0}")]
    Socket(#[from] axum::Error),
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    info!(connection_id = %connection_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    // The session reaches its room through the registry, not this handle,
    // so a finished room is unreachable from here
    let Assignment {
        room,
        player_number,
        events,
    } = state.matchmaking.connect(connection_id);
    let session = Session::new(connection_id, room.id, player_number, state.registry.clone());
    drop(room);

    // Slot number goes out before anything the room broadcasts
    if let Err(e) = send_event(&mut ws_sink, &ServerEvent::PlayerNumber(player_number)).await {
        error!(connection_id = %connection_id, error = %e, "Failed to send player number");
        state.matchmaking.disconnect(connection_id);
        return;
    }

    info!(connection_id = %connection_id, room_id = %session.room_id, player_number, "Player seated");
    run_session(session, ws_sink, ws_stream, events).await;

    state.matchmaking.disconnect(connection_id);
    info!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    session: Session,
    ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    events: broadcast::Receiver<ServerEvent>,
) {
    let connection_id = session.connection_id;
    let player_number = session.player_number;

    // Writer task: room events -> WebSocket
    let writer_handle = tokio::spawn(pump_events(connection_id, ws_sink, events));

    // Reader loop: WebSocket -> room
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if session.handle_text(&text) == Inbound::Dropped {
                    debug!(
                        connection_id = %connection_id,
                        player_number,
                        "Inbound frame dropped"
                    );
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(connection_id = %connection_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(connection_id = %connection_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}

/// Forward room events to the socket until either side closes.
/// A dead socket ends this task only; the room keeps ticking.
async fn pump_events(
    connection_id: Uuid,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut events: broadcast::Receiver<ServerEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Err(e) = send_event(&mut ws_sink, &event).await {
                    debug!(connection_id = %connection_id, error = %e, "WebSocket send failed");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    connection_id = %connection_id,
                    lagged_count = n,
                    "Client lagged, skipping {} events", n
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(connection_id = %connection_id, "Room event channel closed");
                break;
            }
        }
    }
}

/// Send a message over WebSocket
async fn send_event(
    sink: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), SessionError> {
    let json = serde_json::to_string(event)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
