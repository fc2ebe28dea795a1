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
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{Intent, SessionEvent};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Errors writing to a socket
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("socket send failed: {0}")]
    Send(#[from] axum::Error),
}

/// WebSocket upgrade handler. Anyone may connect; joining the match is a
/// separate message.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();
    info!(connection_id = %connection_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    // Map goes out before the connection can receive any broadcast.
    let map = ServerMsg::MapData {
        walls: state.arena.obstacles.clone(),
        width: state.arena.width,
        height: state.arena.height,
    };
    if let Err(e) = send_msg(&mut ws_sink, &map).await {
        error!(connection_id = %connection_id, error = %e, "Failed to send map");
        return;
    }

    let outbound_rx = state.registry.register(connection_id);
    let rate_limiter = ConnectionRateLimiter::new(state.config.input_rate_limit);

    run_session(
        connection_id,
        ws_sink,
        ws_stream,
        state.input_tx.clone(),
        outbound_rx,
        rate_limiter,
    )
    .await;

    state.registry.unregister(connection_id);
    info!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    connection_id: Uuid,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
    input_tx: mpsc::Sender<Intent>,
    mut outbound_rx: mpsc::Receiver<ServerMsg>,
    rate_limiter: ConnectionRateLimiter,
) {
    // Writer task: outbound queue -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(connection_id = %connection_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> simulation
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(connection_id = %connection_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => {
                        if !queue_intent(&input_tx, connection_id, SessionEvent::Message(msg)).await
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(connection_id = %connection_id, error = %e, "Failed to parse client message");
                    }
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
                debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    queue_intent(&input_tx, connection_id, SessionEvent::Disconnected).await;
    writer_handle.abort();
}

async fn queue_intent(tx: &mpsc::Sender<Intent>, connection_id: Uuid, event: SessionEvent) -> bool {
    let intent = Intent {
        connection_id,
        event,
        received_at: unix_millis(),
    };
    if tx.send(intent).await.is_err() {
        debug!(connection_id = %connection_id, "Input channel closed");
        return false;
    }
    true
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), WsError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
