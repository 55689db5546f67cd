use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::dispatch;
use crate::registry::Outbound;
use crate::server::AppState;

/// Run one session over an upgraded WebSocket.
///
/// The socket is split into a writer task draining the session's outbox
/// and a reader loop feeding the dispatcher. Inbound messages are handled
/// strictly in order; long-running work is spawned inside the dispatcher,
/// so the reader keeps draining control frames while a download or clone
/// runs. On disconnect the writer is aborted and the session leaves the
/// registry; any in-flight work keeps its outbox clone and its later sends
/// fail silently.
pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (outbox, mut events) = mpsc::unbounded_channel::<Outbound>();

    state.registry.add(id, outbox.clone()).await;

    let writer = tokio::spawn(async move {
        while let Some(message) = events.recv().await {
            let frame = match serde_json::to_string(&message) {
                Ok(frame) => frame,
                Err(e) => {
                    log::error!("[ws] failed to serialize outbound frame: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    let mut received: u64 = 0;
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                received += 1;
                log::debug!("[ws] session {} message #{}", id, received);
                dispatch::handle_message(state.clone(), outbox.clone(), text.to_string()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // binary and protocol-level ping/pong are ignored
            Err(e) => {
                log::debug!("[ws] session {} read error: {}", id, e);
                break;
            }
        }
    }

    writer.abort();
    state.registry.remove(&id).await;
    log::info!("[ws] session {} disconnected after {} messages", id, received);
}
