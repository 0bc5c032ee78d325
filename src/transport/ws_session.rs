use crate::directory::RoomList;
use crate::http::views::RoomsResponse;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;

/// Pushes the (filtered) room list on connect and again after every directory change.
pub async fn handle_socket(socket: WebSocket, mut rooms: watch::Receiver<RoomList>, query: String) {
    let (mut sender, mut receiver) = socket.split();

    let send_task = tokio::spawn(async move {
        loop {
            let current = rooms.borrow_and_update().clone();
            match encode_rooms(&current, &query) {
                Ok(payload) => {
                    if sender.send(Message::Text(payload)).await.is_err() {
                        return;
                    }
                }
                Err(error) => tracing::warn!(?error, "failed to encode room list"),
            }
            if rooms.changed().await.is_err() {
                let _ = sender.send(Message::Close(None)).await;
                return;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        let Ok(message) = result else { break };
        if let Message::Close(_) = message {
            break;
        }
    }

    send_task.abort();
}

pub(crate) fn encode_rooms(rooms: &RoomList, query: &str) -> serde_json::Result<String> {
    serde_json::to_string(&RoomsResponse::build(rooms, query))
}
