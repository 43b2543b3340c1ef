//! Realtime rating updates over Socket.IO (socketioxide served by axum).
//!
//! Clients join one room per post. Every rating mutation pushes the post's
//! full aggregate to that room as `ratingUpdated`.

use async_trait::async_trait;
use serde_json::json;
use socketioxide::{
    SocketIo,
    extract::{Data, SocketRef},
    layer::SocketIoLayer,
};
use uuid::Uuid;

use forum_core::ports::{BroadcastError, Broadcaster};

/// Client to server: subscribe to a post's room.
pub const JOIN_POST_EVENT: &str = "joinPost";
/// Client to server: unsubscribe from a post's room.
pub const LEAVE_POST_EVENT: &str = "leavePost";

/// [`Broadcaster`] emitting to Socket.IO rooms.
#[derive(Clone)]
pub struct SocketIoBroadcaster {
    io: SocketIo,
}

impl SocketIoBroadcaster {
    pub fn new(io: SocketIo) -> Self {
        Self { io }
    }
}

#[async_trait]
impl Broadcaster for SocketIoBroadcaster {
    async fn emit(
        &self,
        room: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        self.io
            .to(room.to_string())
            .emit(event.to_string(), &payload)
            .map_err(|e| BroadcastError::Emit(e.to_string()))
    }
}

/// Register connection handlers.
pub fn configure_socket_handlers(io: &SocketIo) {
    io.ns("/", |socket: SocketRef| async move {
        tracing::info!(socket_id = %socket.id, "Client connected");

        socket.on(
            JOIN_POST_EVENT,
            |socket: SocketRef, Data::<String>(raw)| async move {
                let Some(room) = post_room(&socket, &raw) else {
                    return;
                };
                socket.join(room.clone()).ok();
                tracing::debug!(socket_id = %socket.id, room = %room, "Joined post room");
                socket.emit("joinedPost", &room).ok();
            },
        );

        socket.on(
            LEAVE_POST_EVENT,
            |socket: SocketRef, Data::<String>(raw)| async move {
                let Some(room) = post_room(&socket, &raw) else {
                    return;
                };
                socket.leave(room.clone()).ok();
                tracing::debug!(socket_id = %socket.id, room = %room, "Left post room");
                socket.emit("leftPost", &room).ok();
            },
        );

        socket.on_disconnect(|socket: SocketRef| async move {
            tracing::info!(socket_id = %socket.id, "Client disconnected");
        });
    });
}

/// Canonical room name for a post id, or an `error` event back to the client.
fn post_room(socket: &SocketRef, raw: &str) -> Option<String> {
    match Uuid::parse_str(raw.trim()) {
        Ok(post_id) => Some(post_id.to_string()),
        Err(_) => {
            tracing::debug!(socket_id = %socket.id, post_id = %raw, "Rejected room request");
            socket
                .emit("error", &json!({ "message": "Invalid post id" }))
                .ok();
            None
        }
    }
}

/// Create the Socket.IO layer with handlers registered.
pub fn create_socketio_layer() -> (SocketIoLayer, SocketIo) {
    let (layer, io) = SocketIo::new_layer();
    configure_socket_handlers(&io);
    (layer, io)
}

/// Serve the Socket.IO endpoint on its own listener.
pub async fn serve(layer: SocketIoLayer, host: &str, port: u16) -> std::io::Result<()> {
    let app = axum::Router::new().layer(layer);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;

    tracing::info!("Realtime server listening on {}:{}", host, port);

    axum::serve(listener, app).await
}
