//! In-memory broadcaster.
//!
//! Used when the realtime server is disabled and in tests.
//! Works within a single process only.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use forum_core::ports::{BroadcastError, Broadcaster};

/// An event delivered to a room subscriber.
#[derive(Debug, Clone)]
pub struct RoomMessage {
    pub room: String,
    pub event: String,
    pub payload: serde_json::Value,
}

/// Room-scoped fan-out over tokio broadcast channels.
pub struct InMemoryBroadcaster {
    rooms: Arc<RwLock<HashMap<String, broadcast::Sender<RoomMessage>>>>,
    buffer_size: usize,
}

impl InMemoryBroadcaster {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            buffer_size,
        }
    }

    /// Join a room. Events emitted before this call are not replayed.
    pub async fn subscribe(&self, room: &str) -> broadcast::Receiver<RoomMessage> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .subscribe()
    }
}

impl Default for InMemoryBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl Broadcaster for InMemoryBroadcaster {
    async fn emit(
        &self,
        room: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), BroadcastError> {
        let rooms = self.rooms.read().await;

        match rooms.get(room) {
            Some(sender) => {
                let message = RoomMessage {
                    room: room.to_string(),
                    event: event.to_string(),
                    payload,
                };
                // No receivers left is not an error.
                let delivered = sender.send(message).unwrap_or(0);
                tracing::debug!(room = %room, event = %event, delivered, "Event emitted");
            }
            None => {
                tracing::debug!(room = %room, event = %event, "No subscribers for room");
            }
        }

        Ok(())
    }
}
