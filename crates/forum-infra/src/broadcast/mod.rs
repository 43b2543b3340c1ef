//! Broadcaster implementations.

mod memory;

pub use memory::{InMemoryBroadcaster, RoomMessage};
