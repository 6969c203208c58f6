//! Room registry. Each room sits behind its own mutex; holding it is the
//! single writer turn for that room's game.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use werewolf_engine::GameState;

use crate::models::room::Room;

#[derive(Debug, Clone)]
pub struct RoomEntry {
    pub room: Room,
    pub game: Option<GameState>,
}

impl RoomEntry {
    pub fn new(room: Room) -> Self {
        Self { room, game: None }
    }
}

pub type RoomHandle = Arc<Mutex<RoomEntry>>;

#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Registers `room`, replacing any room with the same id.
    async fn create(&self, room: Room) -> RoomHandle;
    async fn get(&self, room_id: &str) -> Option<RoomHandle>;
    async fn remove(&self, room_id: &str) -> Option<RoomHandle>;
    async fn list(&self) -> Vec<RoomHandle>;
}

#[derive(Default)]
pub struct InMemoryRoomStore {
    rooms: RwLock<HashMap<String, RoomHandle>>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn create(&self, room: Room) -> RoomHandle {
        let room_id = room.room_id.clone();
        let handle = Arc::new(Mutex::new(RoomEntry::new(room)));
        self.rooms.write().await.insert(room_id, handle.clone());
        handle
    }

    async fn get(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.read().await.get(room_id).cloned()
    }

    async fn remove(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.write().await.remove(room_id)
    }

    async fn list(&self) -> Vec<RoomHandle> {
        self.rooms.read().await.values().cloned().collect()
    }
}
