use std::{collections::HashMap, sync::Arc};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::models::{config::ServerConfig, session::Session};
use crate::store::{InMemoryRoomStore, RoomStore};

/// What a room's sockets hear after each accepted turn.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// Serialized `game:view` frames keyed by player id; each socket forwards only its own.
    Views(Arc<HashMap<String, String>>),
    /// Serialized `room:update` frame, identical for everyone.
    Room(Arc<String>),
    Closed,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RoomStore>,
    pub channel: Arc<Mutex<HashMap<String, broadcast::Sender<RoomEvent>>>>,
    pub config: Arc<ServerConfig>,
    /// Session token -> member it was issued to at join.
    pub sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(Arc::new(InMemoryRoomStore::new()), config)
    }

    pub fn with_store(store: Arc<dyn RoomStore>, config: ServerConfig) -> Self {
        AppState {
            store,
            channel: Arc::new(Mutex::new(HashMap::new())),
            config: Arc::new(config),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn issue_session(&self, room_id: &str, player_id: &str) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions.lock().await.insert(
            token.clone(),
            Session {
                room_id: room_id.to_string(),
                player_id: player_id.to_string(),
            },
        );
        token
    }

    pub async fn session(&self, token: &str) -> Option<Session> {
        self.sessions.lock().await.get(token).cloned()
    }

    /// Drops the room's sessions, or only `player_id`'s when given.
    pub async fn revoke_sessions(&self, room_id: &str, player_id: Option<&str>) {
        self.sessions.lock().await.retain(|_, s| {
            s.room_id != room_id || player_id.is_some_and(|id| id != s.player_id)
        });
    }

    pub async fn get_or_create_room_channel(&self, room_id: &str) -> broadcast::Sender<RoomEvent> {
        let mut channels = self.channel.lock().await;
        if let Some(channel) = channels.get(room_id) {
            channel.clone()
        } else {
            let (tx, _) = broadcast::channel(self.config.room_channel_capacity);
            channels.insert(room_id.to_string(), tx.clone());
            tx
        }
    }

    pub async fn broadcast(&self, room_id: &str, event: RoomEvent) {
        let tx = self.get_or_create_room_channel(room_id).await;
        // 接続中のクライアントがいない場合は送信エラーになるが問題ない
        if tx.send(event).is_err() {
            debug!(room_id, "no sockets listening");
        }
    }

    pub async fn close_room_channel(&self, room_id: &str) {
        if let Some(tx) = self.channel.lock().await.remove(room_id) {
            let _ = tx.send(RoomEvent::Closed);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}
