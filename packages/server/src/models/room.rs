use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use werewolf_engine::{PlayerSeed, PLAYER_COUNT};

use super::player::Player;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum RoomStatus {
    Open,
    InProgress,
    Closed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,
    pub name: Option<String>,
    pub players: Vec<Player>,
    pub max_players: usize,
    pub status: RoomStatus,
    /// First joiner, unless handed over. Starts the game and gates the host-only sheriff actions.
    pub host_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(room_id: String, name: Option<String>) -> Self {
        Room {
            room_id,
            name,
            players: Vec::new(),
            max_players: PLAYER_COUNT,
            status: RoomStatus::Open,
            host_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_member(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.host_id.as_deref() == Some(player_id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn seeds(&self) -> Vec<PlayerSeed> {
        self.players.iter().map(Player::seed).collect()
    }
}
