use serde::{Deserialize, Serialize};
use werewolf_engine::{GameAction, PlayerView};

use super::room::Room;

/// Frames a client may send over the room socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "game:action")]
    GameAction { action: GameAction },
    #[serde(rename = "room:transfer_host")]
    TransferHost {
        #[serde(rename = "newHostPlayerId")]
        new_host_player_id: String,
    },
}

/// Frames the server pushes to a single socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "game:view")]
    View { view: Box<PlayerView> },
    #[serde(rename = "room:update")]
    Room { room: Room },
    #[serde(rename = "error")]
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub player_id: String,
    pub name: Option<String>,
}

/// The token is returned once, here, and never appears in room updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub room: Room,
    pub session_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferHostRequest {
    pub new_host_player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinnerResponse {
    pub finished: bool,
    pub winner: Option<werewolf_engine::Faction>,
}
