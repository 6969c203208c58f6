use serde::{Deserialize, Serialize};

/// Who holds a session token: one member of one room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub room_id: String,
    pub player_id: String,
}
