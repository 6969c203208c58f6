use serde::{Deserialize, Serialize};
use werewolf_engine::PlayerSeed;

/// A room member before and during a game. Seats follow join order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: String,
    pub name: String,
}

impl Player {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        let id = id.into();
        Self {
            name: name.unwrap_or_else(|| format!("Player {}", id)),
            id,
        }
    }

    pub fn seed(&self) -> PlayerSeed {
        PlayerSeed::new(self.id.clone(), self.name.clone())
    }
}
