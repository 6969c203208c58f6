use serde::{Deserialize, Serialize};

use super::role::{CheckResult, Gesture, Role};

pub type PlayerId = String;

/// Reserved actor id for steps the dispatcher advances on its own.
pub const SYSTEM_ACTOR: &str = "system";

/// Roster entry handed over by the dispatcher, in join order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSeed {
    pub player_id: PlayerId,
    pub display_handle: String,
    pub nickname: String,
}

impl PlayerSeed {
    pub fn new(player_id: impl Into<String>, nickname: impl Into<String>) -> Self {
        let player_id = player_id.into();
        Self {
            display_handle: player_id.clone(),
            player_id,
            nickname: nickname.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeerCheck {
    pub target_id: PlayerId,
    pub result: CheckResult,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub player_id: PlayerId,
    pub seat_number: u8,
    pub nickname: String,
    pub display_handle: String,
    pub role: Role,
    pub alive: bool,
    pub is_sheriff: bool,
    pub hunter_gesture: Option<Gesture>,
    pub witch_save_used: bool,
    pub witch_poison_used: bool,
    pub seer_checks: Vec<SeerCheck>,
}

impl PlayerState {
    pub fn new(seed: PlayerSeed, seat_number: u8, role: Role) -> Self {
        Self {
            player_id: seed.player_id,
            seat_number,
            nickname: seed.nickname,
            display_handle: seed.display_handle,
            role,
            alive: true,
            is_sheriff: false,
            hunter_gesture: None,
            witch_save_used: false,
            witch_poison_used: false,
            seer_checks: Vec::new(),
        }
    }

    pub fn is_alive_as(&self, role: Role) -> bool {
        self.alive && self.role == role
    }
}

pub(crate) fn find<'a>(players: &'a [PlayerState], player_id: &str) -> Option<&'a PlayerState> {
    players.iter().find(|p| p.player_id == player_id)
}

pub(crate) fn find_mut<'a>(
    players: &'a mut [PlayerState],
    player_id: &str,
) -> Option<&'a mut PlayerState> {
    players.iter_mut().find(|p| p.player_id == player_id)
}

pub(crate) fn alive_ids_with_role(players: &[PlayerState], role: Role) -> Vec<&str> {
    players
        .iter()
        .filter(|p| p.is_alive_as(role))
        .map(|p| p.player_id.as_str())
        .collect()
}

pub(crate) fn seat_of(players: &[PlayerState], player_id: &str) -> u8 {
    find(players, player_id).map_or(u8::MAX, |p| p.seat_number)
}
