use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::info;

use crate::error::InitError;
use crate::models::game::{GameState, SetupStep, Stage, PLAYER_COUNT};
use crate::models::player::{PlayerSeed, PlayerState, SYSTEM_ACTOR};
use crate::models::role::Role;
use crate::models::rule::RuleOptions;

/// Deals roles to a full table using the thread-local generator.
pub fn initialize_game(room_id: &str, players: Vec<PlayerSeed>) -> Result<GameState, InitError> {
    initialize_game_with_rng(room_id, players, &mut rand::thread_rng())
}

/// Deals roles with a caller-supplied generator. Seats follow join order; roles do not.
pub fn initialize_game_with_rng<R: Rng + ?Sized>(
    room_id: &str,
    players: Vec<PlayerSeed>,
    rng: &mut R,
) -> Result<GameState, InitError> {
    if players.len() != PLAYER_COUNT {
        return Err(InitError::InvalidPlayerCount {
            expected: PLAYER_COUNT,
            actual: players.len(),
        });
    }

    if let Some(reserved) = players.iter().find(|p| p.player_id == SYSTEM_ACTOR) {
        return Err(InitError::ReservedPlayerId(reserved.player_id.clone()));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = players.iter().find(|p| !seen.insert(p.player_id.as_str())) {
        return Err(InitError::DuplicatePlayer(dup.player_id.clone()));
    }

    let mut roles = Role::pool();
    roles.shuffle(rng);

    let players = players
        .into_iter()
        .zip(roles)
        .zip(1u8..)
        .map(|((seed, role), seat)| PlayerState::new(seed, seat, role))
        .collect();

    info!(room_id, "roles assigned");

    Ok(GameState {
        room_id: room_id.to_string(),
        players,
        options: RuleOptions::default(),
        stage: Stage::Setup(SetupStep::AssignRoles),
        history: Vec::new(),
    })
}
