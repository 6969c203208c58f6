//! Dispatcher between rooms and the rule engine.
//!
//! Every turn runs with the room's mutex held: apply the action, drain the
//! pending system steps, store the new state and broadcast the views. Nothing
//! outside the lock ever sees a half-advanced game.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use werewolf_engine::{
    apply_action, initialize_game, player_view as project_view, ActionError, GameAction,
    GameState, InitError, PlayerView, ViewError,
};

use crate::{
    models::{
        message::{ServerMessage, WinnerResponse},
        room::{Room, RoomStatus},
    },
    services::room_service,
    state::{AppState, RoomEvent},
    store::RoomHandle,
};

#[derive(Debug, thiserror::Error)]
pub enum GameServiceError {
    #[error("room {0} not found")]
    RoomNotFound(String),
    #[error("no game is running in room {0}")]
    GameNotStarted(String),
    #[error("room {0} already has a game")]
    AlreadyStarted(String),
    #[error("player {0} is not in the room")]
    NotMember(String),
    #[error("only the host can start the game, {0} is not the host")]
    NotHost(String),
    #[error(transparent)]
    Init(#[from] InitError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error("failed to encode view: {0}")]
    Encode(#[from] serde_json::Error),
}

pub async fn start_game(
    state: &AppState,
    room_id: &str,
    actor_id: &str,
) -> Result<String, GameServiceError> {
    let handle = room_handle(state, room_id).await?;
    let mut entry = handle.lock().await;
    if !entry.room.is_host(actor_id) {
        return Err(GameServiceError::NotHost(actor_id.to_string()));
    }
    if entry.room.status != RoomStatus::Open || entry.game.is_some() {
        return Err(GameServiceError::AlreadyStarted(room_id.to_string()));
    }

    let game = initialize_game(room_id, entry.room.seeds())?.with_options(state.config.rules.clone());
    let game = run_system_steps(game)?;
    let views = render_views(&entry.room, &game)?;

    entry.room.status = RoomStatus::InProgress;
    entry.game = Some(game);
    info!(room_id, host = actor_id, "game started");

    room_service::announce(state, &entry.room).await;
    state
        .broadcast(room_id, RoomEvent::Views(Arc::new(views)))
        .await;
    Ok("Game started successfully".to_string())
}

/// Plays one action for a room member and returns the actor's fresh view.
/// Rejections go back to the caller only; the stored game stays untouched.
pub async fn submit_action(
    state: &AppState,
    room_id: &str,
    mut action: GameAction,
) -> Result<PlayerView, GameServiceError> {
    let handle = room_handle(state, room_id).await?;
    let mut entry = handle.lock().await;

    if !entry.room.is_member(&action.player_id) {
        return Err(GameServiceError::NotMember(action.player_id));
    }
    let privileged = entry.room.is_host(&action.player_id);
    let game = entry
        .game
        .as_ref()
        .ok_or_else(|| GameServiceError::GameNotStarted(room_id.to_string()))?;

    action.timestamp = Utc::now().timestamp_millis();
    let next = apply_action(game, &action, privileged).map_err(|e| {
        debug!(room_id, player_id = %action.player_id, error = %e, "action rejected");
        e
    })?;
    let next = run_system_steps(next)?;

    let view = project_view(&next, &action.player_id, entry.room.host_id.as_deref())?;
    let views = render_views(&entry.room, &next)?;
    let finished = next.is_finished();
    if let Some(winner) = next.winner() {
        info!(room_id, %winner, "game finished");
    }
    entry.game = Some(next);

    if finished {
        entry.room.status = RoomStatus::Closed;
        room_service::announce(state, &entry.room).await;
    }
    state
        .broadcast(room_id, RoomEvent::Views(Arc::new(views)))
        .await;
    Ok(view)
}

pub async fn player_view(
    state: &AppState,
    room_id: &str,
    player_id: &str,
) -> Result<PlayerView, GameServiceError> {
    let handle = room_handle(state, room_id).await?;
    let entry = handle.lock().await;
    let game = entry
        .game
        .as_ref()
        .ok_or_else(|| GameServiceError::GameNotStarted(room_id.to_string()))?;
    Ok(project_view(game, player_id, entry.room.host_id.as_deref())?)
}

pub async fn check_winner(
    state: &AppState,
    room_id: &str,
) -> Result<WinnerResponse, GameServiceError> {
    let handle = room_handle(state, room_id).await?;
    let entry = handle.lock().await;
    let game = entry
        .game
        .as_ref()
        .ok_or_else(|| GameServiceError::GameNotStarted(room_id.to_string()))?;
    Ok(WinnerResponse {
        finished: game.is_finished(),
        winner: game.winner(),
    })
}

/// Serialized view frame for every member, as the room socket forwards them.
pub(crate) async fn views_for(
    state: &AppState,
    room_id: &str,
) -> Result<Option<HashMap<String, String>>, GameServiceError> {
    let handle = room_handle(state, room_id).await?;
    let entry = handle.lock().await;
    entry
        .game
        .as_ref()
        .map(|game| render_views(&entry.room, game))
        .transpose()
}

async fn room_handle(state: &AppState, room_id: &str) -> Result<RoomHandle, GameServiceError> {
    state
        .store
        .get(room_id)
        .await
        .ok_or_else(|| GameServiceError::RoomNotFound(room_id.to_string()))
}

fn run_system_steps(mut game: GameState) -> Result<GameState, ActionError> {
    while let Some(kind) = game.pending_system_action() {
        let action = GameAction::system(kind, Utc::now().timestamp_millis());
        game = apply_action(&game, &action, false)?;
    }
    Ok(game)
}

pub(crate) fn render_views(room: &Room, game: &GameState) -> Result<HashMap<String, String>, GameServiceError> {
    let host = room.host_id.as_deref();
    room.players
        .iter()
        .map(|p| {
            let view = project_view(game, &p.id, host)?;
            let frame = serde_json::to_string(&ServerMessage::View {
                view: Box::new(view),
            })?;
            Ok((p.id.clone(), frame))
        })
        .collect()
}
