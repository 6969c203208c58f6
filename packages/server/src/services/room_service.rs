use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use werewolf_engine::SYSTEM_ACTOR;

use crate::{
    models::{
        message::ServerMessage,
        player::Player,
        room::{Room, RoomStatus},
    },
    services::game_service,
    state::{AppState, RoomEvent},
};

#[derive(Debug, thiserror::Error)]
pub enum RoomServiceError {
    #[error("room {0} not found")]
    NotFound(String),
    #[error("room {0} is not accepting changes to its members")]
    NotOpen(String),
    #[error("room {0} is full")]
    Full(String),
    #[error("player {0} has already joined")]
    AlreadyJoined(String),
    #[error("player {0} is not in the room")]
    NotMember(String),
    #[error("player id {0:?} cannot be used")]
    InvalidPlayerId(String),
    #[error("only the host can do that, {0} is not the host")]
    NotHost(String),
}

pub async fn create_room(state: &AppState, name: Option<String>) -> String {
    let room_id = Uuid::new_v4().to_string();
    state
        .store
        .create(Room::new(room_id.clone(), name))
        .await;
    info!(room_id = %room_id, "room created");
    room_id
}

/// Seats a player and issues the session token that identifies them from now on.
pub async fn join_room(
    state: &AppState,
    room_id: &str,
    player_id: &str,
    name: Option<String>,
) -> Result<(Room, String), RoomServiceError> {
    if player_id.trim().is_empty() || player_id == SYSTEM_ACTOR {
        return Err(RoomServiceError::InvalidPlayerId(player_id.to_string()));
    }
    let handle = state
        .store
        .get(room_id)
        .await
        .ok_or_else(|| RoomServiceError::NotFound(room_id.to_string()))?;

    let room = {
        let mut entry = handle.lock().await;
        let room = &mut entry.room;

        // ルームの状態がOpenか確認
        if room.status != RoomStatus::Open {
            return Err(RoomServiceError::NotOpen(room_id.to_string()));
        }
        // プレイヤー数の上限チェック
        if room.is_full() {
            return Err(RoomServiceError::Full(room_id.to_string()));
        }
        // 既に参加しているプレイヤーかチェック
        if room.is_member(player_id) {
            return Err(RoomServiceError::AlreadyJoined(player_id.to_string()));
        }

        room.players.push(Player::new(player_id, name));
        if room.host_id.is_none() {
            room.host_id = Some(player_id.to_string());
        }
        room.clone()
    };

    let token = state.issue_session(room_id, player_id).await;
    info!(room_id, player_id, members = room.players.len(), "player joined");
    announce(state, &room).await;
    Ok((room, token))
}

pub async fn leave_room(
    state: &AppState,
    room_id: &str,
    player_id: &str,
) -> Result<Room, RoomServiceError> {
    let handle = state
        .store
        .get(room_id)
        .await
        .ok_or_else(|| RoomServiceError::NotFound(room_id.to_string()))?;

    let room = {
        let mut entry = handle.lock().await;
        let room = &mut entry.room;
        if room.status != RoomStatus::Open {
            return Err(RoomServiceError::NotOpen(room_id.to_string()));
        }
        let index = room
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| RoomServiceError::NotMember(player_id.to_string()))?;

        room.players.remove(index);
        if room.is_host(player_id) {
            room.host_id = room.players.first().map(|p| p.id.clone());
        }
        room.clone()
    };

    state.revoke_sessions(room_id, Some(player_id)).await;
    info!(room_id, player_id, host = ?room.host_id, "player left");
    announce(state, &room).await;
    Ok(room)
}

/// Hands the host seat to another member. Only the current host may do this,
/// before or during a game.
pub async fn transfer_host(
    state: &AppState,
    room_id: &str,
    actor_id: &str,
    new_host_id: &str,
) -> Result<Room, RoomServiceError> {
    let handle = state
        .store
        .get(room_id)
        .await
        .ok_or_else(|| RoomServiceError::NotFound(room_id.to_string()))?;

    let mut entry = handle.lock().await;
    if !entry.room.is_host(actor_id) {
        return Err(RoomServiceError::NotHost(actor_id.to_string()));
    }
    if !entry.room.is_member(new_host_id) {
        return Err(RoomServiceError::NotMember(new_host_id.to_string()));
    }
    entry.room.host_id = Some(new_host_id.to_string());
    info!(room_id, from = actor_id, to = new_host_id, "host transferred");

    announce(state, &entry.room).await;
    // ホストの権限はビューにも載るので配り直す
    if let Some(game) = entry.game.as_ref() {
        match game_service::render_views(&entry.room, game) {
            Ok(views) => {
                state
                    .broadcast(room_id, RoomEvent::Views(Arc::new(views)))
                    .await
            }
            Err(e) => warn!(room_id, error = %e, "failed to render views after host transfer"),
        }
    }
    Ok(entry.room.clone())
}

/// All rooms, oldest first.
pub async fn get_rooms(state: &AppState) -> Vec<Room> {
    let mut rooms = Vec::new();
    for handle in state.store.list().await {
        rooms.push(handle.lock().await.room.clone());
    }
    rooms.sort_by_key(|room| room.created_at);
    rooms
}

pub async fn get_room_info(state: &AppState, room_id: &str) -> Result<Room, RoomServiceError> {
    let handle = state
        .store
        .get(room_id)
        .await
        .ok_or_else(|| RoomServiceError::NotFound(room_id.to_string()))?;
    let room = handle.lock().await.room.clone();
    Ok(room)
}

pub async fn delete_room(state: &AppState, room_id: &str) -> Result<(), RoomServiceError> {
    state
        .store
        .remove(room_id)
        .await
        .ok_or_else(|| RoomServiceError::NotFound(room_id.to_string()))?;
    state.close_room_channel(room_id).await;
    state.revoke_sessions(room_id, None).await;
    info!(room_id, "room deleted");
    Ok(())
}

pub(crate) async fn announce(state: &AppState, room: &Room) {
    let message = ServerMessage::Room { room: room.clone() };
    match serde_json::to_string(&message) {
        Ok(text) => {
            state
                .broadcast(&room.room_id, RoomEvent::Room(Arc::new(text)))
                .await
        }
        Err(e) => warn!(room_id = %room.room_id, error = %e, "failed to encode room update"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_joiner_hosts_until_they_leave() {
        let state = AppState::default();
        let room_id = create_room(&state, None).await;

        join_room(&state, &room_id, "alice", None).await.unwrap();
        let (room, _) = join_room(&state, &room_id, "bob", Some("Bob".to_string()))
            .await
            .unwrap();
        assert_eq!(room.host_id.as_deref(), Some("alice"));
        assert_eq!(room.players[1].name, "Bob");

        let room = leave_room(&state, &room_id, "alice").await.unwrap();
        assert_eq!(room.host_id.as_deref(), Some("bob"));
        let room = leave_room(&state, &room_id, "bob").await.unwrap();
        assert_eq!(room.host_id, None);
    }

    #[tokio::test]
    async fn eleventh_player_is_turned_away() {
        let state = AppState::default();
        let room_id = create_room(&state, None).await;
        for i in 1..=10 {
            join_room(&state, &room_id, &format!("p{i}"), None)
                .await
                .unwrap();
        }
        assert!(matches!(
            join_room(&state, &room_id, "p11", None).await,
            Err(RoomServiceError::Full(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_and_reserved_ids_are_refused() {
        let state = AppState::default();
        let room_id = create_room(&state, None).await;
        join_room(&state, &room_id, "p1", None).await.unwrap();

        assert!(matches!(
            join_room(&state, &room_id, "p1", None).await,
            Err(RoomServiceError::AlreadyJoined(_))
        ));
        assert!(matches!(
            join_room(&state, &room_id, SYSTEM_ACTOR, None).await,
            Err(RoomServiceError::InvalidPlayerId(_))
        ));
        assert!(matches!(
            join_room(&state, "missing", "p2", None).await,
            Err(RoomServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleted_room_is_gone() {
        let state = AppState::default();
        let room_id = create_room(&state, Some("lobby".to_string())).await;
        assert_eq!(get_rooms(&state).await.len(), 1);

        delete_room(&state, &room_id).await.unwrap();
        assert!(get_rooms(&state).await.is_empty());
        assert!(matches!(
            get_room_info(&state, &room_id).await,
            Err(RoomServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn sessions_follow_membership() {
        let state = AppState::default();
        let room_id = create_room(&state, None).await;
        let (_, alice) = join_room(&state, &room_id, "alice", None).await.unwrap();
        let (_, bob) = join_room(&state, &room_id, "bob", None).await.unwrap();
        assert_ne!(alice, bob);
        assert_eq!(
            state.session(&bob).await.map(|s| s.player_id),
            Some("bob".to_string())
        );

        leave_room(&state, &room_id, "bob").await.unwrap();
        assert!(state.session(&bob).await.is_none());
        assert!(state.session(&alice).await.is_some());

        delete_room(&state, &room_id).await.unwrap();
        assert!(state.session(&alice).await.is_none());
    }

    #[tokio::test]
    async fn only_the_host_hands_over_to_a_member() {
        let state = AppState::default();
        let room_id = create_room(&state, None).await;
        join_room(&state, &room_id, "alice", None).await.unwrap();
        join_room(&state, &room_id, "bob", None).await.unwrap();
        let mut updates = state
            .get_or_create_room_channel(&room_id)
            .await
            .subscribe();

        assert!(matches!(
            transfer_host(&state, &room_id, "bob", "bob").await,
            Err(RoomServiceError::NotHost(_))
        ));
        assert!(matches!(
            transfer_host(&state, &room_id, "alice", "carol").await,
            Err(RoomServiceError::NotMember(_))
        ));

        let room = transfer_host(&state, &room_id, "alice", "bob").await.unwrap();
        assert_eq!(room.host_id.as_deref(), Some("bob"));
        match updates.recv().await.unwrap() {
            RoomEvent::Room(frame) => {
                let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
                assert_eq!(value["type"], "room:update");
                assert_eq!(value["room"]["host_id"], "bob");
            }
            _ => panic!("expected a room update"),
        }
        assert!(matches!(
            transfer_host(&state, &room_id, "alice", "alice").await,
            Err(RoomServiceError::NotHost(_))
        ));
    }
}
