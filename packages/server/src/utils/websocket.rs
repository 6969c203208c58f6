use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{debug, info, warn};

use crate::models::message::{ClientMessage, ServerMessage};
use crate::services::{game_service, room_service};
use crate::state::{AppState, RoomEvent};

/// Browsers cannot set headers on a socket upgrade, so the session token rides in the query.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, params.token))
}

async fn refuse(mut ws: WebSocket, message: String) {
    if let Some(frame) = error_frame(message) {
        let _ = ws.send(Message::Text(frame)).await;
    }
    let _ = ws.send(Message::Close(None)).await;
}

fn error_frame(message: impl Into<String>) -> Option<String> {
    serde_json::to_string(&ServerMessage::Error {
        message: message.into(),
    })
    .ok()
}

/// Latest view frame for one member, if a game is running.
async fn current_view(state: &AppState, room_id: &str, player_id: &str) -> Option<String> {
    match game_service::views_for(state, room_id).await {
        Ok(Some(mut views)) => views.remove(player_id),
        _ => None,
    }
}

pub async fn handle_socket(ws: WebSocket, state: AppState, room_id: String, token: String) {
    let player_id = match state.session(&token).await {
        Some(session) if session.room_id == room_id => session.player_id,
        _ => {
            warn!(room_id = %room_id, "socket refused: invalid session token");
            refuse(ws, format!("invalid session token for room {}", room_id)).await;
            return;
        }
    };
    let is_member = room_service::get_room_info(&state, &room_id)
        .await
        .map(|room| room.is_member(&player_id))
        .unwrap_or(false);
    if !is_member {
        warn!(room_id = %room_id, player_id = %player_id, "socket refused: not a room member");
        refuse(ws, format!("player {} is not in room {}", player_id, room_id)).await;
        return;
    }
    info!(room_id = %room_id, player_id = %player_id, "websocket connected");

    // 購読してから現在のビューを取るので、その間の更新を取りこぼさない
    let mut rx = state.get_or_create_room_channel(&room_id).await.subscribe();
    let (direct_tx, mut direct_rx) = mpsc::unbounded_channel::<String>();
    if let Some(frame) = current_view(&state, &room_id, &player_id).await {
        let _ = direct_tx.send(frame);
    }

    let (mut sender, mut receiver) = ws.split();

    let send_state = state.clone();
    let send_room = room_id.clone();
    let send_player = player_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                Some(frame) = direct_rx.recv() => frame,
                event = rx.recv() => match event {
                    Ok(RoomEvent::Views(views)) => match views.get(&send_player) {
                        Some(frame) => frame.clone(),
                        None => continue,
                    },
                    Ok(RoomEvent::Room(frame)) => frame.as_ref().clone(),
                    Ok(RoomEvent::Closed) | Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(room_id = %send_room, skipped, "socket lagged, resending current view");
                        match current_view(&send_state, &send_room, &send_player).await {
                            Some(frame) => frame,
                            None => continue,
                        }
                    }
                },
            };
            if let Err(e) = sender.send(Message::Text(frame)).await {
                debug!(room_id = %send_room, error = %e, "socket send failed");
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let recv_room = room_id.clone();
    let recv_player = player_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            let failure = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::GameAction { mut action }) => {
                    // ソケットの持ち主として実行する
                    action.player_id = recv_player.clone();
                    game_service::submit_action(&state, &recv_room, action)
                        .await
                        .err()
                        .map(|e| e.to_string())
                }
                Ok(ClientMessage::TransferHost { new_host_player_id }) => {
                    room_service::transfer_host(&state, &recv_room, &recv_player, &new_host_player_id)
                        .await
                        .err()
                        .map(|e| e.to_string())
                }
                Err(e) => Some(format!("malformed message: {}", e)),
            };

            // 失敗は送信元のソケットだけに返す
            if let Some(message) = failure {
                debug!(room_id = %recv_room, player_id = %recv_player, %message, "action failed");
                if let Some(frame) = error_frame(message) {
                    if direct_tx.send(frame).is_err() {
                        break;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    info!(room_id = %room_id, player_id = %player_id, "websocket closed");
}
