use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Extension, Json, Router,
};

use super::auth_middleware::auth_middleware;
use crate::{
    models::{
        message::{
            CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse,
            TransferHostRequest,
        },
        session::Session,
    },
    services::room_service::{self, RoomServiceError},
    state::AppState,
    utils::websocket,
};

pub fn routes(state: AppState) -> Router {
    Router::new()
        // ルーム脱退（セッションの持ち主が抜ける）
        // curl -X POST -H 'Authorization: Bearer {token}' http://localhost:8080/api/room/{roomid}/leave
        .route("/:roomid/leave", post(leave_room))
        // ホスト権限の譲渡
        // curl -X POST -H 'Authorization: Bearer {token}' -H 'Content-Type: application/json' -d '{"new_host_player_id":"p2"}' http://localhost:8080/api/room/{roomid}/transfer-host
        .route("/:roomid/transfer-host", post(transfer_host))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        // ルーム作成
        // curl -X POST http://localhost:8080/api/room/create
        .route("/create", post(create_room))
        // ルーム一覧取得
        // curl http://localhost:8080/api/room/rooms
        .route("/rooms", get(get_rooms))
        // 特定のルーム情報取得
        // curl http://localhost:8080/api/room/{roomid}
        .route("/:roomid", get(get_room_info))
        // ルーム参加
        // curl -X POST -H 'Content-Type: application/json' -d '{"player_id":"p1"}' http://localhost:8080/api/room/{roomid}/join
        .route("/:roomid/join", post(join_room))
        // ルーム削除
        // curl -X DELETE http://localhost:8080/api/room/{roomid}/delete
        .route("/:roomid/delete", delete(delete_room))
        // WebSocket接続
        // websocat 'ws://localhost:8080/api/room/{roomid}/ws?token={token}'
        .route("/:roomid/ws", get(websocket::handler))
        .with_state(state)
}

impl IntoResponse for RoomServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            RoomServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            RoomServiceError::NotMember(_) => StatusCode::NOT_FOUND,
            RoomServiceError::AlreadyJoined(_) => StatusCode::CONFLICT,
            RoomServiceError::NotOpen(_) | RoomServiceError::Full(_) => StatusCode::CONFLICT,
            RoomServiceError::InvalidPlayerId(_) => StatusCode::BAD_REQUEST,
            RoomServiceError::NotHost(_) => StatusCode::FORBIDDEN,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// 作成時の名前は任意なのでボディなしも受け付ける
pub async fn create_room(
    State(state): State<AppState>,
    body: Option<Json<CreateRoomRequest>>,
) -> impl IntoResponse {
    let name = body.and_then(|Json(req)| req.name);
    let room_id = room_service::create_room(&state, name).await;
    (StatusCode::OK, Json(CreateRoomResponse { room_id }))
}

async fn get_rooms(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = room_service::get_rooms(&state).await;
    (StatusCode::OK, Json(rooms))
}

async fn get_room_info(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, RoomServiceError> {
    let room = room_service::get_room_info(&state, &room_id).await?;
    Ok((StatusCode::OK, Json(room)))
}

pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(req): Json<JoinRoomRequest>,
) -> Result<impl IntoResponse, RoomServiceError> {
    let (room, session_token) =
        room_service::join_room(&state, &room_id, &req.player_id, req.name).await?;
    Ok((StatusCode::OK, Json(JoinRoomResponse { room, session_token })))
}

/// A session only speaks for the room it was issued in.
fn ensure_room(session: &Session, room_id: &str) -> Result<(), RoomServiceError> {
    if session.room_id == room_id {
        Ok(())
    } else {
        Err(RoomServiceError::NotMember(session.player_id.clone()))
    }
}

pub async fn leave_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, RoomServiceError> {
    ensure_room(&session, &room_id)?;
    let room = room_service::leave_room(&state, &room_id, &session.player_id).await?;
    Ok((StatusCode::OK, Json(room)))
}

async fn transfer_host(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
    Json(req): Json<TransferHostRequest>,
) -> Result<impl IntoResponse, RoomServiceError> {
    ensure_room(&session, &room_id)?;
    let room = room_service::transfer_host(
        &state,
        &room_id,
        &session.player_id,
        &req.new_host_player_id,
    )
    .await?;
    Ok((StatusCode::OK, Json(room)))
}

async fn delete_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, RoomServiceError> {
    room_service::delete_room(&state, &room_id).await?;
    Ok((
        StatusCode::OK,
        Json(format!("Room {} deleted successfully", room_id)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::room::Room;
    use axum::{body::to_bytes, body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_create_room() {
        let state = AppState::default();
        let app = routes(state);

        let request = Request::builder()
            .method("POST")
            .uri("/create")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let created: CreateRoomResponse = serde_json::from_slice(&body).unwrap();
        assert!(!created.room_id.is_empty());
    }

    #[tokio::test]
    async fn test_get_rooms() {
        let state = AppState::default();
        let app = routes(state.clone());

        // テスト用のルームを作成
        let room_id = room_service::create_room(&state, None).await;

        let request = Request::builder()
            .method("GET")
            .uri("/rooms")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let rooms: Vec<Room> =
            serde_json::from_slice(&body).expect("Failed to parse response body");

        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].room_id, room_id);
    }

    #[tokio::test]
    async fn test_unknown_room_is_404() {
        let app = routes(AppState::default());

        let request = Request::builder()
            .method("GET")
            .uri("/nope")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("nope"));
    }
}
