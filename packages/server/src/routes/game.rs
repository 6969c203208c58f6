use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use tracing::error;
use werewolf_engine::{ActionError, GameAction};

use super::auth_middleware::auth_middleware;
use crate::models::session::Session;
use crate::services::game_service::{self, GameServiceError};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/:roomid",
            Router::new()
                // ゲームの開始（ホストのみ、10人揃っている必要がある）
                .route("/start", post(start_game))
                // ゲームアクション
                .route("/actions", post(submit_action_handler))
                // 呼び出し元プレイヤーのビュー
                .route("/view", get(player_view_handler))
                // ここまでの経路はセッショントークンが必要
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                ))
                .route("/check-winner", get(check_winner_handler)),
        )
        .with_state(state)
}

impl IntoResponse for GameServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            GameServiceError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            GameServiceError::GameNotStarted(_) | GameServiceError::AlreadyStarted(_) => {
                StatusCode::CONFLICT
            }
            GameServiceError::NotMember(_) | GameServiceError::NotHost(_) => {
                StatusCode::FORBIDDEN
            }
            GameServiceError::Init(_) => StatusCode::BAD_REQUEST,
            GameServiceError::Action(e) => match e {
                ActionError::UnknownActor(_) | ActionError::NotPrivileged(_) => {
                    StatusCode::FORBIDDEN
                }
                ActionError::GameFinished => StatusCode::CONFLICT,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            GameServiceError::View(_) => StatusCode::NOT_FOUND,
            GameServiceError::Encode(e) => {
                error!(error = %e, "failed to encode response");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

/// A session only speaks for the room it was issued in.
fn ensure_room(session: &Session, room_id: &str) -> Result<(), GameServiceError> {
    if session.room_id == room_id {
        Ok(())
    } else {
        Err(GameServiceError::NotMember(session.player_id.clone()))
    }
}

pub async fn start_game(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, GameServiceError> {
    ensure_room(&session, &room_id)?;
    let message = game_service::start_game(&state, &room_id, &session.player_id).await?;
    Ok((StatusCode::OK, Json(message)))
}

async fn submit_action_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
    Json(mut action): Json<GameAction>,
) -> Result<impl IntoResponse, GameServiceError> {
    ensure_room(&session, &room_id)?;
    // 本文の playerId は信用せず、セッションの持ち主として実行する
    action.player_id = session.player_id;
    let view = game_service::submit_action(&state, &room_id, action).await?;
    Ok((StatusCode::OK, Json(view)))
}

async fn player_view_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, GameServiceError> {
    ensure_room(&session, &room_id)?;
    let view = game_service::player_view(&state, &room_id, &session.player_id).await?;
    Ok((StatusCode::OK, Json(view)))
}

async fn check_winner_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, GameServiceError> {
    let result = game_service::check_winner(&state, &room_id).await?;
    Ok((StatusCode::OK, Json(result)))
}
