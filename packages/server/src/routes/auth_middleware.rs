use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::state::AppState;

/// Resolves `Authorization: Bearer <session token>` to the caller's
/// [`Session`](crate::models::session::Session) and stores it in the request
/// extensions. Handlers behind it never take a player id from the client.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    // ヘッダーからトークンを取得
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "session token required" })),
            )
        })?;

    let session = state.session(&token).await.ok_or_else(|| {
        debug!("unknown session token");
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid session token" })),
        )
    })?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
