use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::{app, state::AppState, utils::test_setup::test_state};
use tower::ServiceExt;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_as(app, None, method, uri, body).await
}

/// Same as `send`, with the caller's session token as a bearer header.
async fn send_as(
    app: &Router,
    token: Option<&str>,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn test_app() -> (Router, AppState) {
    let state = test_state();
    (app::create_app_with_state(state.clone()), state)
}

async fn create_room(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/api/room/create", None).await;
    assert_eq!(status, StatusCode::OK);
    body["room_id"].as_str().unwrap().to_string()
}

/// Joins p1..p10 and returns their session tokens in seat order.
async fn fill_room(app: &Router, room_id: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for i in 1..=10 {
        let (status, body) = send(
            app,
            "POST",
            &format!("/api/room/{}/join", room_id),
            Some(json!({ "player_id": format!("p{i}") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        tokens.push(body["session_token"].as_str().unwrap().to_string());
    }
    tokens
}

#[tokio::test]
async fn test_create_room() {
    let app = app::create_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/room/create")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"friday night"}"#))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let room_id = body["room_id"].as_str().unwrap();

    let (status, room) = send(&app, "GET", &format!("/api/room/{}", room_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["name"], "friday night");
    assert_eq!(room["status"], "Open");
}

#[tokio::test]
async fn test_join_and_leave_room() {
    let (app, _) = test_app();
    let room_id = create_room(&app).await;

    let join = |id: &'static str| json!({ "player_id": id, "name": id.to_uppercase() });
    let (status, joined) = send(&app, "POST", &format!("/api/room/{}/join", room_id), Some(join("alice"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["room"]["host_id"], "alice");
    let alice = joined["session_token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", &format!("/api/room/{}/join", room_id), Some(join("alice"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(&app, "POST", &format!("/api/room/{}/join", room_id), Some(join("bob"))).await;
    let leave = format!("/api/room/{}/leave", room_id);
    let (status, _) = send(&app, "POST", &leave, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, room) = send_as(&app, Some(&alice), "POST", &leave, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["host_id"], "bob");
    assert_eq!(room["players"].as_array().unwrap().len(), 1);

    // 退出したセッションはもう使えない
    let (status, _) = send_as(&app, Some(&alice), "POST", &leave, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_transfer_host_over_http() {
    let (app, _) = test_app();
    let room_id = create_room(&app).await;
    let tokens = fill_room(&app, &room_id).await;
    let transfer = format!("/api/room/{}/transfer-host", room_id);

    let (status, _) = send(&app, "POST", &transfer, Some(json!({ "new_host_player_id": "p2" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_as(
        &app,
        Some(&tokens[2]),
        "POST",
        &transfer,
        Some(json!({ "new_host_player_id": "p3" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("host"));

    let (status, _) = send_as(
        &app,
        Some(&tokens[0]),
        "POST",
        &transfer,
        Some(json!({ "new_host_player_id": "nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, room) = send_as(
        &app,
        Some(&tokens[0]),
        "POST",
        &transfer,
        Some(json!({ "new_host_player_id": "p3" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["host_id"], "p3");

    let start = format!("/api/game/{}/start", room_id);
    let (status, _) = send_as(&app, Some(&tokens[0]), "POST", &start, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send_as(&app, Some(&tokens[2]), "POST", &start, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_room_list_and_delete() {
    let (app, _) = test_app();
    let first = create_room(&app).await;
    let second = create_room(&app).await;

    let (_, rooms) = send(&app, "GET", "/api/room/rooms", None).await;
    let ids: Vec<&str> = rooms
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["room_id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&first.as_str()) && ids.contains(&second.as_str()));

    let (status, _) = send(&app, "DELETE", &format!("/api/room/{}/delete", first), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/room/{}", first), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_game_over_http() {
    let (app, state) = test_app();
    let room_id = create_room(&app).await;
    let (_, host) = server::services::room_service::join_room(&state, &room_id, "p1", None)
        .await
        .unwrap();

    let (status, body) = send_as(&app, Some(&host), "POST", &format!("/api/game/{}/start", room_id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("exactly 10"));

    send_as(&app, Some(&host), "POST", &format!("/api/room/{}/leave", room_id), None).await;
    let tokens = fill_room(&app, &room_id).await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/room/{}/join", room_id),
        Some(json!({ "player_id": "p11" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send_as(&app, Some(&tokens[0]), "POST", &format!("/api/game/{}/start", room_id), None).await;
    assert_eq!(status, StatusCode::OK);

    let view_uri = format!("/api/game/{}/view", room_id);
    let (status, view) = send_as(&app, Some(&tokens[1]), "GET", &view_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["public"]["step"], "setup:reveal_roles");
    assert_eq!(view["private"]["playerId"], "p2");
    assert_eq!(view["availableActions"][0]["type"], "ready");

    for (i, token) in tokens.iter().enumerate() {
        let (status, view) = send_as(
            &app,
            Some(token),
            "POST",
            &format!("/api/game/{}/actions", room_id),
            Some(json!({ "type": "ready", "playerId": format!("p{}", i + 1) })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["private"]["playerId"], format!("p{}", i + 1));
    }

    let (_, view) = send_as(&app, Some(&tokens[1]), "GET", &view_uri, None).await;
    assert_eq!(view["public"]["phase"], "night_first");

    // 村人は夜に何もできない
    let mut villager = None;
    for token in &tokens {
        let (_, view) = send_as(&app, Some(token), "GET", &view_uri, None).await;
        if view["private"]["role"] == "villager" {
            villager = Some((token.clone(), view["private"]["playerId"].clone()));
            break;
        }
    }
    let (token, villager) = villager.unwrap();
    let (status, body) = send_as(
        &app,
        Some(&token),
        "POST",
        &format!("/api/game/{}/actions", room_id),
        Some(json!({ "type": "witch:skip", "playerId": villager })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("witch:skip"));

    let (status, body) = send(&app, "GET", &format!("/api/game/{}/check-winner", room_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["finished"], false);
}

#[tokio::test]
async fn test_game_routes_need_a_session() {
    let (app, _) = test_app();
    let room_id = create_room(&app).await;
    let tokens = fill_room(&app, &room_id).await;
    let other_room = create_room(&app).await;
    let (_, joined) = send(
        &app,
        "POST",
        &format!("/api/room/{}/join", other_room),
        Some(json!({ "player_id": "p1" })),
    )
    .await;
    let outsider = joined["session_token"].as_str().unwrap().to_string();
    send_as(&app, Some(&tokens[0]), "POST", &format!("/api/game/{}/start", room_id), None).await;

    let view_uri = format!("/api/game/{}/view", room_id);
    let (status, _) = send(&app, "GET", &view_uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send_as(&app, Some("forged"), "GET", &view_uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // 別ルームのトークンは使えない
    let (status, _) = send_as(&app, Some(&outsider), "GET", &view_uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let actions_uri = format!("/api/game/{}/actions", room_id);
    let ready = json!({ "type": "ready", "playerId": "p2" });
    let (status, _) = send(&app, "POST", &actions_uri, Some(ready.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 本文で p2 を名乗っても p5 として扱われる
    let (status, view) = send_as(&app, Some(&tokens[4]), "POST", &actions_uri, Some(ready)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["private"]["playerId"], "p5");
    assert_eq!(view["public"]["readyPlayers"], json!(["p5"]));
}

#[tokio::test]
async fn test_unknown_room_game_routes() {
    let (app, _) = test_app();
    let (status, body) = send(&app, "GET", "/api/game/missing/check-winner", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
