use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use game_rank::{
    config::AppConfig,
    dao::game_store::memory::MemoryGameStore,
    error::STALE_ORDER_MESSAGE,
    routes,
    state::AppState,
};

const FORM: &str = "application/x-www-form-urlencoded";

fn app() -> Router {
    let state = AppState::with_store(AppConfig::default(), Arc::new(MemoryGameStore::new()));
    routes::router(state)
}

fn degraded_app() -> Router {
    routes::router(AppState::new(AppConfig::default()))
}

fn form_post(uri: &str, body: &str, htmx: bool) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, FORM);
    if htmx {
        builder = builder.header("HX-Request", "true");
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

fn json_post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

struct Reply {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_owned());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    Reply {
        status,
        location,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

async fn add(app: &Router, title: &str, rank: i64) {
    let reply = send(app, form_post("/games", &format!("title={title}&rank={rank}"), true)).await;
    assert_eq!(reply.status, StatusCode::OK);
}

/// `(id, title)` pairs in rank order.
async fn ranking(app: &Router) -> Vec<(i64, String)> {
    let reply = send(app, get("/api/games")).await;
    assert_eq!(reply.status, StatusCode::OK);
    let games: Value = serde_json::from_str(&reply.body).unwrap();
    games
        .as_array()
        .unwrap()
        .iter()
        .map(|game| {
            (
                game["id"].as_i64().unwrap(),
                game["title"].as_str().unwrap().to_owned(),
            )
        })
        .collect()
}

fn titles(ranking: &[(i64, String)]) -> Vec<&str> {
    ranking.iter().map(|(_, title)| title.as_str()).collect()
}

#[tokio::test]
async fn games_page_renders_the_fragment_inside_the_layout() {
    let app = app();
    let reply = send(&app, get("/games")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.starts_with("<!doctype html>"));
    assert!(reply.body.contains(r#"<div id="games__list">"#));
}

#[tokio::test]
async fn plain_form_post_redirects_after_insert() {
    let app = app();
    let reply = send(&app, form_post("/games", "title=Chess&rank=1", false)).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/games"));
    assert_eq!(titles(&ranking(&app).await), vec!["Chess"]);
}

#[tokio::test]
async fn htmx_insert_returns_the_fresh_fragment() {
    let app = app();
    add(&app, "Chess", 1).await;
    let reply = send(&app, form_post("/games", "title=Tetris&rank=1", true)).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(!reply.body.contains("<!doctype html>"));
    let tetris = reply.body.find("Tetris").unwrap();
    let chess = reply.body.find("Chess").unwrap();
    assert!(tetris < chess);
}

#[tokio::test]
async fn validation_failure_is_422_for_pages_and_200_for_htmx() {
    let app = app();

    let reply = send(&app, form_post("/games", "title=ab&rank=5", false)).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.body.contains("The title must be at least 3 characters long."));
    assert!(reply.body.contains("Rank must be between 1 and 1."));
    assert!(reply.body.contains(r#"value="ab""#));

    let reply = send(&app, form_post("/games", "title=ab&rank=5", true)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("The title must be at least 3 characters long."));

    assert!(ranking(&app).await.is_empty());
}

#[tokio::test]
async fn missing_fields_are_reported_not_rejected() {
    let app = app();
    let reply = send(&app, form_post("/games", "", false)).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.body.contains("Title is required."));
    assert!(reply.body.contains("Rank must be a number."));
}

#[tokio::test]
async fn reorder_applies_dom_order() {
    let app = app();
    for (rank, title) in ["Chess", "Zelda", "Tetris"].iter().enumerate() {
        add(&app, title, rank as i64 + 1).await;
    }
    let games = ranking(&app).await;
    let body = format!("game={}&game={}&game={}", games[2].0, games[0].0, games[1].0);

    let reply = send(&app, form_post("/games/reorder", &body, false)).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(titles(&ranking(&app).await), vec!["Tetris", "Chess", "Zelda"]);
}

#[tokio::test]
async fn stale_reorder_is_a_conflict() {
    let app = app();
    add(&app, "Chess", 1).await;
    add(&app, "Zelda", 2).await;
    let games = ranking(&app).await;
    let body = format!("game={}", games[1].0);

    let reply = send(&app, form_post("/games/reorder", &body, false)).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert!(reply.body.contains(STALE_ORDER_MESSAGE));

    let reply = send(&app, form_post("/games/reorder", &body, true)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains(STALE_ORDER_MESSAGE));

    assert_eq!(ranking(&app).await, games);
}

#[tokio::test]
async fn malformed_reorder_is_a_bad_request() {
    let app = app();
    add(&app, "Chess", 1).await;

    let reply = send(&app, form_post("/games/reorder", "game=abc", false)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(&app, form_post("/games/reorder", "", false)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("No games were submitted."));
}

#[tokio::test]
async fn json_api_mirrors_the_form_contract() {
    let app = app();

    let reply = send(
        &app,
        json_post("/api/games", serde_json::json!({"title": "Chess", "rank": 1})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let reply = send(
        &app,
        json_post("/api/games", serde_json::json!({"title": "x", "rank": "9"})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_str(&reply.body).unwrap();
    assert!(body["fields"]["title"].is_string());
    assert_eq!(body["fields"]["rank"], "Rank must be between 1 and 2.");

    let games = ranking(&app).await;
    let reply = send(
        &app,
        json_post("/api/games/reorder", serde_json::json!({"ids": [games[0].0, 999]})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn repeated_add_fields_keep_the_first_value() {
    let app = app();
    let reply = send(
        &app,
        form_post("/games", "title=Chess&title=Tetris&rank=1&rank=9", true),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains(r#"<div id="games__list">"#));
    assert_eq!(titles(&ranking(&app).await), vec!["Chess"]);

    let reply = send(&app, form_post("/games", "title=ab&title=Zelda&rank=7", false)).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.body.contains(r#"value="ab""#));
    assert!(reply.body.contains("Chess"));
}

fn raw_json_post(uri: &str, body: &'static str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn undecodable_json_is_a_bad_request_with_an_error_body() {
    let app = app();
    add(&app, "Chess", 1).await;

    let requests = [
        json_post("/api/games/reorder", serde_json::json!({"ids": [null]})),
        raw_json_post("/api/games/reorder", "not json"),
        raw_json_post("/api/games", "{\"title\": "),
        Request::post("/api/games")
            .body(Body::from(r#"{"title": "Zelda", "rank": 1}"#))
            .unwrap(),
    ];
    for request in requests {
        let reply = send(&app, request).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&reply.body).unwrap();
        assert!(body["message"].as_str().unwrap().starts_with("bad request"));
    }

    assert_eq!(titles(&ranking(&app).await), vec!["Chess"]);
}

#[tokio::test]
async fn degraded_mode_answers_503() {
    let app = degraded_app();

    let reply = send(&app, form_post("/games", "title=Chess&rank=1", false)).await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);

    let reply = send(&app, get("/api/games")).await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);

    let reply = send(&app, get("/healthcheck")).await;
    assert_eq!(reply.status, StatusCode::OK);
    let body: Value = serde_json::from_str(&reply.body).unwrap();
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn health_and_fallback_routes() {
    let app = app();

    let reply = send(&app, get("/healthz")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, "ok");

    let reply = send(&app, get("/healthcheck")).await;
    let body: Value = serde_json::from_str(&reply.body).unwrap();
    assert_eq!(body["status"], "ok");

    let reply = send(&app, get("/animals")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("<h1>Animals</h1>"));

    let reply = send(&app, get("/no/such/page")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body.contains("<h1>404</h1>"));
}

#[tokio::test]
async fn user_fragments() {
    let app = app();

    let reply = send(&app, form_post("/insert-users", "", true)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Alice (25)"));
    assert!(reply.body.contains("Bob (30)"));

    let delete = Request::delete("/home/htmx/users").body(Body::empty()).unwrap();
    let reply = send(&app, delete).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let delete = Request::delete("/home/htmx/users?id=nope")
        .body(Body::empty())
        .unwrap();
    let reply = send(&app, delete).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let users: Value =
        serde_json::from_str(&send(&app, get("/api/users")).await.body).unwrap();
    let bob = users[0]["id"].as_i64().unwrap();
    let delete = Request::delete(format!("/home/htmx/users?id={bob}"))
        .body(Body::empty())
        .unwrap();
    let reply = send(&app, delete).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(!reply.body.contains("Bob"));
}
