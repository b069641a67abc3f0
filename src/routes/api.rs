use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use tracing::debug;

use crate::{
    dto::{
        game::{AddGameRequest, GameView, ReorderRequest},
        user::UserView,
    },
    error::{AppError, ErrorBody},
    services::{rank_service, user_service},
    state::SharedState,
};

/// JSON counterpart of the games page, plus the users listing.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/games", get(list_games).post(add_game))
        .route("/api/games/reorder", post(reorder_games))
        .route("/api/users", get(list_users))
}

/// Every game ordered by rank.
#[utoipa::path(
    get,
    path = "/api/games",
    tag = "games",
    responses(
        (status = 200, description = "Ranked games", body = [GameView]),
        (status = 500, description = "Storage failure", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn list_games(State(state): State<SharedState>) -> Result<Json<Vec<GameView>>, AppError> {
    let store = state.require_game_store().await?;
    let games = rank_service::list_games(store.as_ref()).await?;
    Ok(Json(games.into_iter().map(GameView::from).collect()))
}

/// Insert a game at the requested rank, shifting the games below it.
#[utoipa::path(
    post,
    path = "/api/games",
    tag = "games",
    request_body = AddGameRequest,
    responses(
        (status = 201, description = "Game inserted; the updated ranking", body = [GameView]),
        (status = 400, description = "Body is not a valid JSON game", body = ErrorBody),
        (status = 409, description = "Rank taken concurrently", body = ErrorBody),
        (status = 422, description = "Invalid title or rank", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn add_game(
    State(state): State<SharedState>,
    payload: Result<Json<AddGameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<GameView>>), AppError> {
    let Json(payload) = payload.map_err(bad_body)?;
    let rank = payload.rank.map(|rank| rank.into_raw()).unwrap_or_default();
    let store = state.require_game_store().await?;
    let games = rank_service::add_game(store.as_ref(), &payload.title, &rank).await?;
    Ok((
        StatusCode::CREATED,
        Json(games.into_iter().map(GameView::from).collect()),
    ))
}

/// Replace the whole ranking with the submitted order.
#[utoipa::path(
    post,
    path = "/api/games/reorder",
    tag = "games",
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Games reordered", body = [GameView]),
        (status = 400, description = "Empty or malformed id list", body = ErrorBody),
        (status = 409, description = "Ids do not match the stored games", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn reorder_games(
    State(state): State<SharedState>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Json<Vec<GameView>>, AppError> {
    let Json(payload) = payload.map_err(bad_body)?;
    let store = state.require_game_store().await?;
    let games = rank_service::reorder_games(store.as_ref(), payload.into_raw_ids()).await?;
    Ok(Json(games.into_iter().map(GameView::from).collect()))
}

/// Undecodable bodies answer with the same JSON error shape as every other failure.
fn bad_body(rejection: JsonRejection) -> AppError {
    debug!(error = %rejection.body_text(), "rejected JSON body");
    AppError::BadRequest("request body is not valid JSON for this endpoint".into())
}

/// Demo users, newest first.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "Users", body = [UserView]),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn list_users(State(state): State<SharedState>) -> Result<Json<Vec<UserView>>, AppError> {
    let store = state.require_game_store().await?;
    let users = user_service::list_users(store.as_ref()).await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}
