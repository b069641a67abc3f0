use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    dao::models::UserEntity,
    dto::user::DeleteUserQuery,
    error::{AppError, ServiceError},
    services::user_service,
    state::SharedState,
    view::home::users_fragment,
};

/// Demo user fragments driven by the home page.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/insert-users", post(seed_users))
        .route("/users", get(list_users))
        .route(
            "/home/htmx/users",
            get(list_users).post(add_random_user).delete(delete_user),
        )
}

pub async fn list_users(State(state): State<SharedState>) -> Response {
    let outcome = match state.require_game_store().await {
        Ok(store) => user_service::list_users(store.as_ref()).await,
        Err(err) => Err(err),
    };
    respond(outcome)
}

/// Insert Alice and Bob.
pub async fn seed_users(State(state): State<SharedState>) -> Response {
    let outcome = match state.require_game_store().await {
        Ok(store) => user_service::seed_users(store.as_ref()).await,
        Err(err) => Err(err),
    };
    respond(outcome)
}

pub async fn add_random_user(State(state): State<SharedState>) -> Response {
    let outcome = match state.require_game_store().await {
        Ok(store) => user_service::add_random_user(store.as_ref()).await,
        Err(err) => Err(err),
    };
    respond(outcome)
}

/// Delete `?id=` and return the remaining users.
pub async fn delete_user(
    State(state): State<SharedState>,
    Query(query): Query<DeleteUserQuery>,
) -> Response {
    let outcome = match state.require_game_store().await {
        Ok(store) => user_service::delete_user(store.as_ref(), query.id.as_deref()).await,
        Err(err) => Err(err),
    };
    respond(outcome)
}

/// Users fragment, or a plain-text error with the mapped status.
fn respond(outcome: Result<Vec<UserEntity>, ServiceError>) -> Response {
    match outcome {
        Ok(users) => Html(users_fragment(&users)).into_response(),
        Err(err) => {
            let err = AppError::from(err);
            (err.status(), err.to_string()).into_response()
        }
    }
}
