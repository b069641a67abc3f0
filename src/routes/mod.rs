use axum::Router;
use tower_http::services::ServeDir;

use crate::state::SharedState;

pub mod api;
pub mod docs;
pub mod games;
pub mod health;
pub mod home;
pub mod htmx;
pub mod users;

/// Compose all route trees, static assets and the 404 fallback.
pub fn router(state: SharedState) -> Router<()> {
    let assets = ServeDir::new(&state.config().public_dir);

    home::router()
        .merge(games::router())
        .merge(users::router())
        .merge(api::router())
        .merge(health::router())
        .merge(docs::router())
        .nest_service("/public", assets)
        .fallback(home::not_found)
        .with_state(state)
}
