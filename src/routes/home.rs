use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Html,
    routing::get,
};
use time::OffsetDateTime;

use crate::{state::SharedState, view};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(home))
        .route("/animals", get(animals))
        .route("/home/htmx/clicked", get(clicked))
}

pub async fn home(State(state): State<SharedState>) -> Html<String> {
    Html(view::home::page(state.config()))
}

pub async fn animals(State(state): State<SharedState>) -> Html<String> {
    Html(view::home::animals_page(state.config()))
}

/// Fragment with the server's local time.
pub async fn clicked() -> Html<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    Html(view::home::clicked_fragment(now))
}

/// Fallback for every unknown path.
pub async fn not_found(State(state): State<SharedState>) -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(view::not_found_page(state.config())),
    )
}
