use axum::{
    Router,
    extract::{RawForm, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tracing::{error, warn};

use crate::{
    dao::models::GameEntity,
    dto::{
        game::{AddGameForm, OldInput, reorder_ids_from_form},
        validation::{FORM_FIELD, FieldErrors},
    },
    error::{RANK_TAKEN_MESSAGE, ServiceError},
    routes::htmx::RenderMode,
    services::rank_service,
    state::SharedState,
    view::games::{GamesListing, list_fragment, page},
};

const GAMES_PATH: &str = "/games";
const DEGRADED_MESSAGE: &str = "Storage is unavailable right now. Please try again later.";

/// HTML routes of the ranked games page.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(GAMES_PATH, get(show_games).post(add_game))
        .route("/games/reorder", post(reorder_games))
}

/// Full games page.
pub async fn show_games(State(state): State<SharedState>) -> Response {
    let outcome = match state.require_game_store().await {
        Ok(store) => rank_service::list_games(store.as_ref()).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(games) => {
            let errors = FieldErrors::new();
            render(&state, RenderMode::Page, StatusCode::OK, &games, &errors, None)
        }
        Err(err) => fail(&state, RenderMode::Page, err, "load games", None).await,
    }
}

/// Insert a game from the add form.
pub async fn add_game(
    State(state): State<SharedState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> Response {
    let mode = RenderMode::from_headers(&headers);
    let form = AddGameForm::from_urlencoded(&body);
    let title = form.title.unwrap_or_default();
    let rank = form.rank.unwrap_or_default();

    let outcome = match state.require_game_store().await {
        Ok(store) => rank_service::add_game(store.as_ref(), &title, &rank).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(games) => succeed(&state, mode, &games),
        Err(err) => {
            let old = OldInput::new(&title, &rank);
            fail(&state, mode, err, "add game", Some(&old)).await
        }
    }
}

/// Apply the order of the `game` fields, as laid out in the DOM.
pub async fn reorder_games(
    State(state): State<SharedState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> Response {
    let mode = RenderMode::from_headers(&headers);
    let ids = reorder_ids_from_form(&body);

    let outcome = match state.require_game_store().await {
        Ok(store) => rank_service::reorder_games(store.as_ref(), ids).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(games) => succeed(&state, mode, &games),
        Err(err) => fail(&state, mode, err, "reorder games", None).await,
    }
}

/// Fresh fragment for htmx, otherwise Post/Redirect/Get back to the page.
fn succeed(state: &SharedState, mode: RenderMode, games: &[GameEntity]) -> Response {
    match mode {
        RenderMode::Fragment => {
            render(state, mode, StatusCode::OK, games, &FieldErrors::new(), None)
        }
        RenderMode::Page => Redirect::to(GAMES_PATH).into_response(),
    }
}

/// Re-render the ranking with the failure explained next to the form.
async fn fail(
    state: &SharedState,
    mode: RenderMode,
    err: ServiceError,
    action: &str,
    old: Option<&OldInput>,
) -> Response {
    let (status, errors) = failure_fields(err, action);
    let games = current_games(state).await;
    render(state, mode, status, &games, &errors, old)
}

fn failure_fields(err: ServiceError, action: &str) -> (StatusCode, FieldErrors) {
    let mut errors = FieldErrors::new();
    let status = match err {
        ServiceError::Validation(fields) => return (StatusCode::UNPROCESSABLE_ENTITY, fields),
        ServiceError::RankConflict { rank } => {
            warn!(rank, "rank claimed concurrently");
            errors.insert("rank", RANK_TAKEN_MESSAGE);
            StatusCode::CONFLICT
        }
        ServiceError::Conflict(message) => {
            errors.insert(FORM_FIELD, message);
            StatusCode::CONFLICT
        }
        ServiceError::InvalidInput(message) => {
            errors.insert(FORM_FIELD, message);
            StatusCode::BAD_REQUEST
        }
        ServiceError::Degraded => {
            errors.insert(FORM_FIELD, DEGRADED_MESSAGE);
            StatusCode::SERVICE_UNAVAILABLE
        }
        ServiceError::Unavailable(source) => {
            error!(action, error = %source, "storage failure");
            errors.insert(FORM_FIELD, format!("Failed to {action}. Please try again."));
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, errors)
}

/// Best-effort listing for error pages; an unreachable store shows an empty list.
async fn current_games(state: &SharedState) -> Vec<GameEntity> {
    let Ok(store) = state.require_game_store().await else {
        return Vec::new();
    };
    rank_service::list_games(store.as_ref())
        .await
        .unwrap_or_else(|err| {
            warn!(error = %err, "failed to list games for error page");
            Vec::new()
        })
}

fn render(
    state: &SharedState,
    mode: RenderMode,
    status: StatusCode,
    games: &[GameEntity],
    errors: &FieldErrors,
    old: Option<&OldInput>,
) -> Response {
    let listing = GamesListing { games, errors, old };
    let html = match mode {
        RenderMode::Fragment => list_fragment(&listing),
        RenderMode::Page => page(state.config(), &listing),
    };
    (mode.status(status), Html(html)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::storage::StorageError;

    #[test]
    fn storage_failures_become_a_form_error() {
        let io = std::io::Error::other("connection reset");
        let err = ServiceError::Unavailable(StorageError::unavailable("insert".into(), io));

        let (status, errors) = failure_fields(err, "add game");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            errors.get(FORM_FIELD),
            Some("Failed to add game. Please try again.")
        );
    }

    #[test]
    fn rank_conflicts_are_reported_on_the_rank_field() {
        let (status, errors) = failure_fields(ServiceError::RankConflict { rank: 2 }, "add game");
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(errors.get("rank"), Some(RANK_TAKEN_MESSAGE));
        assert_eq!(errors.get(FORM_FIELD), None);
    }

    #[test]
    fn degraded_mode_is_service_unavailable() {
        let (status, errors) = failure_fields(ServiceError::Degraded, "reorder games");
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(errors.get(FORM_FIELD), Some(DEGRADED_MESSAGE));
    }
}
