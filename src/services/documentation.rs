use utoipa::OpenApi;

#[derive(OpenApi)]
/// OpenAPI document of the JSON and health routes.
#[openapi(
    info(title = "Game Rank", description = "Dense, unique game rankings"),
    paths(
        crate::routes::api::list_games,
        crate::routes::api::add_game,
        crate::routes::api::reorder_games,
        crate::routes::api::list_users,
        crate::routes::health::healthz,
        crate::routes::health::healthcheck,
    ),
    components(
        schemas(
            crate::dto::game::GameView,
            crate::dto::game::AddGameRequest,
            crate::dto::game::ReorderRequest,
            crate::dto::user::UserView,
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::validation::FieldErrors,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "games", description = "Ranked games"),
        (name = "users", description = "Demo users"),
        (name = "health", description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_json_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/games",
            "/api/games/reorder",
            "/api/users",
            "/healthz",
            "/healthcheck",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
