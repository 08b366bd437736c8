use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the memory-match backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::game::start_game,
        crate::routes::game::select_card,
        crate::routes::game::get_board,
        crate::routes::scores::get_scores,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::StartGameRequest,
            crate::dto::game::PlayerInput,
            crate::dto::board::BoardView,
            crate::dto::board::CardView,
            crate::dto::board::VisiblePhase,
            crate::dto::scores::ScoresResponse,
            crate::dto::sse::TimerTick,
            crate::dto::sse::CompletionNotice,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "game", description = "Session start, card selection and board reads"),
        (name = "scores", description = "User and high score readout"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_game_routes_and_start_payload() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/game/start"));
        assert!(doc.paths.paths.contains_key("/game/cards/{card_id}/select"));
        assert!(doc.paths.paths.contains_key("/scores/{game_id}"));

        let schemas = &doc.components.as_ref().unwrap().schemas;
        assert!(schemas.contains_key("StartGameRequest"));
        assert!(schemas.contains_key("PlayerInput"));
    }
}
