use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::scores::{ScoresQuery, ScoresResponse},
    error::AppError,
    services::score_service,
    state::SharedState,
};

/// Score readout endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/scores/{game_id}", get(get_scores))
}

#[utoipa::path(
    get,
    path = "/scores/{game_id}",
    tag = "scores",
    params(
        ("game_id" = String, Path, description = "Game the scores belong to"),
        ScoresQuery
    ),
    responses(
        (status = 200, description = "User and high score", body = ScoresResponse),
        (status = 503, description = "No score store available")
    )
)]
/// Return the player's last score and the global high score.
pub async fn get_scores(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Query(query): Query<ScoresQuery>,
) -> Result<Json<ScoresResponse>, AppError> {
    let scores = score_service::scores_for(&state, &game_id, query.uid.as_deref()).await?;
    Ok(Json(scores))
}
