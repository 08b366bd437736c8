use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{board::BoardView, game::StartGameRequest},
    services::session_service,
    state::SharedState,
};

/// Session start, card selection and board reads.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game/start", post(start_game))
        .route("/game/cards/{card_id}/select", post(select_card))
        .route("/game/board", get(get_board))
}

#[utoipa::path(
    post,
    path = "/game/start",
    tag = "game",
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Freshly dealt board", body = BoardView),
        (status = 400, description = "Invalid player identity")
    )
)]
/// Deal a new deck and start (or restart) the session.
pub async fn start_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<StartGameRequest>>,
) -> Json<BoardView> {
    Json(session_service::start_session(&state, payload.into()).await)
}

#[utoipa::path(
    post,
    path = "/game/cards/{card_id}/select",
    tag = "game",
    params(("card_id" = usize, Path, description = "Position of the card on the board")),
    responses((status = 200, description = "Board after the selection", body = BoardView))
)]
/// Turn a card face up. Selections that cannot apply leave the board unchanged.
pub async fn select_card(
    State(state): State<SharedState>,
    Path(card_id): Path<usize>,
) -> Json<BoardView> {
    Json(session_service::select_card(&state, card_id).await)
}

#[utoipa::path(
    get,
    path = "/game/board",
    tag = "game",
    responses((status = 200, description = "Current board", body = BoardView))
)]
/// Return the current board.
pub async fn get_board(State(state): State<SharedState>) -> Json<BoardView> {
    Json(session_service::current_board(&state).await)
}
