//! Drives the turn engine from external events: start, card selection, the
//! session clock and the delayed continuations.

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at, sleep},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{board::BoardView, scores::ScoresResponse},
    error::ServiceError,
    services::{renderer, score_service, sse_events},
    state::{
        Identity, SharedState,
        deck::Deck,
        engine::{Completion, SelectOutcome},
    },
};

const LOG_GRID_COLUMNS: usize = 4;

/// Deal a freshly shuffled deck and start a session for `identity`.
pub async fn start_session(state: &SharedState, identity: Identity) -> BoardView {
    let deck = Deck::shuffled(&state.config().symbols, &mut rand::rng());
    start_session_with_deck(state, identity, deck).await
}

/// Start a session with a given deck, replacing any session in progress.
pub async fn start_session_with_deck(
    state: &SharedState,
    identity: Identity,
    deck: Deck,
) -> BoardView {
    let uid = identity.uid().map(str::to_owned);
    let board = {
        let mut slot = state.session().await;
        let session_id = slot.engine.start(deck);
        slot.identity = identity;
        slot.replace_timer(spawn_timer(state.clone(), session_id));
        info!(%session_id, player = uid.as_deref().unwrap_or("guest"), "session started");
        renderer::render_board(&slot.engine)
    };

    publish_board(state, &board);
    launch_score_refresh(state, uid);
    board
}

/// Apply a card selection and return the redrawn board.
///
/// Selections that cannot apply are ignored and leave the board as it was.
pub async fn select_card(state: &SharedState, card_id: usize) -> BoardView {
    let board = {
        let mut slot = state.session().await;
        match slot.engine.select(card_id) {
            SelectOutcome::Ignored(reason) => {
                debug!(card_id, ?reason, "selection ignored");
                return renderer::render_board(&slot.engine);
            }
            SelectOutcome::Flipped { .. } => {}
            SelectOutcome::Matched {
                pair,
                points,
                completion,
            } => {
                debug!(?pair, points, "pair matched");
                if let Some(completion) = completion {
                    slot.stop_timer();
                    info!(
                        session_id = %completion.session_id,
                        elapsed_secs = completion.elapsed_secs,
                        moves = completion.moves,
                        score = completion.final_score,
                        "session complete"
                    );
                    launch_completion_writes(state, slot.identity.clone(), completion);
                    spawn_completion_notice(state.clone(), completion);
                }
            }
            SelectOutcome::Mismatched { session_id, pair } => {
                debug!(?pair, "pair mismatched");
                spawn_mismatch_reveal(state.clone(), session_id);
            }
        }
        renderer::render_board(&slot.engine)
    };

    publish_board(state, &board);
    board
}

/// Board of the current session (empty before the first start).
pub async fn current_board(state: &SharedState) -> BoardView {
    let slot = state.session().await;
    renderer::render_board(&slot.engine)
}

/// Read the score readout for `uid` and broadcast it.
pub async fn refresh_scores(
    state: &SharedState,
    uid: Option<&str>,
) -> Result<ScoresResponse, ServiceError> {
    let store = state.require_score_store().await?;
    let scores =
        score_service::display_scores(store.as_ref(), uid, &state.config().game_id).await?;
    sse_events::broadcast_scores(state, &scores);
    Ok(scores)
}

/// Wait until a score store is available, then broadcast the readout of the
/// current player once.
pub async fn refresh_on_load(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    if watcher.wait_for(|degraded| !*degraded).await.is_err() {
        return;
    }
    let uid = state.session().await.identity.uid().map(str::to_owned);
    if let Err(err) = refresh_scores(&state, uid.as_deref()).await {
        warn!(error = %err, "initial score readout failed");
    }
}

fn publish_board(state: &SharedState, board: &BoardView) {
    debug!("board\n{}", renderer::render_text(board, LOG_GRID_COLUMNS));
    sse_events::broadcast_board(state, board);
}

fn launch_score_refresh(state: &SharedState, uid: Option<String>) {
    let state = state.clone();
    score_service::spawn_detached("score refresh", async move {
        refresh_scores(&state, uid.as_deref()).await.map(|_| ())
    });
}

fn launch_completion_writes(state: &SharedState, identity: Identity, completion: Completion) {
    let state = state.clone();
    score_service::spawn_detached("completion writes", async move {
        score_service::persist_completion(&state, &identity, completion.final_score).await?;
        refresh_scores(&state, identity.uid()).await.map(|_| ())
    });
}

/// Session clock. Stops on its own once the session is complete or replaced.
fn spawn_timer(state: SharedState, session_id: Uuid) -> JoinHandle<()> {
    let period = state.config().tick_interval;
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let elapsed = state.session().await.engine.tick(session_id);
            let Some(elapsed) = elapsed else {
                debug!(%session_id, "session clock stopped");
                break;
            };
            sse_events::broadcast_timer_tick(&state, elapsed);
        }
    })
}

fn spawn_mismatch_reveal(state: SharedState, session_id: Uuid) {
    let delay = state.config().mismatch_delay;
    tokio::spawn(async move {
        sleep(delay).await;
        let board = {
            let mut slot = state.session().await;
            if !slot.engine.resolve_mismatch(session_id) {
                debug!(%session_id, "stale mismatch reveal ignored");
                return;
            }
            renderer::render_board(&slot.engine)
        };
        publish_board(&state, &board);
    });
}

fn spawn_completion_notice(state: SharedState, completion: Completion) {
    let delay = state.config().completion_notice_delay;
    tokio::spawn(async move {
        sleep(delay).await;
        if state.session().await.engine.session_id() != Some(completion.session_id) {
            debug!(session_id = %completion.session_id, "stale completion notice ignored");
            return;
        }
        sse_events::broadcast_completion(&state, &completion);
    });
}
