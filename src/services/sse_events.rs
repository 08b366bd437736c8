use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        board::BoardView,
        format_elapsed,
        scores::ScoresResponse,
        sse::{CompletionNotice, ServerEvent, SystemStatus, TimerTick},
    },
    state::{AppState, engine::Completion},
};

const EVENT_BOARD_UPDATED: &str = "board.updated";
const EVENT_TIMER_TICK: &str = "timer.tick";
const EVENT_SCORES_UPDATED: &str = "scores.updated";
const EVENT_GAME_COMPLETED: &str = "game.completed";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the redrawn board.
pub fn broadcast_board(state: &AppState, board: &BoardView) {
    send_public_event(state, EVENT_BOARD_UPDATED, board);
}

/// Broadcast the session clock.
pub fn broadcast_timer_tick(state: &AppState, elapsed_secs: u32) {
    let payload = TimerTick {
        elapsed_secs,
        elapsed: format_elapsed(elapsed_secs),
    };
    send_public_event(state, EVENT_TIMER_TICK, &payload);
}

/// Broadcast the user and global high score readout.
pub fn broadcast_scores(state: &AppState, scores: &ScoresResponse) {
    send_public_event(state, EVENT_SCORES_UPDATED, scores);
}

/// Broadcast the end-of-game summary.
pub fn broadcast_completion(state: &AppState, completion: &Completion) {
    let payload = CompletionNotice {
        elapsed_secs: completion.elapsed_secs,
        elapsed: format_elapsed(completion.elapsed_secs),
        moves: completion.moves,
        score: completion.final_score,
        message: completion_message(completion),
    };
    send_public_event(state, EVENT_GAME_COMPLETED, &payload);
}

/// Broadcast whether the backend runs without a score store.
pub fn broadcast_system_status(state: &AppState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn completion_message(completion: &Completion) -> String {
    format!(
        "Congratulations! You completed the game in {} seconds with {} moves. Score: {}",
        completion.elapsed_secs, completion.moves, completion.final_score
    )
}

fn send_public_event(state: &AppState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{config::AppConfig, state::scoring};

    #[test]
    fn completion_event_carries_summary() {
        let state = AppState::new(AppConfig::default());
        let mut receiver = state.public_sse().subscribe();
        let completion = Completion {
            session_id: Uuid::new_v4(),
            elapsed_secs: 75,
            moves: 9,
            bonus: scoring::completion_bonus(75, 9),
            final_score: 1_530,
        };

        broadcast_completion(&state, &completion);

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_GAME_COMPLETED));
        let data: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(data["elapsed"], "01:15");
        assert_eq!(data["moves"], 9);
        assert_eq!(data["score"], 1_530);
        assert_eq!(
            data["message"],
            "Congratulations! You completed the game in 75 seconds with 9 moves. Score: 1530"
        );
    }

    #[tokio::test]
    async fn degraded_changes_are_announced_once() {
        let state = AppState::new(AppConfig::default());
        let mut receiver = state.public_sse().subscribe();

        state.update_degraded(true).await;
        assert!(receiver.try_recv().is_err());

        state.update_degraded(false).await;
        let event = receiver.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_SYSTEM_STATUS));
        assert_eq!(event.data, r#"{"degraded":false}"#);
        assert!(!state.is_degraded().await);
    }
}
