//! Pure projections of the engine state for display clients and logs.

use crate::{
    dto::{
        board::{BoardView, CardView},
        format_elapsed,
    },
    state::{deck::Card, engine::TurnEngine},
};

const HIDDEN_FACE: &str = "?";

/// Project the engine state into the board shown to players.
///
/// Matched and face-up cards reveal their symbol, the others stay hidden.
pub fn render_board(engine: &TurnEngine) -> BoardView {
    let phase = engine.phase().into();
    let Some(session) = engine.session() else {
        return BoardView {
            session_id: None,
            phase,
            cards: Vec::new(),
            moves: 0,
            matched_pairs: 0,
            total_pairs: 0,
            score: 0,
            elapsed_secs: 0,
            elapsed: format_elapsed(0),
            is_playing: false,
        };
    };

    BoardView {
        session_id: Some(session.id),
        phase,
        cards: session.cards.iter().map(card_view).collect(),
        moves: session.moves,
        matched_pairs: session.matched_pairs,
        total_pairs: session.total_pairs,
        score: session.score,
        elapsed_secs: session.elapsed_secs,
        elapsed: format_elapsed(session.elapsed_secs),
        is_playing: session.is_playing,
    }
}

fn card_view(card: &Card) -> CardView {
    let visible = card.is_flipped || card.is_matched;
    CardView {
        id: card.id,
        face: visible.then(|| card.face.clone()),
        is_flipped: card.is_flipped,
        is_matched: card.is_matched,
        selectable: !card.is_matched,
    }
}

/// Draw `board` as a text grid with `columns` cards per row, preceded by a
/// status line.
pub fn render_text(board: &BoardView, columns: usize) -> String {
    let columns = columns.max(1);
    let mut out = format!(
        "moves {} | pairs {}/{} | score {} | time {}",
        board.moves, board.matched_pairs, board.total_pairs, board.score, board.elapsed
    );

    for row in board.cards.chunks(columns) {
        out.push('\n');
        let cells: Vec<&str> = row
            .iter()
            .map(|card| card.face.as_deref().unwrap_or(HIDDEN_FACE))
            .collect();
        out.push_str(&cells.join(" "));
    }
    out
}
