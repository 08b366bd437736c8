use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::engine::EnginePhase;

/// Phase of the board as shown to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    Idle,
    AwaitingFirstSelection,
    AwaitingSecondSelection,
    Resolving,
    Complete,
}

impl From<EnginePhase> for VisiblePhase {
    fn from(value: EnginePhase) -> Self {
        match value {
            EnginePhase::Idle => VisiblePhase::Idle,
            EnginePhase::AwaitingFirstSelection => VisiblePhase::AwaitingFirstSelection,
            EnginePhase::AwaitingSecondSelection => VisiblePhase::AwaitingSecondSelection,
            EnginePhase::Resolving => VisiblePhase::Resolving,
            EnginePhase::Complete => VisiblePhase::Complete,
        }
    }
}

/// One card slot on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CardView {
    pub id: usize,
    /// Symbol, only present while the card is face up or matched.
    pub face: Option<String>,
    pub is_flipped: bool,
    pub is_matched: bool,
    /// Whether clicking the card can have an effect.
    pub selectable: bool,
}

/// Full projection of the game redrawn after every state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BoardView {
    /// `None` until the first session starts.
    pub session_id: Option<Uuid>,
    pub phase: VisiblePhase,
    pub cards: Vec<CardView>,
    pub moves: u32,
    pub matched_pairs: usize,
    pub total_pairs: usize,
    pub score: u32,
    pub elapsed_secs: u32,
    /// Elapsed time as `mm:ss`.
    pub elapsed: String,
    pub is_playing: bool,
}
