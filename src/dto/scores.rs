use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::dao::models::HighScoreEntity;
use crate::dto::format_system_time;

/// Query string of `GET /scores/{game_id}`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScoresQuery {
    /// Signed-in player whose score is displayed; guests omit it.
    pub uid: Option<String>,
}

/// Score readout shown next to the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScoresResponse {
    pub game_id: String,
    /// Last score of the player for this game, 0 when unknown.
    pub user_score: u32,
    /// Best score ever recorded for this game, 0 when none.
    pub high_score: u32,
    /// RFC 3339 time the high score was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_score_set_at: Option<String>,
}

impl ScoresResponse {
    pub fn new(game_id: String, user_score: u32, high_score: Option<HighScoreEntity>) -> Self {
        Self {
            game_id,
            user_score,
            high_score: high_score.as_ref().map_or(0, |record| record.score),
            high_score_set_at: high_score.map(|record| format_system_time(record.timestamp)),
        }
    }
}
