use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Latest score written for a player, stored under `users/{user_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserScoreEntity {
    /// Display name (e-mail for signed-in players, guest label otherwise).
    pub username: String,
    /// Final score of the session.
    pub score: u32,
    /// Game the score was obtained in (e.g. "memory").
    pub game_id: String,
    /// Write time of the record.
    pub timestamp: SystemTime,
}

/// Best score ever recorded for a game, stored under `high_scores/{game_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HighScoreEntity {
    /// Highest final score.
    pub score: u32,
    /// Time the record was set.
    pub timestamp: SystemTime,
}

impl HighScoreEntity {
    /// Whether `candidate` strictly beats this record.
    pub fn is_beaten_by(&self, candidate: u32) -> bool {
        candidate > self.score
    }
}
