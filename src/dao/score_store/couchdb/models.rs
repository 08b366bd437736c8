use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dao::models::{HighScoreEntity, UserScoreEntity};

pub const USER_PREFIX: &str = "user::";
pub const HIGH_SCORE_PREFIX: &str = "high_score::";

/// `users/{id}` document. Fields written by other parts of the site (profile,
/// role, ...) are kept in `extra` so a merge write does not drop them.
///
/// A signed-in player's document exists before their first finished game, so
/// every score field may be missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchUserScoreDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<SystemTime>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CouchUserScoreDocument {
    pub fn new(user_id: &str, entity: UserScoreEntity) -> Self {
        Self {
            id: user_doc_id(user_id),
            rev: None,
            username: Some(entity.username),
            score: Some(entity.score),
            game_id: Some(entity.game_id),
            timestamp: Some(entity.timestamp),
            extra: Map::new(),
        }
    }

    /// Overwrite the score fields, keeping the revision and unrelated fields.
    pub fn merge(mut self, entity: UserScoreEntity) -> Self {
        self.username = Some(entity.username);
        self.score = Some(entity.score);
        self.game_id = Some(entity.game_id);
        self.timestamp = Some(entity.timestamp);
        self
    }

    /// Score record held by the document, `None` for a profile without a score.
    pub fn into_entity(self) -> Option<UserScoreEntity> {
        let score = self.score?;
        Some(UserScoreEntity {
            username: self.username.unwrap_or_default(),
            score,
            game_id: self.game_id.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }
}

/// `high_scores/{game_id}` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchHighScoreDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub score: u32,
    pub timestamp: SystemTime,
}

impl CouchHighScoreDocument {
    pub fn new(game_id: &str, entity: HighScoreEntity, rev: Option<String>) -> Self {
        Self {
            id: high_score_doc_id(game_id),
            rev,
            score: entity.score,
            timestamp: entity.timestamp,
        }
    }

    pub fn into_entity(self) -> HighScoreEntity {
        HighScoreEntity {
            score: self.score,
            timestamp: self.timestamp,
        }
    }
}

pub fn user_doc_id(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}")
}

pub fn high_score_doc_id(game_id: &str) -> String {
    format!("{HIGH_SCORE_PREFIX}{game_id}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn merge_keeps_revision_and_profile_fields() {
        let stored = json!({
            "_id": "user::abc",
            "_rev": "3-xyz",
            "username": "old@example.com",
            "score": 10,
            "game_id": "crossword",
            "timestamp": { "secs_since_epoch": 1, "nanos_since_epoch": 0 },
            "role": "patient",
        });
        let document: CouchUserScoreDocument = serde_json::from_value(stored).unwrap();

        let merged = document.merge(UserScoreEntity {
            username: "new@example.com".into(),
            score: 900,
            game_id: "memory".into(),
            timestamp: SystemTime::UNIX_EPOCH,
        });
        let value = serde_json::to_value(&merged).unwrap();

        assert_eq!(value["_rev"], "3-xyz");
        assert_eq!(value["role"], "patient");
        assert_eq!(value["score"], 900);
        assert_eq!(value["game_id"], "memory");
    }

    fn profile_only() -> Value {
        json!({
            "_id": "user::abc",
            "_rev": "1-aaa",
            "uid": "abc",
            "email": "ana@example.com",
            "role": "patient",
        })
    }

    #[test]
    fn profile_without_score_reads_as_no_record() {
        let document: CouchUserScoreDocument = serde_json::from_value(profile_only()).unwrap();
        assert!(document.into_entity().is_none());
    }

    #[test]
    fn first_score_merges_into_profile_document() {
        let document: CouchUserScoreDocument = serde_json::from_value(profile_only()).unwrap();

        let merged = document.merge(UserScoreEntity {
            username: "ana@example.com".into(),
            score: 420,
            game_id: "memory".into(),
            timestamp: SystemTime::UNIX_EPOCH,
        });
        let value = serde_json::to_value(&merged).unwrap();

        assert_eq!(value["_rev"], "1-aaa");
        assert_eq!(value["uid"], "abc");
        assert_eq!(value["role"], "patient");
        assert_eq!(value["score"], 420);

        let reread: CouchUserScoreDocument = serde_json::from_value(value).unwrap();
        let entity = reread.into_entity().unwrap();
        assert_eq!(entity.score, 420);
        assert_eq!(entity.game_id, "memory");
        assert_eq!(entity.username, "ana@example.com");
    }

    #[test]
    fn fresh_documents_omit_revision() {
        let document = CouchHighScoreDocument::new(
            "memory",
            HighScoreEntity {
                score: 1,
                timestamp: SystemTime::UNIX_EPOCH,
            },
            None,
        );
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["_id"], "high_score::memory");
        assert!(value.get("_rev").is_none());
    }
}
