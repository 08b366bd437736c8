use std::time::SystemTime;

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};

use crate::dao::models::{HighScoreEntity, UserScoreEntity};

/// Document stored in the `users` collection. Other profile fields may live
/// next to these and are ignored on read; a profile created at sign-in has
/// none of the score fields yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserScoreDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime>,
}

impl MongoUserScoreDocument {
    pub fn from_entity(id: String, entity: UserScoreEntity) -> Self {
        Self {
            id,
            username: Some(entity.username),
            score: Some(i64::from(entity.score)),
            game_id: Some(entity.game_id),
            timestamp: Some(DateTime::from_system_time(entity.timestamp)),
        }
    }

    /// Score record held by the document, `None` for a profile without a score.
    pub fn into_entity(self) -> Option<UserScoreEntity> {
        let score = self.score?;
        Some(UserScoreEntity {
            username: self.username.unwrap_or_default(),
            score: score_from_i64(score),
            game_id: self.game_id.unwrap_or_default(),
            timestamp: self
                .timestamp
                .map_or(SystemTime::UNIX_EPOCH, DateTime::to_system_time),
        })
    }
}

/// Document stored in the `high_scores` collection, keyed by game id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoHighScoreDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub score: i64,
    pub timestamp: DateTime,
}

impl MongoHighScoreDocument {
    pub fn into_entity(self) -> HighScoreEntity {
        HighScoreEntity {
            score: score_from_i64(self.score),
            timestamp: self.timestamp.to_system_time(),
        }
    }
}

/// `$set` payload merging a user score into an existing document.
pub fn user_score_set(entity: &UserScoreEntity) -> Document {
    doc! {
        "$set": {
            "username": entity.username.clone(),
            "score": i64::from(entity.score),
            "game_id": entity.game_id.clone(),
            "timestamp": DateTime::from_system_time(entity.timestamp),
        }
    }
}

/// `$set` payload replacing the high-score fields.
pub fn high_score_set(entity: &HighScoreEntity) -> Document {
    doc! {
        "$set": {
            "score": i64::from(entity.score),
            "timestamp": DateTime::from_system_time(entity.timestamp),
        }
    }
}

pub fn doc_id(id: &str) -> Document {
    doc! {"_id": id}
}

fn score_from_i64(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
