//! Best-effort persistence of user scores and the global high score.

use std::{fmt::Display, future::Future, time::SystemTime};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{HighScoreEntity, UserScoreEntity},
        score_store::ScoreStore,
        storage::StorageResult,
    },
    dto::scores::ScoresResponse,
    error::ServiceError,
    state::{Identity, SharedState},
};

const GUEST_ID_PREFIX: &str = "guest-";

/// Write the final score of a session, returning the user document id.
///
/// Signed-in players merge into their own document; guests get a fresh one.
pub async fn save_user_score(
    store: &dyn ScoreStore,
    identity: &Identity,
    score: u32,
    game_id: &str,
    guest_name: &str,
) -> StorageResult<String> {
    let record = UserScoreEntity {
        username: identity.username(guest_name),
        score,
        game_id: game_id.to_string(),
        timestamp: SystemTime::now(),
    };

    match identity.uid() {
        Some(uid) => {
            store.merge_user_score(uid.to_string(), record).await?;
            Ok(uid.to_string())
        }
        None => {
            let guest_id = format!("{GUEST_ID_PREFIX}{}", Uuid::new_v4().simple());
            store.put_user_score(guest_id.clone(), record).await?;
            Ok(guest_id)
        }
    }
}

/// Record `score` as the high score of `game_id` when it beats the stored one.
/// Returns whether the record changed.
pub async fn update_high_score(
    store: &dyn ScoreStore,
    score: u32,
    game_id: &str,
) -> StorageResult<bool> {
    if let Some(current) = store.find_high_score(game_id.to_string()).await? {
        if !current.is_beaten_by(score) {
            debug!(game_id, score, current = current.score, "high score not beaten");
            return Ok(false);
        }
    }

    // The read above only skips needless writes; the store re-checks atomically.
    store
        .put_high_score_if_greater(
            game_id.to_string(),
            HighScoreEntity {
                score,
                timestamp: SystemTime::now(),
            },
        )
        .await
}

/// Read the score readout of `uid` (or of a guest) for `game_id`.
pub async fn display_scores(
    store: &dyn ScoreStore,
    uid: Option<&str>,
    game_id: &str,
) -> StorageResult<ScoresResponse> {
    let user_read = async {
        match uid {
            Some(uid) => store.find_user_score(uid.to_string()).await,
            None => Ok(None),
        }
    };
    let (user, high) = tokio::try_join!(user_read, store.find_high_score(game_id.to_string()))?;

    let user_score = user
        .filter(|record| record.game_id == game_id)
        .map_or(0, |record| record.score);

    Ok(ScoresResponse::new(game_id.to_string(), user_score, high))
}

/// Score readout for the HTTP API.
pub async fn scores_for(
    state: &SharedState,
    game_id: &str,
    uid: Option<&str>,
) -> Result<ScoresResponse, ServiceError> {
    if game_id.trim().is_empty() {
        return Err(ServiceError::InvalidInput("game id must not be blank".into()));
    }
    let store = state.require_score_store().await?;
    Ok(display_scores(store.as_ref(), uid, game_id).await?)
}

/// Write the final score and the high score of a finished session.
///
/// Both writes are attempted even when the other fails.
pub async fn persist_completion(
    state: &SharedState,
    identity: &Identity,
    final_score: u32,
) -> Result<(), ServiceError> {
    let store = state.require_score_store().await?;
    let config = state.config();

    let (user_write, high_write) = tokio::join!(
        save_user_score(
            store.as_ref(),
            identity,
            final_score,
            &config.game_id,
            &config.guest_name,
        ),
        update_high_score(store.as_ref(), final_score, &config.game_id),
    );

    match user_write {
        Ok(user_id) => info!(user_id = %user_id, score = final_score, "user score saved"),
        Err(err) => warn!(error = %err, "failed to save user score"),
    }
    match high_write {
        Ok(true) => info!(score = final_score, game_id = %config.game_id, "new high score"),
        Ok(false) => {}
        Err(err) => warn!(error = %err, "failed to update high score"),
    }
    Ok(())
}

/// Run `future` in the background without waiting for it. Failures are
/// logged and dropped.
pub fn spawn_detached<F, E>(label: &'static str, future: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: Display,
{
    tokio::spawn(async move {
        if let Err(err) = future.await {
            warn!(task = label, error = %err, "background task failed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::score_store::memory::InMemoryScoreStore;

    fn player() -> Identity {
        Identity::Authenticated {
            uid: "u-1".into(),
            email: Some("ana@example.com".into()),
        }
    }

    #[tokio::test]
    async fn authenticated_score_goes_to_player_document() {
        let store = InMemoryScoreStore::new();
        let id = save_user_score(&store, &player(), 900, "memory", "Guest")
            .await
            .unwrap();

        assert_eq!(id, "u-1");
        let record = store.user_score("u-1").unwrap();
        assert_eq!(record.username, "ana@example.com");
        assert_eq!(record.score, 900);
        assert_eq!(record.game_id, "memory");
    }

    #[tokio::test]
    async fn later_score_overwrites_earlier_one() {
        let store = InMemoryScoreStore::new();
        save_user_score(&store, &player(), 900, "memory", "Guest")
            .await
            .unwrap();
        save_user_score(&store, &player(), 400, "memory", "Guest")
            .await
            .unwrap();
        assert_eq!(store.user_score("u-1").unwrap().score, 400);
    }

    #[tokio::test]
    async fn each_guest_completion_creates_a_document() {
        let store = InMemoryScoreStore::new();
        let first = save_user_score(&store, &Identity::Guest, 10, "memory", "Guest")
            .await
            .unwrap();
        let second = save_user_score(&store, &Identity::Guest, 20, "memory", "Guest")
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("guest-"));
        assert_eq!(store.user_ids().len(), 2);
        assert_eq!(store.user_score(&first).unwrap().username, "Guest");
    }

    #[tokio::test]
    async fn high_score_is_replaced_only_when_beaten() {
        let store = InMemoryScoreStore::new();
        assert!(update_high_score(&store, 500, "memory").await.unwrap());
        assert!(!update_high_score(&store, 500, "memory").await.unwrap());
        assert!(!update_high_score(&store, 120, "memory").await.unwrap());
        assert_eq!(store.high_score("memory").unwrap().score, 500);

        assert!(update_high_score(&store, 501, "memory").await.unwrap());
        assert_eq!(store.high_score("memory").unwrap().score, 501);
    }

    #[tokio::test]
    async fn display_defaults_to_zero() {
        let store = InMemoryScoreStore::new();
        let scores = display_scores(&store, None, "memory").await.unwrap();
        assert_eq!((scores.user_score, scores.high_score), (0, 0));
        assert_eq!(scores.high_score_set_at, None);
    }

    #[tokio::test]
    async fn display_ignores_scores_of_other_games() {
        let store = InMemoryScoreStore::new();
        save_user_score(&store, &player(), 700, "crossword", "Guest")
            .await
            .unwrap();
        update_high_score(&store, 800, "memory").await.unwrap();

        let scores = display_scores(&store, Some("u-1"), "memory").await.unwrap();
        assert_eq!(scores.user_score, 0);
        assert_eq!(scores.high_score, 800);
        assert!(scores.high_score_set_at.is_some());
    }

    #[tokio::test]
    async fn offline_store_surfaces_errors() {
        let store = InMemoryScoreStore::new();
        store.set_offline(true);
        assert!(update_high_score(&store, 1, "memory").await.is_err());
        assert!(display_scores(&store, Some("u-1"), "memory").await.is_err());
    }
}
