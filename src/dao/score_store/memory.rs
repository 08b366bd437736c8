//! Process-local [`ScoreStore`] used for development runs and tests.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use thiserror::Error;

use crate::dao::{
    models::{HighScoreEntity, UserScoreEntity},
    score_store::ScoreStore,
    storage::{StorageError, StorageResult},
};

/// Failure reported while the store is switched offline.
#[derive(Debug, Error)]
#[error("in-memory score store is offline")]
pub struct MemoryStoreOffline;

/// Score store keeping documents in concurrent maps.
///
/// Cloning is cheap and every clone shares the same documents.
#[derive(Clone, Default)]
pub struct InMemoryScoreStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: DashMap<String, UserScoreEntity>,
    high_scores: DashMap<String, HighScoreEntity>,
    offline: AtomicBool,
}

impl InMemoryScoreStore {
    /// Create an empty, online store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (`true`) or succeed again (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Identifiers of every stored user document.
    pub fn user_ids(&self) -> Vec<String> {
        self.inner
            .users
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Direct read of a user document, bypassing the offline switch.
    pub fn user_score(&self, user_id: &str) -> Option<UserScoreEntity> {
        self.inner.users.get(user_id).map(|entry| entry.clone())
    }

    /// Direct read of a high-score document, bypassing the offline switch.
    pub fn high_score(&self, game_id: &str) -> Option<HighScoreEntity> {
        self.inner.high_scores.get(game_id).map(|entry| entry.clone())
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(
                MemoryStoreOffline.to_string(),
                MemoryStoreOffline,
            ))
        } else {
            Ok(())
        }
    }
}

impl ScoreStore for InMemoryScoreStore {
    fn merge_user_score(
        &self,
        user_id: String,
        record: UserScoreEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        // Every field of the record is owned by the score writer, so a merge
        // and a replace only differ for backends storing extra profile fields.
        self.put_user_score(user_id, record)
    }

    fn put_user_score(
        &self,
        user_id: String,
        record: UserScoreEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            store.inner.users.insert(user_id, record);
            Ok(())
        })
    }

    fn find_user_score(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store.user_score(&user_id))
        })
    }

    fn find_high_score(
        &self,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<HighScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store.high_score(&game_id))
        })
    }

    fn put_high_score_if_greater(
        &self,
        game_id: String,
        record: HighScoreEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            // The entry guard holds the shard lock, making compare and write one step.
            let written = match store.inner.high_scores.entry(game_id) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                    true
                }
                Entry::Occupied(mut slot) if slot.get().is_beaten_by(record.score) => {
                    slot.insert(record);
                    true
                }
                Entry::Occupied(_) => false,
            };
            Ok(written)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn high(score: u32) -> HighScoreEntity {
        HighScoreEntity {
            score,
            timestamp: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn high_score_only_grows() {
        let store = InMemoryScoreStore::new();
        let game = "memory".to_string();

        assert!(store.put_high_score_if_greater(game.clone(), high(500)).await.unwrap());
        assert!(!store.put_high_score_if_greater(game.clone(), high(500)).await.unwrap());
        assert!(!store.put_high_score_if_greater(game.clone(), high(300)).await.unwrap());
        assert!(store.put_high_score_if_greater(game.clone(), high(501)).await.unwrap());

        assert_eq!(store.high_score("memory").unwrap().score, 501);
    }

    #[tokio::test]
    async fn concurrent_high_score_writes_keep_the_maximum() {
        let store = InMemoryScoreStore::new();
        let mut handles = Vec::new();
        for score in 1..=64u32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .put_high_score_if_greater("memory".into(), high(score))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.high_score("memory").unwrap().score, 64);
    }

    #[tokio::test]
    async fn offline_store_fails_every_call() {
        let store = InMemoryScoreStore::new();
        store.set_offline(true);

        assert!(store.health_check().await.is_err());
        assert!(store.find_high_score("memory".into()).await.is_err());

        store.set_offline(false);
        assert!(store.health_check().await.is_ok());
        assert!(store.find_high_score("memory".into()).await.unwrap().is_none());
    }
}
