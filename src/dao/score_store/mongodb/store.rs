use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{Client, Collection, Database, bson::doc};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        MongoHighScoreDocument, MongoUserScoreDocument, doc_id, high_score_set, user_score_set,
    },
};
use crate::dao::{
    models::{HighScoreEntity, UserScoreEntity},
    score_store::ScoreStore,
    storage::StorageResult,
};

const USERS_COLLECTION_NAME: &str = "users";
const HIGH_SCORES_COLLECTION_NAME: &str = "high_scores";

/// MongoDB-backed [`ScoreStore`] implementation.
#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        Ok(Self { inner })
    }

    async fn users(&self) -> Collection<MongoUserScoreDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoUserScoreDocument>(USERS_COLLECTION_NAME)
    }

    async fn high_scores(&self) -> Collection<MongoHighScoreDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoHighScoreDocument>(HIGH_SCORES_COLLECTION_NAME)
    }

    async fn merge_user_score(&self, user_id: String, record: UserScoreEntity) -> MongoResult<()> {
        let collection = self.users().await;
        collection
            .update_one(doc_id(&user_id), user_score_set(&record))
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveUserScore { user_id, source })?;
        Ok(())
    }

    async fn put_user_score(&self, user_id: String, record: UserScoreEntity) -> MongoResult<()> {
        let collection = self.users().await;
        let document = MongoUserScoreDocument::from_entity(user_id.clone(), record);
        collection
            .replace_one(doc_id(&user_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveUserScore { user_id, source })?;
        Ok(())
    }

    async fn find_user_score(&self, user_id: String) -> MongoResult<Option<UserScoreEntity>> {
        let collection = self.users().await;
        let document = collection
            .find_one(doc_id(&user_id))
            .await
            .map_err(|source| MongoDaoError::LoadUserScore { user_id, source })?;
        Ok(document.and_then(MongoUserScoreDocument::into_entity))
    }

    async fn find_high_score(&self, game_id: String) -> MongoResult<Option<HighScoreEntity>> {
        let collection = self.high_scores().await;
        let document = collection
            .find_one(doc_id(&game_id))
            .await
            .map_err(|source| MongoDaoError::LoadHighScore { game_id, source })?;
        Ok(document.map(MongoHighScoreDocument::into_entity))
    }

    /// The filter only matches a lower record, so the update is a single
    /// conditional write. When a higher or equal record exists the upsert
    /// tries to insert a second document with the same `_id` and the server
    /// rejects it with a duplicate-key error, which means "not written".
    async fn put_high_score_if_greater(
        &self,
        game_id: String,
        record: HighScoreEntity,
    ) -> MongoResult<bool> {
        let collection = self.high_scores().await;
        let filter = doc! {
            "_id": game_id.as_str(),
            "score": { "$lt": i64::from(record.score) },
        };

        match collection
            .update_one(filter, high_score_set(&record))
            .upsert(true)
            .await
        {
            Ok(result) => Ok(result.modified_count > 0 || result.upserted_id.is_some()),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::SaveHighScore { game_id, source }),
        }
    }
}

impl ScoreStore for MongoScoreStore {
    fn merge_user_score(
        &self,
        user_id: String,
        record: UserScoreEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .merge_user_score(user_id, record)
                .await
                .map_err(Into::into)
        })
    }

    fn put_user_score(
        &self,
        user_id: String,
        record: UserScoreEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .put_user_score(user_id, record)
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_score(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user_score(user_id).await.map_err(Into::into) })
    }

    fn find_high_score(
        &self,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<HighScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_high_score(game_id).await.map_err(Into::into) })
    }

    fn put_high_score_if_greater(
        &self,
        game_id: String,
        record: HighScoreEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .put_high_score_if_greater(game_id, record)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
