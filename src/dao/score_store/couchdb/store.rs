use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::dao::{
    models::{HighScoreEntity, UserScoreEntity},
    score_store::ScoreStore,
    storage::{StorageError, StorageResult},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchHighScoreDocument, CouchUserScoreDocument, high_score_doc_id, user_doc_id},
};

/// Revision conflicts tolerated before a write is reported as contended.
const MAX_WRITE_ATTEMPTS: u32 = 5;

enum PutOutcome {
    Written,
    Conflict,
}

/// CouchDB-backed [`ScoreStore`] implementation.
#[derive(Clone)]
pub struct CouchScoreStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchScoreStore {
    /// Build the HTTP client and make sure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            database: Arc::from(config.database),
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, doc_id: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), doc_id);
        self.with_auth(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .with_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .with_auth(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                // 412 means another instance created it first.
                if create.status().is_success() || create.status() == StatusCode::PRECONDITION_FAILED
                {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<PutOutcome>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Ok(PutOutcome::Conflict),
            status if status.is_success() => Ok(PutOutcome::Written),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn merge_user_score(&self, user_id: &str, record: UserScoreEntity) -> StorageResult<()> {
        let doc_id = user_doc_id(user_id);
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let document = match self
                .get_document::<CouchUserScoreDocument>(&doc_id)
                .await?
            {
                Some(existing) => existing.merge(record.clone()),
                None => CouchUserScoreDocument::new(user_id, record.clone()),
            };
            match self.put_document(&doc_id, &document).await? {
                PutOutcome::Written => return Ok(()),
                PutOutcome::Conflict => debug!(doc_id = %doc_id, attempt, "user score revision conflict"),
            }
        }
        Err(StorageError::Contended {
            key: doc_id,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }

    async fn put_user_score(&self, user_id: &str, record: UserScoreEntity) -> StorageResult<()> {
        let doc_id = user_doc_id(user_id);
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut document = CouchUserScoreDocument::new(user_id, record.clone());
            if let Some(existing) = self
                .get_document::<CouchUserScoreDocument>(&doc_id)
                .await?
            {
                document.rev = existing.rev;
            }
            match self.put_document(&doc_id, &document).await? {
                PutOutcome::Written => return Ok(()),
                PutOutcome::Conflict => debug!(doc_id = %doc_id, attempt, "user score revision conflict"),
            }
        }
        Err(StorageError::Contended {
            key: doc_id,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }

    /// Compare-and-swap on the document revision: the PUT only succeeds if
    /// nobody wrote the record since it was read.
    async fn put_high_score_if_greater(
        &self,
        game_id: &str,
        record: HighScoreEntity,
    ) -> StorageResult<bool> {
        let doc_id = high_score_doc_id(game_id);
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let existing = self
                .get_document::<CouchHighScoreDocument>(&doc_id)
                .await?;
            let rev = match existing {
                Some(current) if current.score >= record.score => return Ok(false),
                Some(current) => current.rev,
                None => None,
            };

            let document = CouchHighScoreDocument::new(game_id, record.clone(), rev);
            match self.put_document(&doc_id, &document).await? {
                PutOutcome::Written => return Ok(true),
                PutOutcome::Conflict => debug!(doc_id = %doc_id, attempt, "high score revision conflict"),
            }
        }
        Err(StorageError::Contended {
            key: doc_id,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }
}

impl ScoreStore for CouchScoreStore {
    fn merge_user_score(
        &self,
        user_id: String,
        record: UserScoreEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.merge_user_score(&user_id, record).await })
    }

    fn put_user_score(
        &self,
        user_id: String,
        record: UserScoreEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.put_user_score(&user_id, record).await })
    }

    fn find_user_score(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = user_doc_id(&user_id);
            let maybe_doc = store
                .get_document::<CouchUserScoreDocument>(&doc_id)
                .await?;
            Ok(maybe_doc.and_then(CouchUserScoreDocument::into_entity))
        })
    }

    fn find_high_score(
        &self,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<HighScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = high_score_doc_id(&game_id);
            let maybe_doc = store
                .get_document::<CouchHighScoreDocument>(&doc_id)
                .await?;
            Ok(maybe_doc.map(CouchHighScoreDocument::into_entity))
        })
    }

    fn put_high_score_if_greater(
        &self,
        game_id: String,
        record: HighScoreEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.put_high_score_if_greater(&game_id, record).await })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .with_auth(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
