#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{HighScoreEntity, UserScoreEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the document store holding user scores and high scores.
pub trait ScoreStore: Send + Sync {
    /// Merge `record` into `users/{user_id}`, keeping unrelated fields and creating the document
    /// when missing.
    fn merge_user_score(
        &self,
        user_id: String,
        record: UserScoreEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Create or fully replace `users/{user_id}`.
    fn put_user_score(
        &self,
        user_id: String,
        record: UserScoreEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_user_score(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserScoreEntity>>>;
    fn find_high_score(
        &self,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<HighScoreEntity>>>;
    /// Write `record` to `high_scores/{game_id}` only if no record exists or the stored score is
    /// strictly lower, as a single atomic step. Resolves to whether the record was written.
    fn put_high_score_if_greater(
        &self,
        game_id: String,
        record: HighScoreEntity,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
