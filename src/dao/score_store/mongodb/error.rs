use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to save score of user `{user_id}`")]
    SaveUserScore {
        user_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load score of user `{user_id}`")]
    LoadUserScore {
        user_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to save high score of game `{game_id}`")]
    SaveHighScore {
        game_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load high score of game `{game_id}`")]
    LoadHighScore {
        game_id: String,
        #[source]
        source: MongoError,
    },
}

/// Whether `err` is the unique-key violation raised when an upsert races an existing `_id`.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}
